//! DIDL-Lite metadata helpers
//!
//! Media server results and renderer metadata are DIDL-Lite documents with
//! `dc:`, `upnp:` and vendor namespaces. Elements are matched by local name so
//! prefixes do not matter.
//!
//! ```xml
//! <DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" ...>
//!   <item id="0/My Music/AllTracks/123" parentID="0/My Music/AllTracks">
//!     <dc:title>Song Title</dc:title>
//!     <upnp:artist>Artist Name</upnp:artist>
//!     <upnp:albumArtURI>http://10.0.0.2:47100/art/123.jpg</upnp:albumArtURI>
//!     <res protocolInfo="http-get:*:audio/mpeg:*">http://10.0.0.2:47100/123.mp3</res>
//!   </item>
//! </DIDL-Lite>
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ApiError, Result};

/// Metadata sent with `SetAVTransportURI` when the caller has none
pub const DEFAULT_METADATA: &str = concat!(
    r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" "#,
    r#"xmlns:dc="http://purl.org/dc/elements/1.1/" "#,
    r#"xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">"#,
    r#"<item id="" parentID="" restricted="1">"#,
    r#"<dc:title></dc:title>"#,
    r#"<upnp:class>object.item.audioItem.musicTrack</upnp:class>"#,
    r#"</item></DIDL-Lite>"#
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Item,
    Container,
}

/// One `<item>` or `<container>` of a DIDL-Lite document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidlObject {
    pub kind: ObjectKind,
    pub id: String,
    pub parent_id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub class: Option<String>,
    pub album_art_uri: Option<String>,
    /// Text of the first `<res>` element
    pub res: Option<String>,
}

impl DidlObject {
    fn from_start(kind: ObjectKind, start: &BytesStart<'_>) -> Self {
        let mut object = DidlObject {
            kind,
            id: String::new(),
            parent_id: String::new(),
            title: None,
            artist: None,
            album: None,
            class: None,
            album_art_uri: None,
            res: None,
        };
        for attribute in start.attributes().flatten() {
            let value = attribute
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_default();
            match attribute.key.local_name().as_ref() {
                b"id" => object.id = value,
                b"parentID" => object.parent_id = value,
                _ => {}
            }
        }
        object
    }

    fn field(&mut self, name: &[u8]) -> Option<&mut Option<String>> {
        match name {
            b"title" => Some(&mut self.title),
            b"artist" | b"creator" => Some(&mut self.artist),
            b"album" => Some(&mut self.album),
            b"class" => Some(&mut self.class),
            b"albumArtURI" => Some(&mut self.album_art_uri),
            b"res" => Some(&mut self.res),
            _ => None,
        }
    }
}

/// Parse the items and containers of a DIDL-Lite document, in document order
pub fn parse(xml: &str) -> Result<Vec<DidlObject>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut objects = Vec::new();
    let mut current: Option<DidlObject> = None;
    let mut field: Option<Vec<u8>> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ApiError::ParseError(format!("Invalid DIDL-Lite: {}", e)))?;
        match event {
            Event::Start(start) => {
                let name = start.local_name().as_ref().to_vec();
                match (name.as_slice(), current.is_some()) {
                    (b"item", false) => current = Some(DidlObject::from_start(ObjectKind::Item, &start)),
                    (b"container", false) => {
                        current = Some(DidlObject::from_start(ObjectKind::Container, &start))
                    }
                    (_, true) => field = Some(name),
                    _ => {}
                }
            }
            Event::Empty(start) => match start.local_name().as_ref() {
                b"item" if current.is_none() => {
                    objects.push(DidlObject::from_start(ObjectKind::Item, &start))
                }
                b"container" if current.is_none() => {
                    objects.push(DidlObject::from_start(ObjectKind::Container, &start))
                }
                _ => {}
            },
            Event::Text(text) => {
                if let (Some(object), Some(name)) = (current.as_mut(), field.as_deref()) {
                    if let Some(slot) = object.field(name) {
                        if slot.is_none() {
                            let value = text
                                .unescape()
                                .map_err(|e| ApiError::ParseError(format!("Invalid DIDL-Lite text: {}", e)))?;
                            *slot = Some(value.into_owned());
                        }
                    }
                }
            }
            Event::End(end) => match end.local_name().as_ref() {
                b"item" | b"container" => {
                    if let Some(object) = current.take() {
                        objects.push(object);
                    }
                    field = None;
                }
                _ => field = None,
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(objects)
}

/// URI of the first `<item>`'s resource, as picked by search-and-play
pub fn first_item_uri(xml: &str) -> Result<Option<String>> {
    Ok(parse(xml)?
        .into_iter()
        .find(|o| o.kind == ObjectKind::Item)
        .and_then(|o| o.res))
}

/// First album art URI of any object in the document
pub fn album_art_uri(xml: &str) -> Result<Option<String>> {
    Ok(parse(xml)?.into_iter().find_map(|o| o.album_art_uri))
}
