use serde::{Deserialize, Serialize};

use raumfeld_api::didl;
use raumfeld_api::operations::MediaInfo;

use super::{PlaybackState, RoomId, ZoneId};

/// What a zone is playing, as far as the renderer reports it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneMedia {
    pub uri: String,
    /// Raw DIDL-Lite metadata of `uri`
    pub metadata: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_art_uri: Option<String>,
}

impl ZoneMedia {
    /// Summarize a `GetMediaInfo` answer; unreadable metadata leaves the
    /// descriptive fields empty
    pub fn from_media_info(info: &MediaInfo) -> Self {
        let first = didl::parse(&info.current_uri_metadata)
            .ok()
            .and_then(|objects| objects.into_iter().next());

        let mut media = ZoneMedia {
            uri: info.current_uri.clone(),
            metadata: info.current_uri_metadata.clone(),
            ..Default::default()
        };
        if let Some(object) = first {
            media.title = object.title;
            media.artist = object.artist;
            media.album = object.album;
            media.album_art_uri = object.album_art_uri;
        }
        media
    }
}

/// A zone: a virtual renderer and the rooms it plays to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneState {
    pub id: ZoneId,
    /// Member rooms in the order the host lists them
    pub rooms: Vec<RoomId>,
    /// Description location of the zone renderer, once the host lists it
    pub location: Option<String>,
    pub media: Option<ZoneMedia>,
    pub playback: PlaybackState,
}

impl ZoneState {
    /// Whether the zone consists of exactly `rooms`, in any order
    pub fn has_rooms(&self, rooms: &[RoomId]) -> bool {
        let mut mine: Vec<&RoomId> = self.rooms.iter().collect();
        let mut theirs: Vec<&RoomId> = rooms.iter().collect();
        mine.sort();
        theirs.sort();
        mine == theirs
    }
}
