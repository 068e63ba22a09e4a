//! Media server browsing and playback of search results

use raumfeld_api::didl::{self, DEFAULT_METADATA};
use raumfeld_api::operations::av_transport::SetAVTransportURIRequest;
use raumfeld_api::operations::content_directory::{BrowseRequest, SearchRequest};
use raumfeld_api::operations::{
    BrowseFlag, BrowseOperation, DirectoryResult, SearchOperation, SetAVTransportURIOperation,
};

use crate::error::{Result, SdkError};
use crate::host::RaumfeldHost;

/// Container searched by [`RaumfeldHost::search_and_zone_play`] by default
pub const CONTAINER_ALL_TRACKS: &str = "0/My Music/AllTracks";

/// Ordering used when picking a single item to play
pub const PLAY_SORT_CRITERIA: &str = "+upnp:artist,-dc:date,+dc:title";

/// First search hit, ready for `SetAVTransportURI`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableMedia {
    /// Resource URI of the first item, if the result holds an item
    pub uri: Option<String>,
    /// The raw DIDL-Lite result
    pub metadata: String,
}

impl RaumfeldHost {
    pub fn browse(&self, object_id: &str, flag: BrowseFlag) -> Result<DirectoryResult> {
        let location = self.media_server_location()?;
        Ok(self
            .upnp
            .execute::<BrowseOperation>(&location, &BrowseRequest::new(object_id, flag))?)
    }

    /// Run a fully specified search on the media server
    pub fn search(&self, request: &SearchRequest) -> Result<DirectoryResult> {
        let location = self.media_server_location()?;
        Ok(self.upnp.execute::<SearchOperation>(&location, request)?)
    }

    /// Search `container_id` with criteria such as
    /// `dc:title contains "Morning"`
    pub fn search_media_server(
        &self,
        container_id: &str,
        criteria: &str,
    ) -> Result<DirectoryResult> {
        self.search(&SearchRequest::new(container_id, criteria))
    }

    /// The single best match for `criteria`, with its metadata
    pub fn search_for_play(&self, container_id: &str, criteria: &str) -> Result<PlayableMedia> {
        let mut request = SearchRequest::new(container_id, criteria);
        request.requested_count = 1;
        request.sort_criteria = PLAY_SORT_CRITERIA.to_string();

        let result = self.search(&request)?;
        let uri = didl::first_item_uri(&result.result)?;
        Ok(PlayableMedia {
            uri,
            metadata: result.result,
        })
    }

    /// Let the zone play `uri`; without metadata a minimal track item is sent
    pub fn set_av_transport_uri<S: AsRef<str>>(
        &self,
        rooms: &[S],
        uri: &str,
        metadata: Option<&str>,
    ) -> Result<()> {
        let location = self.zone_location(rooms)?;
        self.upnp.execute::<SetAVTransportURIOperation>(
            &location,
            &SetAVTransportURIRequest {
                instance_id: 0,
                current_uri: uri.to_string(),
                current_uri_metadata: metadata.unwrap_or(DEFAULT_METADATA).to_string(),
            },
        )?;
        Ok(())
    }

    /// Search and hand the first hit to the zone
    ///
    /// `container_id` defaults to [`CONTAINER_ALL_TRACKS`].
    pub fn search_and_zone_play<S: AsRef<str>>(
        &self,
        rooms: &[S],
        criteria: &str,
        container_id: Option<&str>,
    ) -> Result<()> {
        let found = self.search_for_play(container_id.unwrap_or(CONTAINER_ALL_TRACKS), criteria)?;
        let uri = found
            .uri
            .ok_or_else(|| SdkError::NothingFound(criteria.to_string()))?;
        self.set_av_transport_uri(rooms, &uri, Some(&found.metadata))
    }

    /// Album art of what the zone currently plays
    pub fn media_image_url<S: AsRef<str>>(&self, rooms: &[S]) -> Result<Option<String>> {
        let info = self.media_info(rooms)?;
        if info.current_uri_metadata.trim().is_empty() {
            return Ok(None);
        }
        Ok(didl::album_art_uri(&info.current_uri_metadata)?)
    }

    pub(crate) fn media_server_location(&self) -> Result<String> {
        Ok(self.snapshot()?.media_server_location()?.to_string())
    }
}
