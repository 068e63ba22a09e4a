//! AVTransport service operations
//!
//! Playback control and transport state of a zone renderer.

use std::fmt;
use std::str::FromStr;

use xmltree::Element;

use crate::error::{ApiError, Result};
use crate::operation::{arg, optional_text, required_text, required_value, unit_operation, UpnpOperation};
use crate::service::Service;

// =============================================================================
// BASIC PLAYBACK CONTROL
// =============================================================================

unit_operation! {
    /// Start or resume playback
    PlayOperation, PlayRequest, AVTransport, "Play",
    { speed: String => "Speed" }
}

unit_operation! {
    PauseOperation, PauseRequest, AVTransport, "Pause", {}
}

unit_operation! {
    StopOperation, StopRequest, AVTransport, "Stop", {}
}

unit_operation! {
    NextOperation, NextRequest, AVTransport, "Next", {}
}

unit_operation! {
    PreviousOperation, PreviousRequest, AVTransport, "Previous", {}
}

unit_operation! {
    /// Jump within the current track; Raumfeld renderers use unit `ABS_TIME`
    /// with an `H:MM:SS` target
    SeekOperation, SeekRequest, AVTransport, "Seek",
    { unit: String => "Unit", target: String => "Target" }
}

unit_operation! {
    /// Replace what the zone plays with a URI and its DIDL-Lite metadata
    SetAVTransportURIOperation, SetAVTransportURIRequest, AVTransport, "SetAVTransportURI",
    {
        current_uri: String => "CurrentURI",
        current_uri_metadata: String => "CurrentURIMetaData",
    }
}

/// Seek unit for absolute track positions
pub const SEEK_ABS_TIME: &str = "ABS_TIME";

// =============================================================================
// PLAY MODE
// =============================================================================

/// Play modes supported by Raumfeld zone renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayMode {
    Normal,
    Shuffle,
    RepeatOne,
    RepeatAll,
    Random,
}

impl PlayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayMode::Normal => "NORMAL",
            PlayMode::Shuffle => "SHUFFLE",
            PlayMode::RepeatOne => "REPEAT_ONE",
            PlayMode::RepeatAll => "REPEAT_ALL",
            PlayMode::Random => "RANDOM",
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayMode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NORMAL" => Ok(PlayMode::Normal),
            "SHUFFLE" => Ok(PlayMode::Shuffle),
            "REPEAT_ONE" => Ok(PlayMode::RepeatOne),
            "REPEAT_ALL" => Ok(PlayMode::RepeatAll),
            "RANDOM" => Ok(PlayMode::Random),
            other => Err(ApiError::InvalidParameter(format!("Unknown play mode: {}", other))),
        }
    }
}

unit_operation! {
    SetPlayModeOperation, SetPlayModeRequest, AVTransport, "SetPlayMode",
    { new_play_mode: PlayMode => "NewPlayMode" }
}

// =============================================================================
// STATE QUERIES
// =============================================================================

/// Transport state of a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportState {
    Playing,
    Paused,
    Stopped,
    Transitioning,
    NoMediaPresent,
}

impl TransportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportState::Playing => "PLAYING",
            TransportState::Paused => "PAUSED_PLAYBACK",
            TransportState::Stopped => "STOPPED",
            TransportState::Transitioning => "TRANSITIONING",
            TransportState::NoMediaPresent => "NO_MEDIA_PRESENT",
        }
    }
}

impl FromStr for TransportState {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PLAYING" => Ok(TransportState::Playing),
            "PAUSED_PLAYBACK" => Ok(TransportState::Paused),
            "STOPPED" => Ok(TransportState::Stopped),
            "TRANSITIONING" => Ok(TransportState::Transitioning),
            "NO_MEDIA_PRESENT" => Ok(TransportState::NoMediaPresent),
            other => Err(ApiError::ParseError(format!("Unknown transport state: {}", other))),
        }
    }
}

/// Requests that only carry the instance id
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRequest {
    pub instance_id: u32,
}

impl Default for InstanceRequest {
    fn default() -> Self {
        Self { instance_id: 0 }
    }
}

/// GetTransportInfo operation
pub struct GetTransportInfoOperation;

#[derive(Debug, Clone, PartialEq)]
pub struct TransportInfo {
    pub current_transport_state: TransportState,
    pub current_transport_status: String,
    pub current_speed: String,
}

impl UpnpOperation for GetTransportInfoOperation {
    type Request = InstanceRequest;
    type Response = TransportInfo;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "GetTransportInfo";

    fn build_payload(request: &Self::Request) -> Result<String> {
        Ok(arg("InstanceID", request.instance_id))
    }

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        let state = required_text(xml, "CurrentTransportState")?;
        let status = optional_text(xml, "CurrentTransportStatus");
        let speed = optional_text(xml, "CurrentSpeed");

        Ok(TransportInfo {
            current_transport_state: state.trim().parse()?,
            current_transport_status: if status.is_empty() { "OK".to_string() } else { status },
            current_speed: if speed.is_empty() { "1".to_string() } else { speed },
        })
    }
}

/// GetMediaInfo operation
pub struct GetMediaInfoOperation;

/// What a renderer is set up to play
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    pub nr_tracks: u32,
    pub media_duration: String,
    pub current_uri: String,
    /// Raw DIDL-Lite document describing `current_uri`
    pub current_uri_metadata: String,
    pub next_uri: String,
    pub next_uri_metadata: String,
    pub play_medium: String,
}

impl UpnpOperation for GetMediaInfoOperation {
    type Request = InstanceRequest;
    type Response = MediaInfo;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "GetMediaInfo";

    fn build_payload(request: &Self::Request) -> Result<String> {
        Ok(arg("InstanceID", request.instance_id))
    }

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        let nr_tracks = optional_text(xml, "NrTracks").trim().parse().unwrap_or(0);
        Ok(MediaInfo {
            nr_tracks,
            media_duration: optional_text(xml, "MediaDuration"),
            current_uri: required_text(xml, "CurrentURI")?,
            current_uri_metadata: optional_text(xml, "CurrentURIMetaData"),
            next_uri: optional_text(xml, "NextURI"),
            next_uri_metadata: optional_text(xml, "NextURIMetaData"),
            play_medium: optional_text(xml, "PlayMedium"),
        })
    }
}

/// GetPositionInfo operation
pub struct GetPositionInfoOperation;

/// Position within the current track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionInfo {
    pub track: u32,
    pub track_duration: String,
    pub track_metadata: String,
    pub track_uri: String,
    pub rel_time: String,
    /// Absolute position, the value `Seek` with `ABS_TIME` accepts
    pub abs_time: String,
}

impl UpnpOperation for GetPositionInfoOperation {
    type Request = InstanceRequest;
    type Response = PositionInfo;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "GetPositionInfo";

    fn build_payload(request: &Self::Request) -> Result<String> {
        Ok(arg("InstanceID", request.instance_id))
    }

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        Ok(PositionInfo {
            track: required_value(xml, "Track")?,
            track_duration: optional_text(xml, "TrackDuration"),
            track_metadata: optional_text(xml, "TrackMetaData"),
            track_uri: optional_text(xml, "TrackURI"),
            rel_time: optional_text(xml, "RelTime"),
            abs_time: optional_text(xml, "AbsTime"),
        })
    }
}

/// GetTransportSettings operation
pub struct GetTransportSettingsOperation;

#[derive(Debug, Clone, PartialEq)]
pub struct TransportSettings {
    pub play_mode: PlayMode,
    pub rec_quality_mode: String,
}

impl UpnpOperation for GetTransportSettingsOperation {
    type Request = InstanceRequest;
    type Response = TransportSettings;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "GetTransportSettings";

    fn build_payload(request: &Self::Request) -> Result<String> {
        Ok(arg("InstanceID", request.instance_id))
    }

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        let play_mode = required_text(xml, "PlayMode")?;
        Ok(TransportSettings {
            play_mode: play_mode
                .trim()
                .parse()
                .map_err(|_| ApiError::ParseError(format!("Unknown play mode: {}", play_mode)))?,
            rec_quality_mode: optional_text(xml, "RecQualityMode"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(xml: &str) -> Element {
        Element::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_play_payload() {
        let payload = PlayOperation::build_payload(&PlayRequest {
            instance_id: 0,
            speed: "1".to_string(),
        })
        .unwrap();
        assert_eq!(payload, "<InstanceID>0</InstanceID><Speed>1</Speed>");
    }

    #[test]
    fn test_seek_payload() {
        let payload = SeekOperation::build_payload(&SeekRequest {
            instance_id: 0,
            unit: SEEK_ABS_TIME.to_string(),
            target: "0:01:30".to_string(),
        })
        .unwrap();
        assert_eq!(
            payload,
            "<InstanceID>0</InstanceID><Unit>ABS_TIME</Unit><Target>0:01:30</Target>"
        );
    }

    #[test]
    fn test_set_av_transport_uri_escapes_metadata() {
        let payload = SetAVTransportURIOperation::build_payload(&SetAVTransportURIRequest {
            instance_id: 0,
            current_uri: "dlna-playcontainer://uuid?sid=a&cid=b".to_string(),
            current_uri_metadata: "<DIDL-Lite/>".to_string(),
        })
        .unwrap();
        assert!(payload.contains("<CurrentURI>dlna-playcontainer://uuid?sid=a&amp;cid=b</CurrentURI>"));
        assert!(payload.contains("<CurrentURIMetaData>&lt;DIDL-Lite/&gt;</CurrentURIMetaData>"));
    }

    #[test]
    fn test_set_play_mode_payload() {
        let payload = SetPlayModeOperation::build_payload(&SetPlayModeRequest {
            instance_id: 0,
            new_play_mode: PlayMode::RepeatAll,
        })
        .unwrap();
        assert!(payload.ends_with("<NewPlayMode>REPEAT_ALL</NewPlayMode>"));
    }

    #[test]
    fn test_play_mode_parsing() {
        assert_eq!("SHUFFLE".parse::<PlayMode>().unwrap(), PlayMode::Shuffle);
        assert!(matches!(
            "SIDEWAYS".parse::<PlayMode>(),
            Err(ApiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_transport_info_parsing() {
        let xml = element(
            "<GetTransportInfoResponse>\
                <CurrentTransportState>NO_MEDIA_PRESENT</CurrentTransportState>\
                <CurrentTransportStatus>OK</CurrentTransportStatus>\
                <CurrentSpeed>1</CurrentSpeed>\
            </GetTransportInfoResponse>",
        );
        let info = GetTransportInfoOperation::parse_response(&xml).unwrap();
        assert_eq!(info.current_transport_state, TransportState::NoMediaPresent);
        assert_eq!(info.current_speed, "1");
    }

    #[test]
    fn test_transport_info_unknown_state() {
        let xml = element(
            "<GetTransportInfoResponse><CurrentTransportState>WOBBLING</CurrentTransportState></GetTransportInfoResponse>",
        );
        match GetTransportInfoOperation::parse_response(&xml) {
            Err(ApiError::ParseError(msg)) => assert!(msg.contains("WOBBLING")),
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_media_info_parsing_unescapes_metadata() {
        let xml = element(
            "<GetMediaInfoResponse>\
                <NrTracks>12</NrTracks>\
                <MediaDuration>0:45:00</MediaDuration>\
                <CurrentURI>dlna-playcontainer://abc</CurrentURI>\
                <CurrentURIMetaData>&lt;DIDL-Lite&gt;&lt;/DIDL-Lite&gt;</CurrentURIMetaData>\
                <NextURI></NextURI>\
            </GetMediaInfoResponse>",
        );
        let info = GetMediaInfoOperation::parse_response(&xml).unwrap();
        assert_eq!(info.nr_tracks, 12);
        assert_eq!(info.current_uri, "dlna-playcontainer://abc");
        assert_eq!(info.current_uri_metadata, "<DIDL-Lite></DIDL-Lite>");
        assert_eq!(info.next_uri, "");
    }

    #[test]
    fn test_position_info_parsing() {
        let xml = element(
            "<GetPositionInfoResponse>\
                <Track>3</Track>\
                <TrackDuration>0:04:12</TrackDuration>\
                <RelTime>0:01:02</RelTime>\
                <AbsTime>0:01:02</AbsTime>\
            </GetPositionInfoResponse>",
        );
        let info = GetPositionInfoOperation::parse_response(&xml).unwrap();
        assert_eq!(info.track, 3);
        assert_eq!(info.abs_time, "0:01:02");
    }

    #[test]
    fn test_transport_settings_parsing() {
        let xml = element(
            "<GetTransportSettingsResponse><PlayMode>RANDOM</PlayMode><RecQualityMode>NOT_IMPLEMENTED</RecQualityMode></GetTransportSettingsResponse>",
        );
        let settings = GetTransportSettingsOperation::parse_response(&xml).unwrap();
        assert_eq!(settings.play_mode, PlayMode::Random);
    }
}
