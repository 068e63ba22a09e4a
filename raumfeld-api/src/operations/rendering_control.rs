//! RenderingControl service operations
//!
//! On a zone renderer these act on the whole zone; `SetRoomVolume` targets a
//! single room inside it.

use xmltree::Element;

use crate::error::{ApiError, Result};
use crate::operation::{arg, required_text, required_value, unit_operation, UpnpOperation};
use crate::service::Service;

/// Channel used by every Raumfeld volume and mute action
pub const MASTER_CHANNEL: &str = "Master";

fn validate_volume(volume: u8) -> Result<()> {
    if volume > 100 {
        return Err(ApiError::InvalidParameter(format!(
            "Volume {} is out of range (0..=100)",
            volume
        )));
    }
    Ok(())
}

// =============================================================================
// VOLUME
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRequest {
    pub instance_id: u32,
    pub channel: String,
}

impl Default for ChannelRequest {
    fn default() -> Self {
        Self {
            instance_id: 0,
            channel: MASTER_CHANNEL.to_string(),
        }
    }
}

/// GetVolume operation
pub struct GetVolumeOperation;

impl UpnpOperation for GetVolumeOperation {
    type Request = ChannelRequest;
    type Response = u8;

    const SERVICE: Service = Service::RenderingControl;
    const ACTION: &'static str = "GetVolume";

    fn build_payload(request: &Self::Request) -> Result<String> {
        Ok(arg("InstanceID", request.instance_id) + &arg("Channel", &request.channel))
    }

    fn parse_response(xml: &Element) -> Result<u8> {
        required_value(xml, "CurrentVolume")
    }
}

/// SetVolume operation; keeps the volume ratio between the zone's rooms
pub struct SetVolumeOperation;

#[derive(Debug, Clone, PartialEq)]
pub struct SetVolumeRequest {
    pub instance_id: u32,
    pub channel: String,
    pub desired_volume: u8,
}

impl UpnpOperation for SetVolumeOperation {
    type Request = SetVolumeRequest;
    type Response = ();

    const SERVICE: Service = Service::RenderingControl;
    const ACTION: &'static str = "SetVolume";

    fn build_payload(request: &Self::Request) -> Result<String> {
        validate_volume(request.desired_volume)?;
        Ok(arg("InstanceID", request.instance_id)
            + &arg("Channel", &request.channel)
            + &arg("DesiredVolume", request.desired_volume))
    }

    fn parse_response(_xml: &Element) -> Result<()> {
        Ok(())
    }
}

unit_operation! {
    /// Move the volume of every room in the zone up or down by `amount`
    ChangeVolumeOperation, ChangeVolumeRequest, RenderingControl, "ChangeVolume",
    { amount: i32 => "Amount" }
}

/// SetRoomVolume operation
pub struct SetRoomVolumeOperation;

#[derive(Debug, Clone, PartialEq)]
pub struct SetRoomVolumeRequest {
    pub instance_id: u32,
    /// UDN of a room that is a member of the zone
    pub room: String,
    pub desired_volume: u8,
}

impl UpnpOperation for SetRoomVolumeOperation {
    type Request = SetRoomVolumeRequest;
    type Response = ();

    const SERVICE: Service = Service::RenderingControl;
    const ACTION: &'static str = "SetRoomVolume";

    fn build_payload(request: &Self::Request) -> Result<String> {
        validate_volume(request.desired_volume)?;
        Ok(arg("InstanceID", request.instance_id)
            + &arg("Room", &request.room)
            + &arg("DesiredVolume", request.desired_volume))
    }

    fn parse_response(_xml: &Element) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// MUTE
// =============================================================================

/// GetMute operation
pub struct GetMuteOperation;

impl UpnpOperation for GetMuteOperation {
    type Request = ChannelRequest;
    type Response = bool;

    const SERVICE: Service = Service::RenderingControl;
    const ACTION: &'static str = "GetMute";

    fn build_payload(request: &Self::Request) -> Result<String> {
        Ok(arg("InstanceID", request.instance_id) + &arg("Channel", &request.channel))
    }

    fn parse_response(xml: &Element) -> Result<bool> {
        let mute = required_text(xml, "CurrentMute")?;
        match mute.trim() {
            "1" | "true" | "True" => Ok(true),
            "0" | "false" | "False" => Ok(false),
            other => Err(ApiError::ParseError(format!("Invalid CurrentMute value: {}", other))),
        }
    }
}

/// SetMute operation
pub struct SetMuteOperation;

#[derive(Debug, Clone, PartialEq)]
pub struct SetMuteRequest {
    pub instance_id: u32,
    pub channel: String,
    pub desired_mute: bool,
}

impl UpnpOperation for SetMuteOperation {
    type Request = SetMuteRequest;
    type Response = ();

    const SERVICE: Service = Service::RenderingControl;
    const ACTION: &'static str = "SetMute";

    fn build_payload(request: &Self::Request) -> Result<String> {
        Ok(arg("InstanceID", request.instance_id)
            + &arg("Channel", &request.channel)
            + &arg("DesiredMute", if request.desired_mute { 1 } else { 0 }))
    }

    fn parse_response(_xml: &Element) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// SYSTEM SOUNDS
// =============================================================================

/// Sounds a speaker can mix into whatever it plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemSound {
    Success,
    Failure,
}

impl std::fmt::Display for SystemSound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SystemSound::Success => "Success",
            SystemSound::Failure => "Failure",
        })
    }
}

unit_operation! {
    /// Play a short confirmation sound on a single speaker (not a zone)
    PlaySystemSoundOperation, PlaySystemSoundRequest, RenderingControl, "PlaySystemSound",
    { sound: SystemSound => "Sound" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_volume_payload_uses_master() {
        let payload = GetVolumeOperation::build_payload(&ChannelRequest::default()).unwrap();
        assert_eq!(payload, "<InstanceID>0</InstanceID><Channel>Master</Channel>");
    }

    #[test]
    fn test_get_volume_parsing() {
        let xml = Element::parse(
            "<GetVolumeResponse><CurrentVolume>37</CurrentVolume></GetVolumeResponse>".as_bytes(),
        )
        .unwrap();
        assert_eq!(GetVolumeOperation::parse_response(&xml).unwrap(), 37);
    }

    #[test]
    fn test_set_volume_rejects_out_of_range() {
        let request = SetVolumeRequest {
            instance_id: 0,
            channel: MASTER_CHANNEL.to_string(),
            desired_volume: 101,
        };
        assert!(matches!(
            SetVolumeOperation::build_payload(&request),
            Err(ApiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_set_room_volume_payload() {
        let payload = SetRoomVolumeOperation::build_payload(&SetRoomVolumeRequest {
            instance_id: 0,
            room: "uuid:room-kitchen".to_string(),
            desired_volume: 25,
        })
        .unwrap();
        assert_eq!(
            payload,
            "<InstanceID>0</InstanceID><Room>uuid:room-kitchen</Room><DesiredVolume>25</DesiredVolume>"
        );
    }

    #[test]
    fn test_change_volume_negative_amount() {
        let payload = ChangeVolumeOperation::build_payload(&ChangeVolumeRequest {
            instance_id: 0,
            amount: -5,
        })
        .unwrap();
        assert!(payload.ends_with("<Amount>-5</Amount>"));
    }

    #[test]
    fn test_mute_round_trip_values() {
        let payload = SetMuteOperation::build_payload(&SetMuteRequest {
            instance_id: 0,
            channel: MASTER_CHANNEL.to_string(),
            desired_mute: true,
        })
        .unwrap();
        assert!(payload.ends_with("<DesiredMute>1</DesiredMute>"));

        let xml = Element::parse(
            "<GetMuteResponse><CurrentMute>0</CurrentMute></GetMuteResponse>".as_bytes(),
        )
        .unwrap();
        assert!(!GetMuteOperation::parse_response(&xml).unwrap());
    }

    #[test]
    fn test_system_sound_payload() {
        let payload = PlaySystemSoundOperation::build_payload(&PlaySystemSoundRequest {
            instance_id: 0,
            sound: SystemSound::Failure,
        })
        .unwrap();
        assert!(payload.ends_with("<Sound>Failure</Sound>"));
    }
}
