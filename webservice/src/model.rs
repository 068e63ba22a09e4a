//! Documents published by the host web service
//!
//! Each type mirrors one XML document and is deserialized with quick-xml.
//! Unknown elements and attributes are ignored so newer firmware does not
//! break parsing.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Result, WebServiceError};

/// Device type of the Raumfeld media server
pub const TYPE_MEDIA_SERVER: &str = "urn:schemas-upnp-org:device:MediaServer:1";

/// Interpret the host's boolean strings (`true`, `1`, `t`, `y`, `yes`)
pub fn str_to_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "t" | "y" | "yes"
    )
}

fn parse<T: DeserializeOwned>(xml: &str, document: &'static str) -> Result<T> {
    quick_xml::de::from_str(xml).map_err(|e| WebServiceError::Parse {
        document,
        message: e.to_string(),
    })
}

// ============================================================================
// getHostInfo
// ============================================================================

/// `<hostInfo>` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HostInfo {
    #[serde(rename = "hostName", default)]
    pub host_name: Option<String>,
    #[serde(rename = "roomName", default)]
    pub room_name: Option<String>,
}

impl HostInfo {
    pub fn from_xml(xml: &str) -> Result<Self> {
        parse(xml, "hostInfo")
    }
}

// ============================================================================
// getZones
// ============================================================================

/// `<zoneConfig>` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ZoneConfig {
    #[serde(default)]
    pub zones: ZoneList,
    #[serde(rename = "unassignedRooms", default)]
    pub unassigned_rooms: RoomList,
}

impl ZoneConfig {
    pub fn from_xml(xml: &str) -> Result<Self> {
        parse(xml, "zoneConfig")
    }

    /// Every room, zoned first, then unassigned
    pub fn all_rooms(&self) -> impl Iterator<Item = &RoomElement> {
        self.zones
            .zones
            .iter()
            .flat_map(|zone| zone.rooms.iter())
            .chain(self.unassigned_rooms.rooms.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ZoneList {
    #[serde(rename = "zone", default)]
    pub zones: Vec<ZoneElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoomList {
    #[serde(rename = "room", default)]
    pub rooms: Vec<RoomElement>,
}

/// A zone: a virtual renderer playing to one or more rooms
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZoneElement {
    #[serde(rename = "@udn")]
    pub udn: String,
    #[serde(rename = "room", default)]
    pub rooms: Vec<RoomElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomElement {
    #[serde(rename = "@udn")]
    pub udn: String,
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@powerState", default)]
    pub power_state: Option<String>,
    #[serde(rename = "renderer", default)]
    pub renderers: Vec<RendererElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RendererElement {
    #[serde(rename = "@udn")]
    pub udn: String,
    #[serde(rename = "@name", default)]
    pub name: String,
}

// ============================================================================
// listDevices
// ============================================================================

/// `<devices>` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceList {
    #[serde(rename = "device", default)]
    pub devices: Vec<DeviceElement>,
}

impl DeviceList {
    pub fn from_xml(xml: &str) -> Result<Self> {
        parse(xml, "devices")
    }

    /// First device announcing itself as a media server
    pub fn media_server(&self) -> Option<&DeviceElement> {
        self.devices.iter().find(|d| d.device_type == TYPE_MEDIA_SERVER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceElement {
    #[serde(rename = "@udn")]
    pub udn: String,
    #[serde(rename = "@type", default)]
    pub device_type: String,
    #[serde(rename = "@location", default)]
    pub location: String,
    #[serde(rename = "$text", default)]
    pub name: String,
}

// ============================================================================
// SystemStateChannel
// ============================================================================

/// `<systemState>` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SystemState {
    #[serde(rename = "updateAvailable", default)]
    update_available: Option<ValueAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct ValueAttribute {
    #[serde(rename = "@value", default)]
    value: String,
}

impl SystemState {
    pub fn from_xml(xml: &str) -> Result<Self> {
        parse(xml, "systemState")
    }

    /// Whether the host reports a pending firmware update
    pub fn update_available(&self) -> bool {
        self.update_available
            .as_ref()
            .map(|v| str_to_bool(&v.value))
            .unwrap_or(false)
    }
}
