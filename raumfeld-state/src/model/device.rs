use serde::{Deserialize, Serialize};

use super::DeviceId;

/// A UPnP device the host lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub device_type: String,
    /// Description document URL
    pub location: String,
    pub name: String,
}

/// Identity of the host the library talks to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub host_name: Option<String>,
    pub room_name: Option<String>,
}
