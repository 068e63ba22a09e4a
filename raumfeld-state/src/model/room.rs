use serde::{Deserialize, Serialize};

use super::{DeviceId, RoomId, ZoneId};

/// Power state the host reports for a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    Active,
    AutomaticStandby,
    ManualStandby,
    /// A value this library does not know, kept as sent
    Other(String),
}

impl PowerState {
    pub fn parse(value: &str) -> Self {
        match value {
            "ACTIVE" => PowerState::Active,
            "AUTOMATIC_STANDBY" => PowerState::AutomaticStandby,
            "MANUAL_STANDBY" => PowerState::ManualStandby,
            other => PowerState::Other(other.to_string()),
        }
    }

    pub fn is_standby(&self) -> bool {
        matches!(self, PowerState::AutomaticStandby | PowerState::ManualStandby)
    }
}

/// A room and the zone it currently belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// `None` for rooms the host lists as unassigned
    pub zone: Option<ZoneId>,
    pub power_state: Option<PowerState>,
    /// Speakers in the room
    pub renderers: Vec<DeviceId>,
}
