//! Zone and standby remote procedure calls
//!
//! The host exposes these as plain GET requests with query parameters. Both
//! transports build requests from [`Rpc`] so paths and parameter names live
//! in one place.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Result, WebServiceError};

/// A call against the host's zone management endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rpc {
    /// Put one room into a zone; a missing or unknown zone creates a new one,
    /// a missing room means every available room
    ConnectRoomToZone {
        zone_udn: Option<String>,
        room_udn: Option<String>,
    },
    /// Put several rooms into a zone, same defaults as above
    ConnectRoomsToZone {
        zone_udn: Option<String>,
        room_udns: Vec<String>,
    },
    /// Remove a room from whatever zone it is in
    DropRoomJob { room_udn: String },
    EnterAutomaticStandby { room_udn: String },
    EnterManualStandby { room_udn: String },
    LeaveStandby { room_udn: String },
    Ping,
}

impl Rpc {
    pub fn path(&self) -> &'static str {
        match self {
            Rpc::ConnectRoomToZone { .. } => "/connectRoomToZone",
            Rpc::ConnectRoomsToZone { .. } => "/connectRoomsToZone",
            Rpc::DropRoomJob { .. } => "/dropRoomJob",
            Rpc::EnterAutomaticStandby { .. } => "/enterAutomaticStandby",
            Rpc::EnterManualStandby { .. } => "/enterManualStandby",
            Rpc::LeaveStandby { .. } => "/leaveStandby",
            Rpc::Ping => "/Ping",
        }
    }

    /// Query parameters, omitting optional ones that are unset or empty
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        match self {
            Rpc::ConnectRoomToZone { zone_udn, room_udn } => {
                push_present(&mut params, "zoneUDN", zone_udn.as_deref());
                push_present(&mut params, "roomUDN", room_udn.as_deref());
            }
            Rpc::ConnectRoomsToZone { zone_udn, room_udns } => {
                push_present(&mut params, "zoneUDN", zone_udn.as_deref());
                if !room_udns.is_empty() {
                    params.push(("roomUDNs", room_udns.join(",")));
                }
            }
            Rpc::DropRoomJob { room_udn }
            | Rpc::EnterAutomaticStandby { room_udn }
            | Rpc::EnterManualStandby { room_udn }
            | Rpc::LeaveStandby { room_udn } => {
                params.push(("roomUDN", room_udn.clone()));
            }
            Rpc::Ping => {}
        }
        params
    }
}

fn push_present(params: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        params.push((key, value.to_string()));
    }
}

/// Heartbeat answer: the leaf elements of the `<response>` document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pong {
    pub fields: Vec<(String, String)>,
}

impl Pong {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut fields = Vec::new();
        let mut current: Option<String> = None;
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    current = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                Ok(Event::Text(t)) => {
                    if let Some(name) = current.take() {
                        let value = t.unescape().map_err(|e| parse_error(e.to_string()))?;
                        fields.push((name, value.into_owned()));
                    }
                }
                Ok(Event::End(_)) => current = None,
                Ok(Event::Eof) => break,
                Err(e) => return Err(parse_error(e.to_string())),
                _ => {}
            }
        }
        Ok(Self { fields })
    }

    /// Value of a leaf element by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

fn parse_error(message: String) -> WebServiceError {
    WebServiceError::Parse {
        document: "response",
        message,
    }
}
