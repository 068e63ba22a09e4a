//! Long-polled state endpoints of the host web service

use std::time::Duration;

/// Well-known port of the Raumfeld host web service
pub const DEFAULT_PORT: u16 = 47365;

/// Header carrying the last seen update id, in requests and responses
pub const UPDATE_ID_HEADER: &str = "updateID";

/// State documents the host publishes with long-polling support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `<hostInfo>` of the host the client talks to
    HostInfo,
    /// `<zoneConfig>` with zones, rooms and unassigned rooms
    Zones,
    /// `<devices>` with every UPnP device and its description location
    Devices,
    /// `<systemState>` flags such as pending software updates
    SystemState,
}

impl Endpoint {
    /// All endpoints, in the order a full refresh visits them
    pub const ALL: [Endpoint; 4] = [
        Endpoint::Zones,
        Endpoint::Devices,
        Endpoint::HostInfo,
        Endpoint::SystemState,
    ];

    /// Request path relative to the host location
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::HostInfo => "/getHostInfo",
            Endpoint::Zones => "/getZones",
            Endpoint::Devices => "/listDevices",
            Endpoint::SystemState => "/SystemStateChannel",
        }
    }

    /// Root element name of the returned document
    pub fn document(&self) -> &'static str {
        match self {
            Endpoint::HostInfo => "hostInfo",
            Endpoint::Zones => "zoneConfig",
            Endpoint::Devices => "devices",
            Endpoint::SystemState => "systemState",
        }
    }
}

/// Result of one conditional request against a long-polled endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The document changed (or no update id was sent)
    Updated {
        update_id: Option<String>,
        body: String,
    },
    /// The document is unchanged since the sent update id
    NotModified,
}

/// Build the base location `http://{host}:{port}`
///
/// IPv6 literals are wrapped in brackets.
pub fn location(host: &str, port: u16) -> String {
    if host.parse::<std::net::Ipv6Addr>().is_ok() {
        format!("http://[{}]:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

/// Value of the `Prefer` header for a long-poll wait, if any
pub(crate) fn prefer_header(wait: Duration) -> Option<String> {
    if wait.is_zero() {
        None
    } else {
        Some(format!("wait={}", wait.as_secs().max(1)))
    }
}

pub(crate) fn normalize_base(base: impl Into<String>) -> String {
    let mut base = base.into();
    while base.ends_with('/') {
        base.pop();
    }
    base
}
