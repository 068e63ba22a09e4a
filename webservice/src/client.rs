//! Blocking client for the host web service

use std::time::Duration;

use crate::endpoint::{normalize_base, prefer_header, Endpoint, PollOutcome, UPDATE_ID_HEADER};
use crate::error::{Result, WebServiceError};
use crate::model::{DeviceList, HostInfo, SystemState, ZoneConfig};
use crate::rpc::{Pong, Rpc};

pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Blocking web service client bound to one host location
#[derive(Debug, Clone)]
pub struct WebServiceClient {
    agent: ureq::Agent,
    base: String,
    long_poll_wait: Duration,
}

impl WebServiceClient {
    /// Client for `base` (e.g. `http://192.168.0.10:47365`) without long-polling
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_timeouts(base, REQUEST_TIMEOUT, Duration::ZERO)
    }

    /// Client with an explicit request timeout and long-poll wait
    ///
    /// The read timeout covers the long-poll wait on top of the request
    /// timeout, since the host holds the response for up to that long.
    pub fn with_timeouts(
        base: impl Into<String>,
        request_timeout: Duration,
        long_poll_wait: Duration,
    ) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(CONNECT_TIMEOUT)
                .timeout_read(request_timeout + long_poll_wait)
                .build(),
            base: normalize_base(base),
            long_poll_wait,
        }
    }

    /// Host location this client talks to
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Conditional request against a long-polled endpoint
    pub fn poll(&self, endpoint: Endpoint, update_id: Option<&str>) -> Result<PollOutcome> {
        let url = format!("{}{}", self.base, endpoint.path());
        let mut request = self.agent.get(&url);
        if let Some(id) = update_id {
            request = request.set(UPDATE_ID_HEADER, id);
        }
        if let Some(prefer) = prefer_header(self.long_poll_wait) {
            request = request.set("Prefer", &prefer);
        }

        tracing::debug!(path = endpoint.path(), ?update_id, "polling host");

        match request.call() {
            Ok(response) if response.status() == 304 => Ok(PollOutcome::NotModified),
            Ok(response) if response.status() == 200 => {
                let update_id = response.header(UPDATE_ID_HEADER).map(str::to_string);
                let body = response
                    .into_string()
                    .map_err(|e| WebServiceError::Network(e.to_string()))?;
                Ok(PollOutcome::Updated { update_id, body })
            }
            Ok(response) => Err(WebServiceError::Status {
                path: endpoint.path(),
                status: response.status(),
            }),
            Err(ureq::Error::Status(status, _)) => Err(WebServiceError::Status {
                path: endpoint.path(),
                status,
            }),
            Err(e) => Err(WebServiceError::Network(e.to_string())),
        }
    }

    /// Fetch the current `<hostInfo>` unconditionally
    pub fn host_info(&self) -> Result<HostInfo> {
        HostInfo::from_xml(&self.fetch(Endpoint::HostInfo)?)
    }

    pub fn zone_config(&self) -> Result<ZoneConfig> {
        ZoneConfig::from_xml(&self.fetch(Endpoint::Zones)?)
    }

    pub fn devices(&self) -> Result<DeviceList> {
        DeviceList::from_xml(&self.fetch(Endpoint::Devices)?)
    }

    pub fn system_state(&self) -> Result<SystemState> {
        SystemState::from_xml(&self.fetch(Endpoint::SystemState)?)
    }

    /// Issue a zone management call, discarding its body
    pub fn call(&self, rpc: &Rpc) -> Result<()> {
        self.send(rpc, REQUEST_TIMEOUT).map(|_| ())
    }

    pub fn connect_room_to_zone(&self, zone_udn: Option<&str>, room_udn: Option<&str>) -> Result<()> {
        self.call(&Rpc::ConnectRoomToZone {
            zone_udn: zone_udn.map(str::to_string),
            room_udn: room_udn.map(str::to_string),
        })
    }

    pub fn connect_rooms_to_zone<S: AsRef<str>>(
        &self,
        zone_udn: Option<&str>,
        room_udns: &[S],
    ) -> Result<()> {
        self.call(&Rpc::ConnectRoomsToZone {
            zone_udn: zone_udn.map(str::to_string),
            room_udns: room_udns.iter().map(|u| u.as_ref().to_string()).collect(),
        })
    }

    pub fn drop_room_job(&self, room_udn: &str) -> Result<()> {
        self.call(&Rpc::DropRoomJob { room_udn: room_udn.to_string() })
    }

    pub fn enter_automatic_standby(&self, room_udn: &str) -> Result<()> {
        self.call(&Rpc::EnterAutomaticStandby { room_udn: room_udn.to_string() })
    }

    pub fn enter_manual_standby(&self, room_udn: &str) -> Result<()> {
        self.call(&Rpc::EnterManualStandby { room_udn: room_udn.to_string() })
    }

    pub fn leave_standby(&self, room_udn: &str) -> Result<()> {
        self.call(&Rpc::LeaveStandby { room_udn: room_udn.to_string() })
    }

    /// Heartbeat; the host answers with its hardware model and number
    pub fn ping(&self) -> Result<Pong> {
        Pong::from_xml(&self.send(&Rpc::Ping, REQUEST_TIMEOUT)?)
    }

    /// Whether a Raumfeld host answers at this location within 3 seconds
    pub fn host_is_valid(&self) -> bool {
        let url = format!("{}{}", self.base, Endpoint::HostInfo.path());
        let body = self
            .agent
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .call()
            .ok()
            .and_then(|response| response.into_string().ok());

        match body.map(|b| HostInfo::from_xml(&b)) {
            Some(Ok(info)) => info.host_name.is_some(),
            _ => false,
        }
    }

    fn fetch(&self, endpoint: Endpoint) -> Result<String> {
        match self.poll(endpoint, None)? {
            PollOutcome::Updated { body, .. } => Ok(body),
            // Without an update id the host always answers with the document
            PollOutcome::NotModified => Err(WebServiceError::Status {
                path: endpoint.path(),
                status: 304,
            }),
        }
    }

    fn send(&self, rpc: &Rpc, timeout: Duration) -> Result<String> {
        let url = format!("{}{}", self.base, rpc.path());
        let mut request = self.agent.get(&url).timeout(timeout);
        for (key, value) in rpc.params() {
            request = request.query(key, &value);
        }

        tracing::debug!(path = rpc.path(), "web service call");

        match request.call() {
            Ok(response) => response
                .into_string()
                .map_err(|e| WebServiceError::Network(e.to_string())),
            Err(ureq::Error::Status(status, _)) => Err(WebServiceError::Status {
                path: rpc.path(),
                status,
            }),
            Err(e) => Err(WebServiceError::Network(e.to_string())),
        }
    }
}
