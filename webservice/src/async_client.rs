//! Non-blocking client for the host web service

use std::time::Duration;

use crate::client::{CONNECT_TIMEOUT, PROBE_TIMEOUT, REQUEST_TIMEOUT};
use crate::endpoint::{normalize_base, prefer_header, Endpoint, PollOutcome, UPDATE_ID_HEADER};
use crate::error::{Result, WebServiceError};
use crate::model::{DeviceList, HostInfo, SystemState, ZoneConfig};
use crate::rpc::{Pong, Rpc};

/// Async web service client sharing a reqwest session
#[derive(Debug, Clone)]
pub struct AsyncWebServiceClient {
    http: reqwest::Client,
    base: String,
    request_timeout: Duration,
    long_poll_wait: Duration,
}

impl AsyncWebServiceClient {
    /// Client with its own session and no long-polling
    pub fn new(base: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(base, http)
    }

    /// Reuse a session supplied by the host application
    pub fn with_client(base: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base: normalize_base(base),
            request_timeout: REQUEST_TIMEOUT,
            long_poll_wait: Duration::ZERO,
        }
    }

    /// Override the per-request timeout and the long-poll wait
    pub fn timeouts(mut self, request_timeout: Duration, long_poll_wait: Duration) -> Self {
        self.request_timeout = request_timeout;
        self.long_poll_wait = long_poll_wait;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Conditional request against a long-polled endpoint
    pub async fn poll(&self, endpoint: Endpoint, update_id: Option<&str>) -> Result<PollOutcome> {
        let url = format!("{}{}", self.base, endpoint.path());
        let mut request = self
            .http
            .get(&url)
            .timeout(self.request_timeout + self.long_poll_wait);
        if let Some(id) = update_id {
            request = request.header(UPDATE_ID_HEADER, id);
        }
        if let Some(prefer) = prefer_header(self.long_poll_wait) {
            request = request.header("Prefer", prefer);
        }

        tracing::debug!(path = endpoint.path(), ?update_id, "polling host (async)");

        let response = request
            .send()
            .await
            .map_err(|e| WebServiceError::Network(e.to_string()))?;

        match response.status().as_u16() {
            304 => Ok(PollOutcome::NotModified),
            200 => {
                let update_id = response
                    .headers()
                    .get(UPDATE_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let body = response
                    .text()
                    .await
                    .map_err(|e| WebServiceError::Network(e.to_string()))?;
                Ok(PollOutcome::Updated { update_id, body })
            }
            status => Err(WebServiceError::Status {
                path: endpoint.path(),
                status,
            }),
        }
    }

    pub async fn host_info(&self) -> Result<HostInfo> {
        HostInfo::from_xml(&self.fetch(Endpoint::HostInfo).await?)
    }

    pub async fn zone_config(&self) -> Result<ZoneConfig> {
        ZoneConfig::from_xml(&self.fetch(Endpoint::Zones).await?)
    }

    pub async fn devices(&self) -> Result<DeviceList> {
        DeviceList::from_xml(&self.fetch(Endpoint::Devices).await?)
    }

    pub async fn system_state(&self) -> Result<SystemState> {
        SystemState::from_xml(&self.fetch(Endpoint::SystemState).await?)
    }

    /// Issue a zone management call, discarding its body
    pub async fn call(&self, rpc: &Rpc) -> Result<()> {
        self.send(rpc).await.map(|_| ())
    }

    pub async fn connect_room_to_zone(
        &self,
        zone_udn: Option<&str>,
        room_udn: Option<&str>,
    ) -> Result<()> {
        self.call(&Rpc::ConnectRoomToZone {
            zone_udn: zone_udn.map(str::to_string),
            room_udn: room_udn.map(str::to_string),
        })
        .await
    }

    pub async fn connect_rooms_to_zone<S: AsRef<str>>(
        &self,
        zone_udn: Option<&str>,
        room_udns: &[S],
    ) -> Result<()> {
        self.call(&Rpc::ConnectRoomsToZone {
            zone_udn: zone_udn.map(str::to_string),
            room_udns: room_udns.iter().map(|u| u.as_ref().to_string()).collect(),
        })
        .await
    }

    pub async fn drop_room_job(&self, room_udn: &str) -> Result<()> {
        self.call(&Rpc::DropRoomJob { room_udn: room_udn.to_string() }).await
    }

    pub async fn enter_automatic_standby(&self, room_udn: &str) -> Result<()> {
        self.call(&Rpc::EnterAutomaticStandby { room_udn: room_udn.to_string() })
            .await
    }

    pub async fn enter_manual_standby(&self, room_udn: &str) -> Result<()> {
        self.call(&Rpc::EnterManualStandby { room_udn: room_udn.to_string() })
            .await
    }

    pub async fn leave_standby(&self, room_udn: &str) -> Result<()> {
        self.call(&Rpc::LeaveStandby { room_udn: room_udn.to_string() }).await
    }

    pub async fn ping(&self) -> Result<Pong> {
        Pong::from_xml(&self.send(&Rpc::Ping).await?)
    }

    /// Whether a Raumfeld host answers at this location within 3 seconds
    pub async fn host_is_valid(&self) -> bool {
        let url = format!("{}{}", self.base, Endpoint::HostInfo.path());
        let response = match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => response,
            _ => return false,
        };
        match response.text().await {
            Ok(body) => HostInfo::from_xml(&body)
                .map(|info| info.host_name.is_some())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn fetch(&self, endpoint: Endpoint) -> Result<String> {
        match self.poll(endpoint, None).await? {
            PollOutcome::Updated { body, .. } => Ok(body),
            PollOutcome::NotModified => Err(WebServiceError::Status {
                path: endpoint.path(),
                status: 304,
            }),
        }
    }

    async fn send(&self, rpc: &Rpc) -> Result<String> {
        let url = format!("{}{}", self.base, rpc.path());
        tracing::debug!(path = rpc.path(), "web service call (async)");

        let response = self
            .http
            .get(&url)
            .query(&rpc.params())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| WebServiceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebServiceError::Status {
                path: rpc.path(),
                status: status.as_u16(),
            });
        }
        response
            .text()
            .await
            .map_err(|e| WebServiceError::Network(e.to_string()))
    }
}
