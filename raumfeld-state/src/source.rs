//! Where snapshots come from
//!
//! The updater only knows "perform a fetch". [`ZoneSource`] is that
//! capability for blocking workers and [`AsyncZoneSource`] for tasks. The
//! web service implementations long-poll the host's state documents, ask
//! every zone renderer for its media and transport state, and assemble a
//! [`Snapshot`] from the result.

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use raumfeld_api::operations::{
    GetMediaInfoOperation, GetTransportInfoOperation, InstanceRequest, MediaInfo, TransportInfo,
};
use raumfeld_api::{ApiError, AsyncRaumfeldClient, RaumfeldClient};
use raumfeld_webservice::{
    AsyncWebServiceClient, DeviceList, Endpoint, PollOutcome, SystemState, WebServiceClient,
    ZoneConfig,
};

use crate::config::UpdaterConfig;
use crate::error::FetchError;
use crate::model::{HostInfo, ZoneId, ZoneMedia};
use crate::snapshot::{Snapshot, ZoneDetails};

/// Produces snapshots on a blocking worker thread
pub trait ZoneSource: Send + 'static {
    fn fetch(&mut self) -> Result<Snapshot, FetchError>;
}

impl<F> ZoneSource for F
where
    F: FnMut() -> Result<Snapshot, FetchError> + Send + 'static,
{
    fn fetch(&mut self) -> Result<Snapshot, FetchError> {
        self()
    }
}

/// Produces snapshots on an async task
#[async_trait]
pub trait AsyncZoneSource: Send + 'static {
    async fn fetch(&mut self) -> Result<Snapshot, FetchError>;
}

/// Documents and renderer details accumulated across refreshes
///
/// A 304 answer only means "same as last time", so the last parsed
/// documents are kept and reused until the host sends a new version.
#[derive(Debug, Default)]
struct SourceState {
    update_ids: HashMap<Endpoint, String>,
    host: Option<HostInfo>,
    zone_config: Option<ZoneConfig>,
    devices: Option<DeviceList>,
    system: Option<SystemState>,
    details: HashMap<ZoneId, ZoneDetails>,
}

impl SourceState {
    fn update_id(&self, endpoint: Endpoint) -> Option<&str> {
        self.update_ids.get(&endpoint).map(String::as_str)
    }

    fn apply(&mut self, endpoint: Endpoint, outcome: PollOutcome) -> Result<(), FetchError> {
        let (update_id, body) = match outcome {
            PollOutcome::NotModified => {
                trace!(path = endpoint.path(), "not modified");
                return Ok(());
            }
            PollOutcome::Updated { update_id, body } => (update_id, body),
        };

        match endpoint {
            Endpoint::HostInfo => {
                let info = raumfeld_webservice::HostInfo::from_xml(&body)?;
                self.host = Some(HostInfo {
                    host_name: info.host_name,
                    room_name: info.room_name,
                });
            }
            Endpoint::Zones => self.zone_config = Some(ZoneConfig::from_xml(&body)?),
            Endpoint::Devices => self.devices = Some(DeviceList::from_xml(&body)?),
            Endpoint::SystemState => self.system = Some(SystemState::from_xml(&body)?),
        }

        // Only remember the id once the body it belongs to has been parsed
        match update_id {
            Some(id) => {
                self.update_ids.insert(endpoint, id);
            }
            None => {
                self.update_ids.remove(&endpoint);
            }
        }
        Ok(())
    }

    /// Zones whose renderer is listed among the devices
    fn renderer_locations(&self) -> Vec<(ZoneId, String)> {
        let (Some(zone_config), Some(devices)) = (&self.zone_config, &self.devices) else {
            return Vec::new();
        };

        zone_config
            .zones
            .zones
            .iter()
            .filter_map(|zone| {
                devices
                    .devices
                    .iter()
                    .find(|d| d.udn == zone.udn)
                    .map(|d| (ZoneId::new(zone.udn.clone()), d.location.clone()))
            })
            .collect()
    }

    /// Keep the previous values for whatever the renderer failed to answer
    fn record_details(
        &mut self,
        zone: ZoneId,
        media: Result<MediaInfo, ApiError>,
        transport: Result<TransportInfo, ApiError>,
    ) {
        let entry = self.details.entry(zone.clone()).or_default();
        match media {
            Ok(info) => entry.media = Some(ZoneMedia::from_media_info(&info)),
            Err(e) => warn!(zone = %zone, error = %e, "media info unavailable, keeping last known"),
        }
        match transport {
            Ok(info) => entry.playback = info.current_transport_state.into(),
            Err(e) => warn!(zone = %zone, error = %e, "transport info unavailable, keeping last known"),
        }
    }

    fn build(&mut self) -> Result<Snapshot, FetchError> {
        let mut missing = Vec::new();
        if self.host.is_none() {
            missing.push(Endpoint::HostInfo.document());
        }
        if self.zone_config.is_none() {
            missing.push(Endpoint::Zones.document());
        }
        if self.devices.is_none() {
            missing.push(Endpoint::Devices.document());
        }

        let (Some(host), Some(zone_config), Some(devices)) =
            (&self.host, &self.zone_config, &self.devices)
        else {
            return Err(FetchError::Incomplete(missing));
        };

        self.details.retain(|zone, _| {
            zone_config
                .zones
                .zones
                .iter()
                .any(|z| z.udn == zone.as_str())
        });

        Ok(Snapshot::from_documents(
            host.clone(),
            zone_config,
            devices,
            self.system.as_ref(),
            &self.details,
        ))
    }
}

/// Blocking source backed by the host web service and UPnP renderers
#[derive(Debug)]
pub struct WebServiceSource {
    web: WebServiceClient,
    upnp: RaumfeldClient,
    state: SourceState,
}

impl WebServiceSource {
    pub fn new(base: impl Into<String>, config: &UpdaterConfig) -> Self {
        Self::with_clients(
            WebServiceClient::with_timeouts(base, config.request_timeout, config.long_poll_wait),
            RaumfeldClient::new(),
        )
    }

    pub fn with_clients(web: WebServiceClient, upnp: RaumfeldClient) -> Self {
        Self {
            web,
            upnp,
            state: SourceState::default(),
        }
    }
}

impl ZoneSource for WebServiceSource {
    fn fetch(&mut self) -> Result<Snapshot, FetchError> {
        for endpoint in Endpoint::ALL {
            let outcome = self.web.poll(endpoint, self.state.update_id(endpoint))?;
            self.state.apply(endpoint, outcome)?;
        }

        let request = InstanceRequest::default();
        for (zone, location) in self.state.renderer_locations() {
            debug!(zone = %zone, %location, "querying zone renderer");
            let media = self.upnp.execute::<GetMediaInfoOperation>(&location, &request);
            let transport = self
                .upnp
                .execute::<GetTransportInfoOperation>(&location, &request);
            self.state.record_details(zone, media, transport);
        }

        self.state.build()
    }
}

/// Async source sharing the host application's HTTP session
#[derive(Debug)]
pub struct AsyncWebServiceSource {
    web: AsyncWebServiceClient,
    upnp: AsyncRaumfeldClient,
    state: SourceState,
}

impl AsyncWebServiceSource {
    pub fn new(base: impl Into<String>, http: reqwest::Client, config: &UpdaterConfig) -> Self {
        Self::with_clients(
            AsyncWebServiceClient::with_client(base, http.clone())
                .timeouts(config.request_timeout, config.long_poll_wait),
            AsyncRaumfeldClient::with_http_client(http),
        )
    }

    pub fn with_clients(web: AsyncWebServiceClient, upnp: AsyncRaumfeldClient) -> Self {
        Self {
            web,
            upnp,
            state: SourceState::default(),
        }
    }
}

#[async_trait]
impl AsyncZoneSource for AsyncWebServiceSource {
    async fn fetch(&mut self) -> Result<Snapshot, FetchError> {
        let web = &self.web;
        let state = &self.state;
        let outcomes =
            poll_all(move |endpoint| web.poll(endpoint, state.update_id(endpoint))).await;
        for (endpoint, outcome) in outcomes {
            self.state.apply(endpoint, outcome?)?;
        }

        let request = InstanceRequest::default();
        for (zone, location) in self.state.renderer_locations() {
            debug!(zone = %zone, %location, "querying zone renderer (async)");
            let media = self
                .upnp
                .execute::<GetMediaInfoOperation>(&location, &request)
                .await;
            let transport = self
                .upnp
                .execute::<GetTransportInfoOperation>(&location, &request)
                .await;
            self.state.record_details(zone, media, transport);
        }

        self.state.build()
    }
}

/// Poll every endpoint at once, results in [`Endpoint::ALL`] order
///
/// A long-polled round then lasts as long as the slowest endpoint instead
/// of the sum of all waits.
async fn poll_all<F, Fut, T>(poll: F) -> [(Endpoint, T); 4]
where
    F: Fn(Endpoint) -> Fut,
    Fut: Future<Output = T>,
{
    let [a, b, c, d] = Endpoint::ALL;
    let (ra, rb, rc, rd) = tokio::join!(poll(a), poll(b), poll(c), poll(d));
    [(a, ra), (b, rb), (c, rc), (d, rd)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlaybackState;
    use raumfeld_api::operations::TransportState;

    const HOST_INFO: &str = "<hostInfo><hostName>teufel</hostName><roomName>Kitchen</roomName></hostInfo>";
    const ZONES: &str = r#"<zoneConfig><zones><zone udn="uuid:z1"><room udn="uuid:r1" name="Kitchen"/></zone></zones></zoneConfig>"#;
    const DEVICES: &str = r#"<devices><device udn="uuid:z1" type="urn:schemas-upnp-org:device:MediaRenderer:1" location="http://h:1/z1.xml">Kitchen</device></devices>"#;

    fn updated(id: &str, body: &str) -> PollOutcome {
        PollOutcome::Updated {
            update_id: Some(id.to_string()),
            body: body.to_string(),
        }
    }

    fn transport(state: TransportState) -> TransportInfo {
        TransportInfo {
            current_transport_state: state,
            current_transport_status: "OK".to_string(),
            current_speed: "1".to_string(),
        }
    }

    #[test]
    fn test_build_reports_missing_documents() {
        let mut state = SourceState::default();
        state.apply(Endpoint::Zones, updated("1", ZONES)).unwrap();

        match state.build() {
            Err(FetchError::Incomplete(missing)) => {
                assert_eq!(missing, vec![Endpoint::HostInfo.document(), Endpoint::Devices.document()]);
            }
            other => panic!("expected incomplete state, got {:?}", other),
        }
    }

    #[test]
    fn test_not_modified_keeps_documents() {
        let mut state = SourceState::default();
        state.apply(Endpoint::HostInfo, updated("7", HOST_INFO)).unwrap();
        state.apply(Endpoint::Zones, updated("8", ZONES)).unwrap();
        state.apply(Endpoint::Devices, updated("9", DEVICES)).unwrap();
        let first = state.build().unwrap();

        state.apply(Endpoint::Zones, PollOutcome::NotModified).unwrap();
        assert_eq!(state.update_id(Endpoint::Zones), Some("8"));
        assert_eq!(state.build().unwrap(), first);
        assert_eq!(
            state.renderer_locations(),
            vec![(ZoneId::new("uuid:z1"), "http://h:1/z1.xml".to_string())]
        );
    }

    #[test]
    fn test_unparseable_document_keeps_old_update_id() {
        let mut state = SourceState::default();
        state.apply(Endpoint::Zones, updated("1", ZONES)).unwrap();
        let err = state.apply(Endpoint::Zones, updated("2", "<zoneConfig><zones>")).unwrap_err();
        assert!(matches!(err, FetchError::Protocol(_)));
        assert_eq!(state.update_id(Endpoint::Zones), Some("1"));
    }

    #[test]
    fn test_renderer_failure_keeps_last_media() {
        let mut state = SourceState::default();
        let zone = ZoneId::new("uuid:z1");
        let media = MediaInfo {
            current_uri: "http://stream/1".to_string(),
            ..Default::default()
        };
        state.record_details(zone.clone(), Ok(media), Ok(transport(TransportState::Playing)));
        state.record_details(
            zone.clone(),
            Err(ApiError::NetworkError("timeout".to_string())),
            Err(ApiError::NetworkError("timeout".to_string())),
        );

        let details = &state.details[&zone];
        assert_eq!(details.media.as_ref().map(|m| m.uri.as_str()), Some("http://stream/1"));
        assert_eq!(details.playback, PlaybackState::Playing);
    }

    #[test]
    fn test_details_of_vanished_zones_are_dropped() {
        let mut state = SourceState::default();
        state.apply(Endpoint::HostInfo, updated("1", HOST_INFO)).unwrap();
        state.apply(Endpoint::Zones, updated("1", ZONES)).unwrap();
        state.apply(Endpoint::Devices, updated("1", DEVICES)).unwrap();
        state.record_details(
            ZoneId::new("uuid:gone"),
            Ok(MediaInfo::default()),
            Ok(transport(TransportState::Stopped)),
        );

        state.build().unwrap();
        assert!(state.details.is_empty());
    }

    #[test]
    fn test_closures_are_sources() {
        let mut calls = 0;
        let mut source = move || {
            calls += 1;
            if calls == 1 {
                Err(FetchError::Transient("refused".to_string()))
            } else {
                Ok(Snapshot::default())
            }
        };
        assert!(ZoneSource::fetch(&mut source).is_err());
        assert!(ZoneSource::fetch(&mut source).is_ok());
    }

    #[tokio::test]
    async fn test_endpoints_are_polled_concurrently() {
        let started = std::time::Instant::now();
        let outcomes = poll_all(|endpoint| async move {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            endpoint.path()
        })
        .await;

        assert!(started.elapsed() < std::time::Duration::from_millis(900));
        for ((endpoint, path), expected) in outcomes.iter().zip(Endpoint::ALL) {
            assert_eq!(*endpoint, expected);
            assert_eq!(*path, expected.path());
        }
    }
}
