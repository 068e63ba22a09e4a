//! Construction of [`RaumfeldHost`]

use std::sync::Arc;
use std::time::Duration;

use raumfeld_api::{AsyncRaumfeldClient, RaumfeldClient};
use raumfeld_state::{
    AsyncWebServiceSource, HostConfig, Snapshot, SnapshotStore, StateError, UpdateScheduler,
    UpdaterConfig, WebServiceSource,
};
use raumfeld_webservice::{AsyncWebServiceClient, WebServiceClient};
use tokio::runtime::Handle;

use crate::error::Result;
use crate::host::{RaumfeldHost, ZoneWait};

/// Builder for [`RaumfeldHost`]
///
/// Without a session the updater runs on its own thread. With a
/// `reqwest::Client` session it runs as a task on the given runtime, or on
/// the runtime current at [`build`](Self::build) time.
#[derive(Debug, Clone)]
pub struct RaumfeldHostBuilder {
    host: HostConfig,
    updater: UpdaterConfig,
    session: Option<reqwest::Client>,
    runtime: Option<Handle>,
    zone_wait: ZoneWait,
}

impl RaumfeldHostBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self::from_config(HostConfig::new(host))
    }

    pub fn from_config(host: HostConfig) -> Self {
        Self {
            host,
            updater: UpdaterConfig::default(),
            session: None,
            runtime: None,
            zone_wait: ZoneWait::default(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.host.port = port;
        self
    }

    /// Pause between refreshes of the cached state
    pub fn interval(mut self, interval: Duration) -> Self {
        self.updater.interval = interval;
        self
    }

    pub fn updater_config(mut self, config: UpdaterConfig) -> Self {
        self.updater = config;
        self
    }

    /// Share the application's HTTP session and refresh cooperatively
    pub fn session(mut self, session: reqwest::Client) -> Self {
        self.session = Some(session);
        self
    }

    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// How long `create_zone` waits for the new zone, and how often it looks
    pub fn zone_creation_wait(mut self, timeout: Duration, poll: Duration) -> Self {
        self.zone_wait = ZoneWait { timeout, poll };
        self
    }

    pub fn build(self) -> Result<RaumfeldHost> {
        self.host.validate()?;
        self.updater.validate()?;
        if self.zone_wait.poll.is_zero() {
            return Err(StateError::InvalidConfig(
                "Zone creation poll interval must be greater than 0".to_string(),
            )
            .into());
        }

        let location = self.host.location();
        let store = Arc::new(SnapshotStore::new(Snapshot::default()));

        let scheduler = match self.session.clone() {
            Some(session) => {
                let handle = match self.runtime {
                    Some(handle) => handle,
                    None => Handle::try_current().map_err(|_| {
                        StateError::InvalidConfig(
                            "A session requires a tokio runtime handle".to_string(),
                        )
                    })?,
                };
                let source = AsyncWebServiceSource::new(location.clone(), session, &self.updater);
                UpdateScheduler::cooperative(Arc::clone(&store), self.updater.clone(), source, handle)
            }
            None => {
                let source = WebServiceSource::new(location.clone(), &self.updater);
                UpdateScheduler::threaded(Arc::clone(&store), self.updater.clone(), source)
            }
        };

        let (async_web, async_upnp) = match &self.session {
            Some(session) => (
                AsyncWebServiceClient::with_client(location.clone(), session.clone()),
                AsyncRaumfeldClient::with_http_client(session.clone()),
            ),
            None => (
                AsyncWebServiceClient::new(location.clone()),
                AsyncRaumfeldClient::new(),
            ),
        };

        tracing::debug!(
            %location,
            cooperative = scheduler.is_cooperative(),
            "Raumfeld host configured"
        );

        Ok(RaumfeldHost {
            host: self.host,
            web: WebServiceClient::with_timeouts(
                location,
                self.updater.request_timeout,
                Duration::ZERO,
            ),
            upnp: RaumfeldClient::new(),
            async_web: async_web.timeouts(self.updater.request_timeout, Duration::ZERO),
            async_upnp,
            store,
            scheduler,
            zone_wait: self.zone_wait,
            saved_zones: Default::default(),
        })
    }
}
