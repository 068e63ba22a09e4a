//! RaumfeldHost - main entry point for the SDK
//!
//! Owns the background updater and the cached [`Snapshot`], and answers
//! room and zone queries from it. Commands live in the `zone`, `media` and
//! `saved` modules as further `impl RaumfeldHost` blocks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use raumfeld_api::{AsyncRaumfeldClient, RaumfeldClient};
use raumfeld_state::{
    ChangeStream, HostConfig, PowerState, RoomId, SchedulerState, Snapshot, SnapshotStore,
    StateError, StopCompletion, UpdateScheduler, Versioned, ZoneId,
};
use raumfeld_webservice::{AsyncWebServiceClient, WebServiceClient};

use crate::builder::RaumfeldHostBuilder;
use crate::error::Result;
use crate::saved::SavedZone;

/// Bounds of the wait for a freshly created zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ZoneWait {
    pub(crate) timeout: Duration,
    pub(crate) poll: Duration,
}

impl Default for ZoneWait {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll: Duration::from_millis(100),
        }
    }
}

/// A Raumfeld system reached through its host
///
/// Queries read the cached snapshot and fail with
/// [`StateError::NotReady`] until the first refresh has completed. Commands
/// are blocking calls; each has an `_async` twin for async code, which shares
/// the builder's `reqwest` session when one was given.
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use raumfeld_sdk::RaumfeldHost;
///
/// let host = RaumfeldHost::new("192.168.1.20")?;
/// host.start()?;
/// host.wait_ready_timeout(Duration::from_secs(10))?;
///
/// for zone in host.zones()? {
///     println!("{}", zone.join(", "));
/// }
/// host.play(&["Kitchen", "Bath"])?;
/// ```
pub struct RaumfeldHost {
    pub(crate) host: HostConfig,
    pub(crate) web: WebServiceClient,
    pub(crate) upnp: RaumfeldClient,
    pub(crate) async_web: AsyncWebServiceClient,
    pub(crate) async_upnp: AsyncRaumfeldClient,
    pub(crate) store: Arc<SnapshotStore<Snapshot>>,
    pub(crate) scheduler: UpdateScheduler,
    pub(crate) zone_wait: ZoneWait,
    pub(crate) saved_zones: Mutex<HashMap<Vec<String>, SavedZone>>,
}

impl RaumfeldHost {
    /// Host on the default port with default settings, refreshed on a thread
    pub fn new(host: impl Into<String>) -> Result<Self> {
        RaumfeldHostBuilder::new(host).build()
    }

    pub fn builder(host: impl Into<String>) -> RaumfeldHostBuilder {
        RaumfeldHostBuilder::new(host)
    }

    /// Host named by `RAUMFELD_HOST` / `RAUMFELD_PORT`
    pub fn from_env() -> Result<Self> {
        RaumfeldHostBuilder::from_config(HostConfig::from_env()?).build()
    }

    pub fn host_config(&self) -> &HostConfig {
        &self.host
    }

    /// Base location of the host web service
    pub fn location(&self) -> &str {
        self.web.base()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start refreshing in the background
    pub fn start(&self) -> Result<()> {
        self.scheduler.start()?;
        Ok(())
    }

    /// Stop refreshing; the last snapshot stays readable
    pub fn stop(&self) -> StopCompletion {
        self.scheduler.stop()
    }

    /// Change events for every refresh that alters the snapshot
    ///
    /// Subscribe before [`start`](Self::start) to also see the first refresh,
    /// which reports every [`ChangeKind`](raumfeld_state::ChangeKind).
    pub fn subscribe(&self) -> ChangeStream {
        self.scheduler.subscribe()
    }

    pub fn updater_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn is_cooperative(&self) -> bool {
        self.scheduler.is_cooperative()
    }

    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    /// Number of completed refreshes
    pub fn version(&self) -> u64 {
        self.store.version()
    }

    /// Block until the first refresh has completed
    pub fn wait_ready(&self) {
        self.store.ready().wait();
    }

    pub fn wait_ready_timeout(&self, timeout: Duration) -> Result<()> {
        if self.store.ready().wait_timeout(timeout) {
            Ok(())
        } else {
            Err(StateError::Timeout(timeout).into())
        }
    }

    pub async fn wait_ready_async(&self) {
        self.store.ready().wait_async().await;
    }

    pub async fn wait_ready_async_timeout(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.store.ready().wait_async())
            .await
            .map_err(|_| StateError::Timeout(timeout).into())
    }

    // ========================================================================
    // Snapshot access
    // ========================================================================

    /// Current snapshot, or `NotReady` before the first refresh
    pub fn snapshot(&self) -> Result<Versioned<Snapshot>> {
        self.store
            .read_ready()
            .ok_or_else(|| StateError::NotReady.into())
    }

    /// Current snapshot, empty before the first refresh
    pub fn snapshot_or_default(&self) -> Versioned<Snapshot> {
        self.store.read()
    }

    /// Room names per zone, each list sorted
    pub fn zones(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.snapshot()?.zones())
    }

    pub fn rooms(&self) -> Result<Vec<String>> {
        Ok(self.snapshot()?.room_names())
    }

    pub fn host_name(&self) -> Result<Option<String>> {
        Ok(self.snapshot()?.host_name().map(str::to_string))
    }

    /// Room the host device itself stands in
    pub fn host_room(&self) -> Result<Option<String>> {
        Ok(self.snapshot()?.host_room().map(str::to_string))
    }

    pub fn update_available(&self) -> Result<bool> {
        Ok(self.snapshot()?.update_available)
    }

    pub fn media_server_udn(&self) -> Result<Option<String>> {
        Ok(self
            .snapshot()?
            .media_server
            .as_ref()
            .map(|id| id.as_str().to_string()))
    }

    pub fn room_udns<S: AsRef<str>>(&self, rooms: &[S]) -> Result<Vec<RoomId>> {
        Ok(self.snapshot()?.room_udns(rooms)?)
    }

    /// UDN of the zone made up of exactly `rooms`
    pub fn zone_udn<S: AsRef<str>>(&self, rooms: &[S]) -> Result<ZoneId> {
        Ok(self.snapshot()?.zone_for_rooms(rooms)?.id.clone())
    }

    pub fn zone_is_valid<S: AsRef<str>>(&self, rooms: &[S]) -> Result<bool> {
        Ok(self.snapshot()?.zone_is_valid(rooms))
    }

    pub fn power_state(&self, room: &str) -> Result<Option<PowerState>> {
        Ok(self.snapshot()?.power_state(room)?.cloned())
    }

    pub fn zone_power_state<S: AsRef<str>>(
        &self,
        rooms: &[S],
    ) -> Result<Vec<(String, Option<PowerState>)>> {
        Ok(self.snapshot()?.zone_power_state(rooms)?)
    }

    // ========================================================================
    // Host probes
    // ========================================================================

    /// Whether the host answers `/getHostInfo` with a host name
    pub fn host_is_valid(&self) -> bool {
        self.web.host_is_valid()
    }

    pub async fn host_is_valid_async(&self) -> bool {
        self.async_web.host_is_valid().await
    }

    /// Renderer location of the zone made up of exactly `rooms`
    pub(crate) fn zone_location<S: AsRef<str>>(&self, rooms: &[S]) -> Result<String> {
        Ok(self.snapshot()?.zone_location(rooms)?.to_string())
    }
}

impl std::fmt::Debug for RaumfeldHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaumfeldHost")
            .field("location", &self.location())
            .field("updater", &self.scheduler.state())
            .field("version", &self.store.version())
            .finish()
    }
}
