//! Raumfeld State Synchronization
//!
//! Keeps an immutable [`Snapshot`] of a Raumfeld system up to date in the
//! background and hands it out to any number of readers.
//!
//! # Architecture
//!
//! ```text
//! ZoneSource / AsyncZoneSource      (web service long-polls + renderer queries)
//!         │ fetch
//!         ▼
//! Updater::on_fetch ──replace──> SnapshotStore<Snapshot> ──read──> callers
//!         │    │                        │
//!         │    │                        └── ReadySignal (first success)
//!         │    └──changes──> ChangeNotifier ──> ChangeStream subscribers
//!         │ delay
//!         ▼
//! UpdateScheduler                   (OS thread or tokio task)
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use raumfeld_state::{HostConfig, Snapshot, UpdateScheduler, UpdaterConfig, WebServiceSource};
//! use state_store::SnapshotStore;
//!
//! let host = HostConfig::new("192.168.1.20");
//! let config = UpdaterConfig::default();
//! let store = Arc::new(SnapshotStore::new(Snapshot::default()));
//! let source = WebServiceSource::new(host.location(), &config);
//!
//! let scheduler = UpdateScheduler::threaded(store.clone(), config, source);
//! scheduler.start()?;
//! store.ready().wait_timeout(Duration::from_secs(10));
//! println!("{:?}", store.read().zones());
//! ```

pub mod change;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod scheduler;
pub mod snapshot;
pub mod source;
pub mod updater;

pub use change::{ChangeKind, ChangeNotifier, ChangeStream, UpdateEvent};
pub use config::{HostConfig, UpdaterConfig};
pub use error::{FetchError, Result, StateError};
pub use model::{
    Device, DeviceId, HostInfo, PlaybackState, PowerState, Room, RoomId, ZoneId, ZoneMedia,
    ZoneState,
};
pub use scheduler::{SchedulerState, StopCompletion, UpdateScheduler};
pub use snapshot::{Snapshot, ZoneDetails};
pub use source::{AsyncWebServiceSource, AsyncZoneSource, WebServiceSource, ZoneSource};
pub use updater::Updater;

// Re-export so callers can name the store without another dependency
pub use state_store::{ReadySignal, SnapshotStore, Versioned};
