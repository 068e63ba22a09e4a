//! Generic Snapshot Store
//!
//! A small, type-safe store for "latest known state" that is refreshed by a
//! single background writer and read by any number of threads or tasks.
//!
//! # Features
//!
//! - **Copy-on-write snapshots**: Each write replaces the whole value, so
//!   readers always see a complete snapshot
//! - **Update counter**: Every replacement bumps a monotonically increasing
//!   version
//! - **Readiness gate**: A one-shot signal released by the first replacement,
//!   awaitable from blocking threads and from async tasks
//!
//! # Quick Start
//!
//! ```rust
//! use state_store::SnapshotStore;
//! use std::time::Duration;
//!
//! let store = SnapshotStore::new(Vec::<String>::new());
//! assert!(store.read_ready().is_none());
//!
//! store.replace(vec!["Kitchen".to_string()]);
//!
//! assert!(store.ready().wait_timeout(Duration::from_millis(10)));
//! let current = store.read();
//! assert_eq!(current.version(), 1);
//! assert_eq!(current.len(), 1);
//! ```
//!
//! # Architecture
//!
//! ```text
//! SnapshotStore<S>
//!     │
//!     ├── current: RwLock<Versioned<S>>
//!     │       │
//!     │       └── Versioned { version: u64, value: Arc<S> }
//!     │
//!     └── ready: ReadySignal
//!             │
//!             ├── Mutex<bool> + Condvar   (blocking waiters)
//!             └── watch::Sender<bool>     (async waiters)
//! ```

pub mod ready;
pub mod store;

pub use ready::ReadySignal;
pub use store::{SnapshotStore, Versioned};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::ready::ReadySignal;
    pub use crate::store::{SnapshotStore, Versioned};
}
