//! # Raumfeld SDK
//!
//! Control a Teufel Raumfeld multiroom system through its host:
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use raumfeld_sdk::RaumfeldHost;
//!
//! fn main() -> Result<(), raumfeld_sdk::SdkError> {
//!     let host = RaumfeldHost::new("192.168.1.20")?;
//!     host.start()?;
//!     host.wait_ready_timeout(Duration::from_secs(10))?;
//!
//!     for zone in host.zones()? {
//!         println!("Zone: {}", zone.join(", "));
//!     }
//!
//!     let kitchen = ["Kitchen"];
//!     host.create_zone(&kitchen)?;
//!     host.search_and_zone_play(&kitchen, "dc:title contains \"Morning\"", None)?;
//!     host.set_volume(&kitchen, 30)?;
//!
//!     host.stop();
//!     Ok(())
//! }
//! ```
//!
//! ## Key Features
//!
//! - **Cached state**: zones, rooms, devices and what each zone plays are
//!   refreshed in the background and read without network round trips
//! - **Two execution modes**: a dedicated updater thread by default, or a
//!   tokio task sharing the application's `reqwest` session
//! - **Ready gate**: block or await until the first refresh has landed
//! - **Change events**: subscribe to learn which parts of the system changed
//! - **Zone control**: zone layout, standby, transport, volume and play mode,
//!   blocking or as `_async` twins on the shared session
//! - **Media server**: browse, search and play search results
//!
//! ## Architecture
//!
//! ```text
//! raumfeld-sdk (RaumfeldHost)
//!     ↓ queries                ↓ commands
//! raumfeld-state            raumfeld-webservice / raumfeld-api
//! (Snapshot, updater)           ↓
//!     ↓                     soap-client
//! state-store
//! ```

pub use builder::RaumfeldHostBuilder;
pub use error::{Result, SdkError};
pub use host::RaumfeldHost;
pub use media::{PlayableMedia, CONTAINER_ALL_TRACKS, PLAY_SORT_CRITERIA};
pub use saved::SavedZone;

// Re-export commonly used types from the lower layers
pub use raumfeld_api::operations::{
    BrowseFlag, DirectoryResult, MediaInfo, PlayMode, PositionInfo, SystemSound, TransportInfo,
    TransportSettings, TransportState,
};
pub use raumfeld_state::{
    logging, ChangeKind, ChangeStream, HostConfig, PlaybackState, PowerState, Room, RoomId,
    SchedulerState, Snapshot, StateError, StopCompletion, UpdateEvent, UpdaterConfig, Versioned,
    ZoneId, ZoneMedia, ZoneState,
};

mod async_commands;
mod builder;
mod error;
mod host;
mod media;
mod saved;
mod zone;
