//! Client for the Raumfeld host web service
//!
//! The host (the base unit, or whichever speaker runs the master process)
//! publishes the system configuration over plain HTTP on port 47365. State
//! documents support long-polling: the client sends the last `updateID` it
//! saw and the host either answers with a new document or `304 Not Modified`.
//!
//! ```text
//! GET /getZones            updateID: 42      Prefer: wait=50
//!   → 200 updateID: 43     <zoneConfig>…</zoneConfig>
//!   → 304                  (nothing changed)
//! ```
//!
//! Zone membership and standby are changed through GET-style RPCs
//! ([`Rpc`]). Two transports are provided:
//! - [`WebServiceClient`] blocks the calling thread (ureq)
//! - [`AsyncWebServiceClient`] runs on a tokio runtime (reqwest)

mod async_client;
mod client;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod rpc;

pub use async_client::AsyncWebServiceClient;
pub use client::WebServiceClient;
pub use endpoint::{location, Endpoint, PollOutcome, DEFAULT_PORT};
pub use error::{Result, WebServiceError};
pub use model::{
    str_to_bool, DeviceElement, DeviceList, HostInfo, RoomElement, SystemState, ZoneConfig,
    ZoneElement, TYPE_MEDIA_SERVER,
};
pub use rpc::{Pong, Rpc};
