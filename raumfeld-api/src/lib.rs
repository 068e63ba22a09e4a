//! High-level Raumfeld API for UPnP device control
//!
//! This crate provides a type-safe, trait-based API for the UPnP services of
//! Raumfeld zone renderers and the Raumfeld media server. It uses the private
//! `soap-client` crate for low-level SOAP communication.
//!
//! ```rust,no_run
//! use raumfeld_api::RaumfeldClient;
//! use raumfeld_api::operations::{InstanceRequest, GetTransportInfoOperation};
//!
//! let client = RaumfeldClient::new();
//! let info = client.execute::<GetTransportInfoOperation>(
//!     "http://192.168.1.20:47366/zone/description.xml",
//!     &InstanceRequest::default(),
//! )?;
//! println!("{:?}", info.current_transport_state);
//! # Ok::<(), raumfeld_api::ApiError>(())
//! ```

pub mod client;
pub mod description;
pub mod didl;
pub mod error;
pub mod operation;
pub mod operations;
pub mod service;

pub use client::{AsyncRaumfeldClient, RaumfeldClient};
pub use description::{ControlUrlCache, DeviceDescription};
pub use error::{ApiError, Result};
pub use operation::UpnpOperation;
pub use service::{Service, ServiceInfo};
