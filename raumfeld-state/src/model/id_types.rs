//! Identity types for zones, rooms and devices
//!
//! All three wrap the UDN exactly as the host publishes it (including the
//! `uuid:` prefix), since the web service RPCs expect it verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate common ID type implementations
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(udn: impl Into<String>) -> Self {
                Self(udn.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

id_type! {
    /// UDN of a zone, the virtual renderer playing to its rooms
    ZoneId
}

id_type! {
    /// UDN of a room
    RoomId
}

id_type! {
    /// UDN of a UPnP device listed by the host
    DeviceId
}
