//! Model types for raumfeld-state

mod device;
mod id_types;
mod playback_state;
mod room;
mod zone;

pub use device::{Device, HostInfo};
pub use id_types::{DeviceId, RoomId, ZoneId};
pub use playback_state::PlaybackState;
pub use room::{PowerState, Room};
pub use zone::{ZoneMedia, ZoneState};
