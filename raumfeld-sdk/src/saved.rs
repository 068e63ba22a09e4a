//! Remember what a zone plays and bring it back later

use serde::{Deserialize, Serialize};

use raumfeld_state::StateError;

use crate::error::Result;
use crate::host::RaumfeldHost;

/// What `save_zone` captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedZone {
    pub uri: String,
    pub metadata: String,
    /// Absolute position, `H:MM:SS`
    pub abs_time: String,
}

/// Rooms in any order name the same saved zone
fn zone_key<S: AsRef<str>>(rooms: &[S]) -> Vec<String> {
    let mut key: Vec<String> = rooms.iter().map(|r| r.as_ref().to_string()).collect();
    key.sort();
    key
}

impl RaumfeldHost {
    /// Store the zone's URI, metadata and position
    ///
    /// An existing entry is kept unless `replace` is set. Returns whether
    /// anything was stored.
    pub fn save_zone<S: AsRef<str>>(&self, rooms: &[S], replace: bool) -> Result<bool> {
        let key = zone_key(rooms);
        if !replace && self.saved_zones.lock().contains_key(&key) {
            return Ok(false);
        }

        let media = self.media_info(rooms)?;
        let position = self.position_info(rooms)?;
        let saved = SavedZone {
            uri: media.current_uri,
            metadata: media.current_uri_metadata,
            abs_time: position.abs_time,
        };

        tracing::debug!(rooms = ?key, uri = %saved.uri, "Saved zone");
        self.saved_zones.lock().insert(key, saved);
        Ok(true)
    }

    /// Recreate the zone, play the saved URI and seek back
    ///
    /// The entry is removed afterwards when `delete` is set.
    pub fn restore_zone<S: AsRef<str>>(&self, rooms: &[S], delete: bool) -> Result<()> {
        let key = zone_key(rooms);
        let saved = self
            .saved_zones
            .lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| StateError::NoSavedZone(key.clone()))?;

        self.create_zone(rooms)?;
        self.set_av_transport_uri(rooms, &saved.uri, Some(&saved.metadata))?;
        self.seek(rooms, &saved.abs_time)?;

        if delete {
            self.saved_zones.lock().remove(&key);
        }
        Ok(())
    }

    pub fn saved_zone<S: AsRef<str>>(&self, rooms: &[S]) -> Option<SavedZone> {
        self.saved_zones.lock().get(&zone_key(rooms)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_key_ignores_order() {
        assert_eq!(zone_key(&["Kitchen", "Bath"]), zone_key(&["Bath", "Kitchen"]));
        assert_ne!(zone_key(&["Kitchen"]), zone_key(&["Kitchen", "Bath"]));
    }

    proptest::proptest! {
        #[test]
        fn prop_zone_key_is_permutation_invariant(mut rooms in proptest::collection::vec("[A-Za-z ]{1,12}", 1..6)) {
            let key = zone_key(&rooms);
            rooms.reverse();
            proptest::prop_assert_eq!(zone_key(&rooms), key);
        }
    }
}
