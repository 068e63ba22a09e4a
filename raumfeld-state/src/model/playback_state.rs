//! Playback state enumeration

use raumfeld_api::operations::TransportState;
use serde::{Deserialize, Serialize};

/// Current playback state of a zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Currently playing audio
    Playing,
    /// Playback is paused
    Paused,
    /// Playback is stopped
    #[default]
    Stopped,
    /// Transitioning between states
    Transitioning,
    /// Nothing is loaded on the renderer
    NoMedia,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

impl From<TransportState> for PlaybackState {
    fn from(state: TransportState) -> Self {
        match state {
            TransportState::Playing => PlaybackState::Playing,
            TransportState::Paused => PlaybackState::Paused,
            TransportState::Stopped => PlaybackState::Stopped,
            TransportState::Transitioning => PlaybackState::Transitioning,
            TransportState::NoMediaPresent => PlaybackState::NoMedia,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_state() {
        assert_eq!(PlaybackState::from(TransportState::Playing), PlaybackState::Playing);
        assert_eq!(PlaybackState::from(TransportState::Paused), PlaybackState::Paused);
        assert_eq!(
            PlaybackState::from(TransportState::NoMediaPresent),
            PlaybackState::NoMedia
        );
    }

    #[test]
    fn test_default_is_stopped() {
        assert_eq!(PlaybackState::default(), PlaybackState::Stopped);
        assert!(!PlaybackState::default().is_playing());
    }
}
