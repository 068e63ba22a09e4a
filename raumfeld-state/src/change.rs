//! Update notifications
//!
//! Every published snapshot is compared with the one it replaces. When
//! anything differs, subscribers receive an [`UpdateEvent`] naming which
//! parts of the system changed, so an application can push state instead of
//! polling [`SnapshotStore::version`](state_store::SnapshotStore::version).
//!
//! ```rust,ignore
//! let mut changes = scheduler.subscribe();
//! scheduler.start()?;
//! while let Some(event) = changes.blocking_next() {
//!     if event.contains(ChangeKind::ZoneConfig) {
//!         println!("zones are now {:?}", store.read().zones());
//!     }
//! }
//! ```

use serde::Serialize;
use tokio::sync::broadcast;

use crate::model::PlaybackState;
use crate::snapshot::Snapshot;

/// Events buffered per subscriber before the oldest are dropped
pub const CHANNEL_CAPACITY: usize = 64;

/// Part of the system that differs between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChangeKind {
    /// Host name or host room
    HostInfo,
    /// Zone membership, room names or power states
    ZoneConfig,
    /// Device list, locations or the media server
    Devices,
    /// Firmware update flag
    SystemState,
    /// What a zone plays or its transport state
    ZoneMedia,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 5] = [
        ChangeKind::HostInfo,
        ChangeKind::ZoneConfig,
        ChangeKind::Devices,
        ChangeKind::SystemState,
        ChangeKind::ZoneMedia,
    ];

    /// Kinds that differ from `old` to `new`, in [`ChangeKind::ALL`] order
    pub fn between(old: &Snapshot, new: &Snapshot) -> Vec<ChangeKind> {
        let zone_layout_differs = old.rooms != new.rooms
            || old.zones.len() != new.zones.len()
            || old
                .zones
                .iter()
                .zip(new.zones.iter())
                .any(|((old_id, a), (new_id, b))| old_id != new_id || a.rooms != b.rooms);

        // A zone that appears with something loaded also counts as media
        let media_differs = new.zones.iter().any(|(id, b)| match old.zones.get(id) {
            Some(a) => a.media != b.media || a.playback != b.playback,
            None => b.media.is_some() || b.playback != PlaybackState::default(),
        });

        let mut changes = Vec::new();
        if old.host != new.host {
            changes.push(ChangeKind::HostInfo);
        }
        if zone_layout_differs {
            changes.push(ChangeKind::ZoneConfig);
        }
        if old.devices != new.devices || old.media_server != new.media_server {
            changes.push(ChangeKind::Devices);
        }
        if old.update_available != new.update_available {
            changes.push(ChangeKind::SystemState);
        }
        if media_differs {
            changes.push(ChangeKind::ZoneMedia);
        }
        changes
    }
}

/// One published snapshot and what changed in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateEvent {
    /// Store version the change was published at
    pub version: u64,
    pub changes: Vec<ChangeKind>,
}

impl UpdateEvent {
    /// The first publish reports every kind
    pub fn is_initial(&self) -> bool {
        self.version == 1
    }

    pub fn contains(&self, kind: ChangeKind) -> bool {
        self.changes.contains(&kind)
    }
}

/// Sending half shared by the updater and whoever hands out subscriptions
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<UpdateEvent>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Events published from now on
    pub fn subscribe(&self) -> ChangeStream {
        ChangeStream {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Deliver `event` to current subscribers; returns how many got it
    pub fn publish(&self, event: UpdateEvent) -> usize {
        // An error only means nobody is subscribed
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of [`ChangeNotifier::subscribe`]
///
/// A subscriber that falls more than [`CHANNEL_CAPACITY`] events behind
/// skips the oldest ones; the current snapshot is always in the store.
#[derive(Debug)]
pub struct ChangeStream {
    receiver: broadcast::Receiver<UpdateEvent>,
}

impl ChangeStream {
    /// Next event, or `None` once the updater is gone
    pub async fn next(&mut self) -> Option<UpdateEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Change subscriber lagged");
                }
            }
        }
    }

    /// Next event without waiting
    pub fn try_next(&mut self) -> Option<UpdateEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Change subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }

    /// Blocking variant of [`ChangeStream::next`]
    ///
    /// Panics when called from within an async runtime, like
    /// `tokio::sync::broadcast::Receiver::blocking_recv`.
    pub fn blocking_next(&mut self) -> Option<UpdateEvent> {
        loop {
            match self.receiver.blocking_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Change subscriber lagged");
                }
            }
        }
    }
}
