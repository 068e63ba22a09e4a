//! Fetch, publish, signal, suspend
//!
//! [`Updater::on_fetch`] is the whole refresh algorithm. The thread and task
//! workers in [`crate::scheduler`] call it after every fetch and then
//! suspend for the delay it returns.

use std::sync::Arc;
use std::time::Duration;

use state_store::SnapshotStore;

use crate::change::{ChangeKind, ChangeNotifier, ChangeStream, UpdateEvent};
use crate::config::UpdaterConfig;
use crate::error::FetchError;
use crate::snapshot::Snapshot;

/// Publishes fetch results into the shared store
#[derive(Debug)]
pub struct Updater {
    store: Arc<SnapshotStore<Snapshot>>,
    config: UpdaterConfig,
    notifier: ChangeNotifier,
    failures: u32,
}

impl Updater {
    pub fn new(store: Arc<SnapshotStore<Snapshot>>, config: UpdaterConfig) -> Self {
        Self::with_notifier(store, config, ChangeNotifier::new())
    }

    /// Publish change events through an existing notifier
    pub fn with_notifier(
        store: Arc<SnapshotStore<Snapshot>>,
        config: UpdaterConfig,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            store,
            config,
            notifier,
            failures: 0,
        }
    }

    pub fn subscribe(&self) -> ChangeStream {
        self.notifier.subscribe()
    }

    /// Consecutive failed fetches since the last success
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Apply one fetch result and return how long to suspend
    ///
    /// A success replaces the snapshot, which also releases the ready gate
    /// on the first one, and notifies subscribers of what changed. A
    /// failure leaves the store untouched.
    pub fn on_fetch(&mut self, result: Result<Snapshot, FetchError>) -> Duration {
        match result {
            Ok(snapshot) => {
                // Only this updater replaces, so the previous value cannot move
                let previous = self.store.read();
                let changes = if previous.is_initial() {
                    ChangeKind::ALL.to_vec()
                } else {
                    ChangeKind::between(&previous, &snapshot)
                };
                drop(previous);

                let version = self.store.replace(snapshot);
                if version == 1 {
                    tracing::info!("Initial state received");
                } else {
                    tracing::debug!(version, ?changes, "State refreshed");
                }
                if !changes.is_empty() {
                    self.notifier.publish(UpdateEvent { version, changes });
                }
                if self.failures > 0 {
                    tracing::info!(failures = self.failures, "Updates recovered");
                }
                self.failures = 0;
                self.config.interval
            }
            Err(error) => {
                self.failures = self.failures.saturating_add(1);
                let delay = self.config.backoff(self.failures);
                tracing::warn!(
                    failures = self.failures,
                    retry_in = ?delay,
                    "State update failed: {}",
                    error
                );
                delay
            }
        }
    }
}
