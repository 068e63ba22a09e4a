//! Versioned copy-on-write snapshot storage
//!
//! This module provides the core storage primitives:
//! - `Versioned<S>`: an immutable snapshot paired with its update counter
//! - `SnapshotStore<S>`: the single slot holding the latest `Versioned<S>`

use std::ops::Deref;
use std::sync::{Arc, PoisonError, RwLock};

use crate::ready::ReadySignal;

// ============================================================================
// Versioned<S> - an immutable snapshot and the counter it was published at
// ============================================================================

/// A snapshot together with the update counter it was published under
///
/// Cloning is cheap: the value is shared behind an `Arc`. Version `0` is the
/// initial value supplied at construction; every `replace()` produces the
/// next version.
pub struct Versioned<S> {
    version: u64,
    value: Arc<S>,
}

impl<S> Versioned<S> {
    /// Update counter this snapshot was published at
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Borrow the snapshot
    pub fn value(&self) -> &S {
        &self.value
    }

    /// Shared handle to the snapshot, independent of this wrapper
    pub fn shared(&self) -> Arc<S> {
        Arc::clone(&self.value)
    }

    /// Whether this is still the value supplied at construction
    pub fn is_initial(&self) -> bool {
        self.version == 0
    }
}

impl<S> Clone for Versioned<S> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            value: Arc::clone(&self.value),
        }
    }
}

impl<S> Deref for Versioned<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.value
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Versioned<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Versioned")
            .field("version", &self.version)
            .field("value", &self.value)
            .finish()
    }
}

// ============================================================================
// SnapshotStore<S> - latest snapshot slot with readiness gate
// ============================================================================

/// Holds the latest snapshot of some state and how many times it was replaced
///
/// Writes swap the whole snapshot under a short write lock; reads clone the
/// `Arc` under a short read lock. A reader therefore gets either the previous
/// or the next snapshot, never a mix, and the version it sees always matches
/// the value.
///
/// The readiness gate opens while the first replacement still holds the
/// write lock, so any reader that observes version `>= 1` also observes the
/// gate as set.
///
/// # Example
///
/// ```rust
/// use state_store::SnapshotStore;
///
/// let store = SnapshotStore::new(0u32);
/// assert_eq!(store.version(), 0);
///
/// store.replace(10);
/// store.replace(20);
///
/// let current = store.read();
/// assert_eq!(current.version(), 2);
/// assert_eq!(*current, 20);
/// assert!(store.is_ready());
/// ```
pub struct SnapshotStore<S> {
    current: RwLock<Versioned<S>>,
    ready: ReadySignal,
}

impl<S> SnapshotStore<S> {
    /// Create a store holding `initial` at version 0
    pub fn new(initial: S) -> Self {
        Self {
            current: RwLock::new(Versioned {
                version: 0,
                value: Arc::new(initial),
            }),
            ready: ReadySignal::new(),
        }
    }

    /// Current snapshot, including the initial one
    pub fn read(&self) -> Versioned<S> {
        // Writers only assign whole values, so a poisoned lock still holds
        // a consistent snapshot
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current snapshot, or `None` until the first replacement
    pub fn read_ready(&self) -> Option<Versioned<S>> {
        let current = self.read();
        if current.is_initial() {
            None
        } else {
            Some(current)
        }
    }

    /// Number of replacements so far
    pub fn version(&self) -> u64 {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    /// Publish a new snapshot, returning its version
    ///
    /// Intended for the single background writer.
    pub fn replace(&self, value: S) -> u64 {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let version = current.version + 1;
        let previous = std::mem::replace(
            &mut *current,
            Versioned {
                version,
                value: Arc::new(value),
            },
        );

        if version == 1 {
            self.ready.set();
        }
        drop(current);

        // Release the old snapshot outside the lock
        drop(previous);
        version
    }

    /// Readiness gate released by the first replacement
    pub fn ready(&self) -> &ReadySignal {
        &self.ready
    }

    /// Whether the first replacement has happened
    pub fn is_ready(&self) -> bool {
        self.ready.is_set()
    }
}

impl<S: Default> Default for SnapshotStore<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> std::fmt::Debug for SnapshotStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("version", &self.version())
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_initial_snapshot_is_version_zero() {
        let store = SnapshotStore::new(HashMap::<String, u8>::new());

        let current = store.read();
        assert!(current.is_initial());
        assert!(current.is_empty());
        assert!(store.read_ready().is_none());
        assert!(!store.is_ready());
    }

    #[test]
    fn test_replace_increments_version() {
        let store = SnapshotStore::new(0u8);

        assert_eq!(store.replace(1), 1);
        assert_eq!(store.replace(2), 2);
        assert_eq!(store.replace(3), 3);
        assert_eq!(store.version(), 3);
        assert_eq!(*store.read(), 3);
    }

    #[test]
    fn test_first_replace_opens_gate() {
        let store = SnapshotStore::new(String::new());
        store.replace("zone".to_string());

        assert!(store.is_ready());
        let ready = store.read_ready().expect("published");
        assert_eq!(ready.value(), "zone");
    }

    #[test]
    fn test_old_readers_keep_their_snapshot() {
        let store = SnapshotStore::new(vec![1, 2, 3]);
        let before = store.read();

        store.replace(vec![4]);

        // The earlier handle is unaffected by the swap
        assert_eq!(*before, vec![1, 2, 3]);
        assert_eq!(before.version(), 0);
        assert_eq!(*store.read(), vec![4]);
    }

    #[test]
    fn test_shared_handle_outlives_wrapper() {
        let store = SnapshotStore::new(5u32);
        store.replace(6);
        let shared = store.read().shared();
        store.replace(7);
        assert_eq!(*shared, 6);
    }

    #[test]
    fn test_default_uses_default_value() {
        let store: SnapshotStore<Vec<u8>> = SnapshotStore::default();
        assert!(store.read().is_empty());
        assert_eq!(store.version(), 0);
    }
}
