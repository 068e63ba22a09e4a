//! One-shot readiness gate
//!
//! `ReadySignal` starts closed and opens exactly once. Blocking callers wait
//! on a condition variable; async callers wait on a `tokio::sync::watch`
//! channel. Both paths observe the same gate, so a waiter arriving after
//! `set()` returns without suspending.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

/// A gate that is released once and never closes again
pub struct ReadySignal {
    gate: Mutex<bool>,
    cond: Condvar,
    notify: watch::Sender<bool>,
}

impl ReadySignal {
    /// Create a closed gate
    pub fn new() -> Self {
        let (notify, _) = watch::channel(false);
        Self {
            gate: Mutex::new(false),
            cond: Condvar::new(),
            notify,
        }
    }

    /// Open the gate, waking every waiter
    ///
    /// Returns `true` only for the call that actually opened it; later calls
    /// are no-ops.
    pub fn set(&self) -> bool {
        let mut gate = self.lock_gate();
        if *gate {
            return false;
        }
        *gate = true;
        // Publish to async waiters while still holding the gate so both
        // views flip together
        self.notify.send_replace(true);
        self.cond.notify_all();
        true
    }

    /// Whether the gate has been opened
    pub fn is_set(&self) -> bool {
        *self.lock_gate()
    }

    /// Block the current thread until the gate opens
    pub fn wait(&self) {
        let mut gate = self.lock_gate();
        while !*gate {
            gate = self.cond.wait(gate).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block the current thread until the gate opens or `timeout` elapses
    ///
    /// Returns whether the gate is open.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let gate = self.lock_gate();
        let (gate, _) = self
            .cond
            .wait_timeout_while(gate, timeout, |ready| !*ready)
            .unwrap_or_else(PoisonError::into_inner);
        *gate
    }

    /// Wait asynchronously until the gate opens
    pub async fn wait_async(&self) {
        let mut rx = self.notify.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            // The sender lives in `self`, so the channel outlives this borrow
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    fn lock_gate(&self) -> MutexGuard<'_, bool> {
        // The guarded bool cannot be left half-written, so poisoning is benign
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReadySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadySignal")
            .field("is_set", &self.is_set())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_set_is_idempotent() {
        let signal = ReadySignal::new();
        assert!(!signal.is_set());
        assert!(signal.set());
        assert!(!signal.set());
        assert!(signal.is_set());
    }

    #[test]
    fn test_wait_timeout_expires_when_unset() {
        let signal = ReadySignal::new();
        let started = Instant::now();
        assert!(!signal.wait_timeout(Duration::from_millis(50)));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_wait_after_set_returns_immediately() {
        let signal = ReadySignal::new();
        signal.set();

        let started = Instant::now();
        signal.wait();
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_blocked_waiters_are_released() {
        let signal = Arc::new(ReadySignal::new());

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let signal = Arc::clone(&signal);
                thread::spawn(move || signal.wait_timeout(Duration::from_secs(5)))
            })
            .collect();

        thread::sleep(Duration::from_millis(30));
        signal.set();

        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
    }

    #[tokio::test]
    async fn test_async_wait_released_by_set() {
        let signal = Arc::new(ReadySignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.wait_async().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        signal.set();
        tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter released")
            .unwrap();
    }

    #[tokio::test]
    async fn test_async_wait_after_set_does_not_suspend() {
        let signal = ReadySignal::new();
        signal.set();
        tokio::time::timeout(Duration::from_millis(50), signal.wait_async())
            .await
            .expect("already set");
    }
}
