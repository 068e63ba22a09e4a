//! Runs the updater on a dedicated thread or as a tokio task
//!
//! Both workers drive the same [`Updater`]; they differ only in how they
//! fetch and how they sleep.
//!
//! ```text
//! Idle ──start()──> Running ──stop()──> Stopping ──worker exits──> Stopped
//!   └──────────────────stop()───────────────────────────────────────┘
//! ```
//!
//! A thread worker polls an `mpsc` stop channel after each fetch and sleeps
//! with `recv_timeout`, so a stop is seen within the current sleep. A task
//! worker races a `oneshot` cancellation against the fetch and the sleep.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use parking_lot::Mutex;
use state_store::SnapshotStore;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::change::{ChangeNotifier, ChangeStream};
use crate::config::UpdaterConfig;
use crate::error::{Result, StateError};
use crate::snapshot::Snapshot;
use crate::source::{AsyncZoneSource, ZoneSource};
use crate::updater::Updater;

/// Name given to the updater thread
pub const THREAD_NAME: &str = "raumfeld-updater";

/// Lifecycle of an [`UpdateScheduler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    /// Stop requested, worker not yet exited
    Stopping,
    Stopped,
}

enum Worker {
    Thread(Box<dyn ZoneSource>),
    Task {
        source: Box<dyn AsyncZoneSource>,
        handle: Handle,
    },
}

enum Running {
    Thread {
        stop_tx: mpsc::Sender<()>,
        join: thread::JoinHandle<()>,
    },
    Task {
        cancel: oneshot::Sender<()>,
        join: tokio::task::JoinHandle<()>,
    },
}

struct Inner {
    state: SchedulerState,
    pending: Option<Worker>,
    running: Option<Running>,
}

/// Owns the background worker that keeps a [`SnapshotStore`] fresh
pub struct UpdateScheduler {
    store: Arc<SnapshotStore<Snapshot>>,
    config: UpdaterConfig,
    cooperative: bool,
    notifier: ChangeNotifier,
    inner: Mutex<Inner>,
    exited: Arc<AtomicBool>,
}

impl UpdateScheduler {
    /// Worker on a dedicated OS thread with blocking fetches
    pub fn threaded(
        store: Arc<SnapshotStore<Snapshot>>,
        config: UpdaterConfig,
        source: impl ZoneSource,
    ) -> Self {
        Self::with_worker(store, config, Worker::Thread(Box::new(source)), false)
    }

    /// Worker as a task on `handle` with cooperative fetches
    pub fn cooperative(
        store: Arc<SnapshotStore<Snapshot>>,
        config: UpdaterConfig,
        source: impl AsyncZoneSource,
        handle: Handle,
    ) -> Self {
        let worker = Worker::Task {
            source: Box::new(source),
            handle,
        };
        Self::with_worker(store, config, worker, true)
    }

    fn with_worker(
        store: Arc<SnapshotStore<Snapshot>>,
        config: UpdaterConfig,
        worker: Worker,
        cooperative: bool,
    ) -> Self {
        Self {
            store,
            config,
            cooperative,
            notifier: ChangeNotifier::new(),
            inner: Mutex::new(Inner {
                state: SchedulerState::Idle,
                pending: Some(worker),
                running: None,
            }),
            exited: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cooperative(&self) -> bool {
        self.cooperative
    }

    pub fn store(&self) -> &Arc<SnapshotStore<Snapshot>> {
        &self.store
    }

    /// Change events of every snapshot published after this call
    ///
    /// Subscribe before [`UpdateScheduler::start`] to also see the initial
    /// event. The stream ends once the scheduler and its worker are gone.
    pub fn subscribe(&self) -> ChangeStream {
        self.notifier.subscribe()
    }

    pub fn state(&self) -> SchedulerState {
        let state = self.inner.lock().state;
        if state == SchedulerState::Stopping && self.exited.load(Ordering::Acquire) {
            SchedulerState::Stopped
        } else {
            state
        }
    }

    /// Spawn the worker. Calling it again while running is a no-op.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            SchedulerState::Running => return Ok(()),
            SchedulerState::Stopping | SchedulerState::Stopped => {
                return Err(StateError::AlreadyStopped)
            }
            SchedulerState::Idle => {}
        }

        let worker = inner.pending.take().ok_or(StateError::AlreadyStopped)?;
        let updater = Updater::with_notifier(
            Arc::clone(&self.store),
            self.config.clone(),
            self.notifier.clone(),
        );
        let exited = Arc::clone(&self.exited);

        let running = match worker {
            Worker::Thread(source) => {
                let (stop_tx, stop_rx) = mpsc::channel();
                let spawned = thread::Builder::new()
                    .name(THREAD_NAME.to_string())
                    .spawn(move || run_thread(source, updater, stop_rx, exited));
                match spawned {
                    Ok(join) => Running::Thread { stop_tx, join },
                    Err(e) => {
                        inner.state = SchedulerState::Stopped;
                        return Err(StateError::Spawn(e.to_string()));
                    }
                }
            }
            Worker::Task { source, handle } => {
                let (cancel, cancel_rx) = oneshot::channel();
                let join = handle.spawn(run_task(source, updater, cancel_rx, exited));
                Running::Task { cancel, join }
            }
        };

        inner.running = Some(running);
        inner.state = SchedulerState::Running;
        tracing::info!(cooperative = self.cooperative, "Updater started");
        Ok(())
    }

    /// Request the worker to stop
    ///
    /// For a thread worker the thread has been joined when this returns. For
    /// a task worker, await the returned [`StopCompletion`] to know when the
    /// task has exited.
    pub fn stop(&self) -> StopCompletion {
        let running = {
            let mut inner = self.inner.lock();
            match inner.state {
                SchedulerState::Idle => {
                    inner.pending = None;
                    inner.state = SchedulerState::Stopped;
                    self.exited.store(true, Ordering::Release);
                    return StopCompletion::done();
                }
                SchedulerState::Stopping | SchedulerState::Stopped => {
                    return StopCompletion::done();
                }
                SchedulerState::Running => {
                    inner.state = SchedulerState::Stopping;
                    inner.running.take()
                }
            }
        };

        match running {
            Some(Running::Thread { stop_tx, join }) => {
                let _ = stop_tx.send(());
                // Joining from the worker itself would deadlock
                if join.thread().id() != thread::current().id() && join.join().is_err() {
                    tracing::warn!("Updater thread panicked");
                }
                self.inner.lock().state = SchedulerState::Stopped;
                StopCompletion::done()
            }
            Some(Running::Task { cancel, join }) => {
                let _ = cancel.send(());
                StopCompletion { task: Some(join) }
            }
            None => StopCompletion::done(),
        }
    }
}

impl Drop for UpdateScheduler {
    fn drop(&mut self) {
        match self.inner.get_mut().running.take() {
            Some(Running::Thread { stop_tx, .. }) => {
                let _ = stop_tx.send(());
            }
            Some(Running::Task { cancel, .. }) => {
                let _ = cancel.send(());
            }
            None => {}
        }
    }
}

impl std::fmt::Debug for UpdateScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateScheduler")
            .field("state", &self.state())
            .field("cooperative", &self.cooperative)
            .finish()
    }
}

/// Resolves once the worker has exited
///
/// Already complete for thread workers and for schedulers that never ran.
#[derive(Debug)]
pub struct StopCompletion {
    task: Option<tokio::task::JoinHandle<()>>,
}

impl StopCompletion {
    fn done() -> Self {
        Self { task: None }
    }

    pub fn is_complete(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }
}

impl IntoFuture for StopCompletion {
    type Output = ();
    type IntoFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            if let Some(task) = self.task {
                if let Err(e) = task.await {
                    if e.is_panic() {
                        tracing::warn!("Updater task panicked");
                    }
                }
            }
        })
    }
}

/// Marks the worker as exited however it leaves its loop
struct ExitGuard(Arc<AtomicBool>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

fn run_thread(
    mut source: Box<dyn ZoneSource>,
    mut updater: Updater,
    stop_rx: mpsc::Receiver<()>,
    exited: Arc<AtomicBool>,
) {
    let _guard = ExitGuard(exited);
    tracing::debug!("Updater thread running");

    loop {
        let result = source.fetch();
        match stop_rx.try_recv() {
            Err(mpsc::TryRecvError::Empty) => {}
            _ => break,
        }

        let delay = updater.on_fetch(result);
        match stop_rx.recv_timeout(delay) {
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            _ => break,
        }
    }

    tracing::info!("Updater thread stopped");
}

async fn run_task(
    mut source: Box<dyn AsyncZoneSource>,
    mut updater: Updater,
    mut cancel: oneshot::Receiver<()>,
    exited: Arc<AtomicBool>,
) {
    let _guard = ExitGuard(exited);
    tracing::debug!("Updater task running");

    loop {
        let result = tokio::select! {
            _ = &mut cancel => break,
            result = source.fetch() => result,
        };

        let delay = updater.on_fetch(result);
        tokio::select! {
            _ = &mut cancel => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    tracing::info!("Updater task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::time::Duration;

    fn store() -> Arc<SnapshotStore<Snapshot>> {
        Arc::new(SnapshotStore::new(Snapshot::default()))
    }

    fn fast_config() -> UpdaterConfig {
        UpdaterConfig::new()
            .with_interval(Duration::from_millis(20))
            .with_backoff(Duration::from_millis(10), Duration::from_millis(40))
    }

    #[test]
    fn test_idle_stop_and_restart() {
        let scheduler = UpdateScheduler::threaded(store(), fast_config(), || {
            Ok::<_, FetchError>(Snapshot::default())
        });
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        let completion = scheduler.stop();
        assert!(completion.is_complete());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(matches!(scheduler.start(), Err(StateError::AlreadyStopped)));
    }

    #[test]
    fn test_start_is_idempotent() {
        let store = store();
        let scheduler = UpdateScheduler::threaded(store.clone(), fast_config(), || {
            Ok::<_, FetchError>(Snapshot::default())
        });
        scheduler.start().unwrap();
        scheduler.start().unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Running);

        assert!(store.ready().wait_timeout(Duration::from_secs(2)));
        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }
}
