//! # SerialWorker: lifecycle controller and producer entry point.
//!
//! [`SerialWorker`] owns the shared state, the current [`Generation`] and the
//! coarse lifecycle section.
//!
//! ## Locking
//! ```text
//! enqueue()                   ── state cell spin section only (never awaits)
//! start / try_stop /
//! try_reset / dispose         ── coarse section (tokio Mutex<Generation>)
//!                                └─► state cell spin section for each transition
//! ```
//!
//! ## Lifecycle
//! ```text
//!             start                 enqueue          drained
//! Initialized ─────► Ready ◄──────────────────────► Running
//!      ▲               │                               │
//!      │               └──────────┬────────────────────┘
//!      │                try_stop  │  try_reset
//!      │             ┌────────────┴────────────┐
//!      │             ▼                         ▼
//!      │          Stopping ─► Stopped ─► Resetting ─► Initialized (new generation)
//!      │                                                   │
//!      └───────────────────────────────────────────────────┘
//!
//! any non-disposed state ── dispose ──► Disposing ─► Disposed
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::builder::SerialWorkerBuilder;
use crate::core::generation::Generation;
use crate::core::shared::Shared;
use crate::core::shutdown::shutdown;
use crate::core::state::WorkerState;
use crate::core::worker::WorkerLoop;
use crate::error::{DISPOSED_MESSAGE, LifecycleError, START_STATE_MESSAGE};
use crate::events::{Event, EventKind};
use crate::handlers::HandlerRef;

/// A single dedicated worker that processes requests of type `R` one at a time, in
/// enqueue order.
///
/// ### Responsibilities
/// - **Producers**: [`enqueue`](Self::enqueue) from any number of threads/tasks
/// - **Lifecycle**: [`start`](Self::start), [`try_stop`](Self::try_stop),
///   [`try_reset`](Self::try_reset), [`dispose`](Self::dispose)
/// - **Escalation**: a worker that ignores cancellation is interrupted after
///   [`Config::join_timeout`]
///
/// Call [`dispose`](Self::dispose) when done. Dropping an undisposed worker tears it
/// down synchronously, aborting the worker task instead of joining it.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use tokio_util::sync::CancellationToken;
/// use serialvisor::{HandlerFn, SerialWorker, WorkerState};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), serialvisor::LifecycleError> {
/// let total = Arc::new(AtomicU64::new(0));
/// let sink = total.clone();
///
/// let worker = SerialWorker::<u64>::new();
/// worker
///     .start(HandlerFn::arc(move |n: u64, _ctx: CancellationToken| {
///         let sink = sink.clone();
///         async move {
///             sink.fetch_add(n * 2, Ordering::SeqCst);
///             Ok(())
///         }
///     }))
///     .await?;
///
/// worker.enqueue(1)?;
/// worker.enqueue(2)?;
///
/// assert!(worker.try_stop().await?);
/// assert_eq!(worker.state(), WorkerState::Stopped);
/// worker.dispose().await;
/// # Ok(())
/// # }
/// ```
pub struct SerialWorker<R: Send + 'static> {
    cfg: Config,
    shared: Arc<Shared<R>>,
    lifecycle: Mutex<Generation>,
    /// Stops the subscriber fan-out listener when the worker is dropped.
    listener: CancellationToken,
}

impl<R: Send + 'static> SerialWorker<R> {
    /// Creates a worker with the default [`Config`] and no subscribers.
    ///
    /// Does not require a running tokio runtime; `start` does.
    pub fn new() -> Self {
        Self::builder(Config::default()).build()
    }

    /// Returns a builder for configuring subscribers and timeouts.
    pub fn builder(cfg: Config) -> SerialWorkerBuilder<R> {
        SerialWorkerBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        cfg: Config,
        shared: Arc<Shared<R>>,
        generation: Generation,
        listener: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            shared,
            lifecycle: Mutex::new(generation),
            listener,
        }
    }

    /// Current lifecycle state (bare read).
    #[inline]
    pub fn state(&self) -> WorkerState {
        self.shared.state()
    }

    /// Number of requests waiting to be handled.
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    /// Id of the current generation; changes on every successful reset.
    pub fn generation(&self) -> u64 {
        self.shared.generation()
    }

    /// Worker configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Receives every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Submits a request for processing.
    ///
    /// Never waits on lifecycle operations.
    ///
    /// # Errors
    /// - [`LifecycleError::Disposed`] while `Disposing`/`Disposed`
    /// - [`LifecycleError::InvalidState`] in any state other than `Ready`/`Running`
    pub fn enqueue(&self, request: R) -> Result<(), LifecycleError> {
        self.shared.enqueue(request)
    }

    /// Binds `handler` and launches the current generation's worker.
    ///
    /// # Errors
    /// - [`LifecycleError::Disposed`] while `Disposing`/`Disposed`
    /// - [`LifecycleError::InvalidState`] unless `Initialized`
    pub async fn start(&self, handler: HandlerRef<R>) -> Result<(), LifecycleError> {
        let mut generation = self.lifecycle.lock().await;
        self.ensure_not_disposed("start")?;
        if self.state() != WorkerState::Initialized {
            return Err(LifecycleError::invalid_state(
                START_STATE_MESSAGE,
                Some("start"),
            ));
        }

        let worker = WorkerLoop::new(Arc::clone(&self.shared), handler, &generation);
        generation.launch(tokio::spawn(worker.run()));
        self.shared.try_set(WorkerState::Ready);
        Ok(())
    }

    /// Stops the worker; the instance stays `Stopped` until reset.
    ///
    /// Returns `false` if it was already stopped. Pending requests are discarded.
    ///
    /// # Errors
    /// [`LifecycleError::Disposed`] while `Disposing`/`Disposed`.
    pub async fn try_stop(&self) -> Result<bool, LifecycleError> {
        let mut generation = self.lifecycle.lock().await;
        self.ensure_not_disposed("try_stop")?;
        if !self.shared.try_set(WorkerState::Stopping) {
            return Ok(false);
        }

        shutdown(&self.shared, &mut generation, self.cfg.join_timeout).await;
        self.shared.try_set(WorkerState::Stopped);
        Ok(true)
    }

    /// Stops the worker if needed and returns to `Initialized` with a new generation.
    ///
    /// Returns `false` if it was already `Initialized`. The next [`start`](Self::start)
    /// may bind a different handler.
    ///
    /// # Errors
    /// [`LifecycleError::Disposed`] while `Disposing`/`Disposed`.
    pub async fn try_reset(&self) -> Result<bool, LifecycleError> {
        let mut generation = self.lifecycle.lock().await;
        self.ensure_not_disposed("try_reset")?;
        if !self.shared.try_set(WorkerState::Resetting) {
            return Ok(false);
        }

        shutdown(&self.shared, &mut generation, self.cfg.join_timeout).await;
        debug_assert!(
            generation.is_terminated(),
            "previous generation must be joined before reset"
        );

        *generation = Generation::new();
        self.shared.set_generation(generation.id());
        self.shared.try_set(WorkerState::Initialized);
        self.shared
            .publish(Event::new(EventKind::ResetOccurred).with_generation(generation.id()));
        Ok(true)
    }

    /// Tears the worker down for good. Idempotent; concurrent calls tear down once.
    pub async fn dispose(&self) {
        let mut generation = self.lifecycle.lock().await;
        if !self.shared.try_set(WorkerState::Disposing) {
            return;
        }

        shutdown(&self.shared, &mut generation, self.cfg.join_timeout).await;
        self.shared.signal.close();
        self.shared.try_set(WorkerState::Disposed);
    }

    fn ensure_not_disposed(&self, field: &'static str) -> Result<(), LifecycleError> {
        if self.state().is_disposed() {
            return Err(LifecycleError::disposed(DISPOSED_MESSAGE, Some(field)));
        }
        Ok(())
    }
}

impl<R: Send + 'static> Default for SerialWorker<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Send + 'static> Drop for SerialWorker<R> {
    fn drop(&mut self) {
        // A `Disposing` state left by an abandoned `dispose` is finished here.
        if self.shared.state() != WorkerState::Disposed {
            self.shared.try_set(WorkerState::Disposing);
            self.shared.queue.clear();
            self.lifecycle.get_mut().abort();
            self.shared.signal.close();
            self.shared.try_set(WorkerState::Disposed);
        }
        self.listener.cancel();
    }
}

impl<R: Send + 'static> std::fmt::Debug for SerialWorker<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialWorker")
            .field("state", &self.state())
            .field("pending", &self.pending())
            .field("generation", &self.generation())
            .field("cfg", &self.cfg)
            .finish()
    }
}
