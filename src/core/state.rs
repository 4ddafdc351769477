//! # Lifecycle state and its guarded transition function.
//!
//! [`WorkerState`] is the authoritative lifecycle value of a worker. It lives in a
//! [`StateCell`]: reads are a bare atomic load, every write goes through
//! [`StateCell::try_set`] inside a short spin section.
//!
//! ## Transition rules
//! ```text
//! try_set(requested):
//!   requested == current                 → Unchanged
//!   Disposing while Disposed             → Blocked
//!   Stopping  while Stopped              → Blocked
//!   Resetting while Initialized          → Blocked
//!   Ready   : signal set   && queue empty     → clear signal, commit
//!   Running : signal unset && queue non-empty → set signal,   commit
//!   otherwise                            → commit
//! ```
//! The first three rules block the whole transition. The `Ready`/`Running` rules
//! only gate the signal side effect; the transition itself is always committed.

use std::fmt;
use std::hint;
use std::sync::atomic::{AtomicBool, AtomicI8, Ordering};

use crate::core::queue::RequestQueue;
use crate::core::signal::ReadinessSignal;
use crate::error::{DISPOSED_MESSAGE, ENQUEUE_STATE_MESSAGE, LifecycleError};

/// Lifecycle state of a worker.
///
/// The integer values are stable and part of the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum WorkerState {
    /// Terminal; all resources released.
    Disposed = -2,
    /// Dispose in progress.
    Disposing = -1,
    /// Constructed or reset; waiting for `start`.
    Initialized = 0,
    /// Worker is idle and accepts requests.
    Ready = 1,
    /// Worker has requests to drain.
    Running = 2,
    /// Stop in progress.
    Stopping = 3,
    /// Stopped; needs a reset before reuse.
    Stopped = 4,
    /// Reset in progress.
    Resetting = 5,
}

impl WorkerState {
    /// All states, in numeric order.
    pub const ALL: [WorkerState; 8] = [
        WorkerState::Disposed,
        WorkerState::Disposing,
        WorkerState::Initialized,
        WorkerState::Ready,
        WorkerState::Running,
        WorkerState::Stopping,
        WorkerState::Stopped,
        WorkerState::Resetting,
    ];

    /// Returns `true` for `Disposing` and `Disposed`.
    #[inline]
    pub fn is_disposed(self) -> bool {
        matches!(self, WorkerState::Disposing | WorkerState::Disposed)
    }

    /// Returns `true` for the states in which requests are accepted.
    #[inline]
    pub fn accepts_requests(self) -> bool {
        matches!(self, WorkerState::Ready | WorkerState::Running)
    }

    #[inline]
    fn from_raw(raw: i8) -> Self {
        match raw {
            -2 => WorkerState::Disposed,
            -1 => WorkerState::Disposing,
            0 => WorkerState::Initialized,
            1 => WorkerState::Ready,
            2 => WorkerState::Running,
            3 => WorkerState::Stopping,
            4 => WorkerState::Stopped,
            _ => WorkerState::Resetting,
        }
    }
}

impl From<WorkerState> for i8 {
    fn from(state: WorkerState) -> Self {
        state as i8
    }
}

impl TryFrom<i8> for WorkerState {
    type Error = i8;

    fn try_from(raw: i8) -> Result<Self, Self::Error> {
        match raw {
            -2..=5 => Ok(WorkerState::from_raw(raw)),
            other => Err(other),
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of [`StateCell::try_set`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The state moved away from the contained previous state.
    Committed(WorkerState),
    /// The requested state was already current.
    Unchanged,
    /// A guard rejected the transition.
    Blocked,
}

impl Transition {
    /// Returns `true` if the state changed.
    #[inline]
    pub fn is_committed(self) -> bool {
        matches!(self, Transition::Committed(_))
    }
}

/// Atomically readable state with a spin-guarded writer section.
pub(crate) struct StateCell {
    value: AtomicI8,
    section: AtomicBool,
}

/// Releases the spin section on drop.
struct SectionGuard<'a>(&'a AtomicBool);

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl StateCell {
    pub(crate) fn new(initial: WorkerState) -> Self {
        Self {
            value: AtomicI8::new(initial.into()),
            section: AtomicBool::new(false),
        }
    }

    /// Bare read; may race with a concurrent writer.
    #[inline]
    pub(crate) fn get(&self) -> WorkerState {
        WorkerState::from_raw(self.value.load(Ordering::Acquire))
    }

    fn enter(&self) -> SectionGuard<'_> {
        while self
            .section
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.section.load(Ordering::Relaxed) {
                hint::spin_loop();
            }
        }
        SectionGuard(&self.section)
    }

    /// Requests a transition to `requested`, applying the signal side effects.
    pub(crate) fn try_set<R>(
        &self,
        requested: WorkerState,
        queue: &RequestQueue<R>,
        signal: &ReadinessSignal,
    ) -> Transition {
        let _section = self.enter();
        self.apply(requested, queue, signal)
    }

    /// Like [`try_set`](Self::try_set), but only while the worker owns the state.
    ///
    /// The worker loop moves between `Ready` and `Running`; it must not overwrite
    /// `Stopping`, `Resetting` or `Disposing` written by a lifecycle operation.
    pub(crate) fn try_set_active<R>(
        &self,
        requested: WorkerState,
        queue: &RequestQueue<R>,
        signal: &ReadinessSignal,
    ) -> Transition {
        let _section = self.enter();
        if !self.get().accepts_requests() {
            return Transition::Blocked;
        }
        self.apply(requested, queue, signal)
    }

    /// Checks the state, pushes `request` and moves to `Running`, all in one section.
    ///
    /// A shutdown that committed `Stopping`/`Resetting`/`Disposing` never sees a
    /// request pushed after it cleared the queue.
    pub(crate) fn enqueue<R>(
        &self,
        request: R,
        queue: &RequestQueue<R>,
        signal: &ReadinessSignal,
    ) -> Result<Transition, LifecycleError> {
        let _section = self.enter();
        let current = self.get();
        if current.is_disposed() {
            return Err(LifecycleError::disposed(DISPOSED_MESSAGE, Some("enqueue")));
        }
        if !current.accepts_requests() {
            return Err(LifecycleError::invalid_state(
                ENQUEUE_STATE_MESSAGE,
                Some("enqueue"),
            ));
        }
        queue.push(request);
        Ok(self.apply(WorkerState::Running, queue, signal))
    }

    /// Transition body; the caller holds the section.
    fn apply<R>(
        &self,
        requested: WorkerState,
        queue: &RequestQueue<R>,
        signal: &ReadinessSignal,
    ) -> Transition {
        let current = self.get();
        if requested == current {
            return Transition::Unchanged;
        }

        let blocked = matches!(
            (requested, current),
            (WorkerState::Disposing, WorkerState::Disposed)
                | (WorkerState::Stopping, WorkerState::Stopped)
                | (WorkerState::Resetting, WorkerState::Initialized)
        );
        if blocked {
            return Transition::Blocked;
        }

        match requested {
            WorkerState::Ready if signal.is_set() && queue.is_empty() => signal.reset(),
            WorkerState::Running if !signal.is_set() && !queue.is_empty() => signal.set(),
            _ => {}
        }

        self.value.store(requested.into(), Ordering::Release);
        Transition::Committed(current)
    }
}
