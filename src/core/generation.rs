//! # Generation: one worker incarnation.
//!
//! A [`Generation`] pairs the worker task with the tokens that stop it. It is
//! created empty, launched once by `start`, joined by the shutdown supervisor and
//! then discarded by `try_reset`, which builds a fresh one. A joined worker handle
//! is never relaunched.
//!
//! ```text
//! Generation::new() ──► launch(handle) ──► take_worker() ──► (dropped by reset)
//!       Idle               Running              Joined
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Global counter for generation ids.
static GENERATION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Where the generation's worker task is in its life.
enum WorkerSlot {
    Idle,
    Running(JoinHandle<()>),
    Joined,
}

/// Worker task plus its cooperative cancel token and forced interrupt token.
pub(crate) struct Generation {
    id: u64,
    cancel: CancellationToken,
    interrupt: CancellationToken,
    worker: WorkerSlot,
}

impl Generation {
    pub(crate) fn new() -> Self {
        Self {
            id: GENERATION_SEQ.fetch_add(1, Ordering::Relaxed) + 1,
            cancel: CancellationToken::new(),
            interrupt: CancellationToken::new(),
            worker: WorkerSlot::Idle,
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Token handed to the handler; cancelled first during shutdown.
    #[inline]
    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Token that forces the worker out of its current await point.
    #[inline]
    pub(crate) fn interrupt_token(&self) -> &CancellationToken {
        &self.interrupt
    }

    /// Binds the spawned worker task to this generation.
    pub(crate) fn launch(&mut self, handle: JoinHandle<()>) {
        debug_assert!(
            matches!(self.worker, WorkerSlot::Idle),
            "a generation launches its worker at most once"
        );
        self.worker = WorkerSlot::Running(handle);
    }

    /// Takes the running worker handle for joining; later calls return `None`.
    pub(crate) fn take_worker(&mut self) -> Option<JoinHandle<()>> {
        match std::mem::replace(&mut self.worker, WorkerSlot::Joined) {
            WorkerSlot::Running(handle) => Some(handle),
            WorkerSlot::Idle => {
                self.worker = WorkerSlot::Idle;
                None
            }
            WorkerSlot::Joined => None,
        }
    }

    /// Returns `true` if no worker task of this generation can still be running.
    pub(crate) fn is_terminated(&self) -> bool {
        match &self.worker {
            WorkerSlot::Running(handle) => handle.is_finished(),
            WorkerSlot::Idle | WorkerSlot::Joined => true,
        }
    }

    /// Synchronous teardown used by the drop backstop.
    pub(crate) fn abort(&mut self) {
        self.cancel.cancel();
        self.interrupt.cancel();
        if let Some(handle) = self.take_worker() {
            handle.abort();
        }
    }
}
