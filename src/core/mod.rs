//! Runtime core: the worker, its state machine and its lifecycle.
//!
//! The public API from this module is [`SerialWorker`] (with its builder) and the
//! [`WorkerState`] machine it exposes.
//!
//! Internal modules:
//! - [`state`]: the state cell and its transition matrix;
//! - [`queue`]: FIFO request queue;
//! - [`signal`]: readiness signal that wakes the worker;
//! - [`generation`]: one worker incarnation (task handle plus tokens);
//! - [`worker`]: the worker loop that drains the queue;
//! - [`shutdown`]: escalating stop shared by stop, reset and dispose.

mod builder;
mod generation;
mod queue;
mod serial_worker;
mod shared;
mod shutdown;
mod signal;
mod state;
mod worker;

pub use builder::SerialWorkerBuilder;
pub use serial_worker::SerialWorker;
pub use state::{Transition, WorkerState};
