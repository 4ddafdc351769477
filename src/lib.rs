//! # serialvisor
//!
//! **Serialvisor** runs one dedicated worker that processes submitted requests
//! strictly one at a time, in submission order, under an explicit lifecycle.
//!
//! Any number of producers enqueue requests; a single worker task hands each one
//! to a user-supplied [`Handler`]. The owner drives the lifecycle (start, stop,
//! reset, dispose), and a worker that ignores cooperative cancellation is
//! forcibly interrupted after a bounded wait.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producer #1     producer #2     producer #N
//!        │               │               │
//!        └──── enqueue ──┴───────────────┘
//!                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  SerialWorker (lifecycle controller)                              │
//! │  - StateCell      (state machine + spin section)                  │
//! │  - RequestQueue   (FIFO)                                          │
//! │  - ReadinessSignal(wakes the worker)                              │
//! │  - Generation     (worker task + cancel/interrupt tokens)         │
//! └──────┬─────────────────────────────────────────────┬──────────────┘
//!        ▼                                             │
//!   ┌──────────────┐                                   │ start / try_stop /
//!   │  WorkerLoop  │ ── handler.handle(req, ctx) ──►   │ try_reset / dispose
//!   │ (one per gen)│                                   │ (escalating shutdown)
//!   └──────┬───────┘                                   │
//!          │ publishes                                 │ publishes
//!          ▼                                           ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                     (capacity: Config::bus_capacity)              │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                          ┌────────┼────────┐
//!                          ▼        ▼        ▼
//!                       sub1     sub2     subN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Initialized ──start──► Ready ◄──► Running
//!                          │          │
//!                          └─try_stop─┴──► Stopping ──► Stopped
//!                          └─try_reset───► Resetting ──► Initialized (new generation)
//!
//! any non-disposed state ──dispose──► Disposing ──► Disposed
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                       |
//! |-------------------|--------------------------------------------------------------|------------------------------------------|
//! | **Worker**        | Serial request processing with an explicit lifecycle.        | [`SerialWorker`], [`WorkerState`]        |
//! | **Handlers**      | Per-request callbacks as trait objects or closures.          | [`Handler`], [`HandlerFn`], [`HandlerRef`] |
//! | **Subscriber API**| Hook into worker events (logging, metrics, alerting).        | [`Subscribe`], [`Event`]                 |
//! | **Errors**        | Typed errors for lifecycle misuse and handler failures.      | [`LifecycleError`], [`HandlerError`]     |
//! | **Configuration** | Join timeout and bus capacity.                               | [`Config`]                               |
//!
//! ## Optional features
//! - `logging`: exports a [`LogWriter`] subscriber that forwards events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use serialvisor::{Config, HandlerError, HandlerFn, SerialWorker};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default().with_join_timeout(Duration::from_secs(1));
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn serialvisor::Subscribe>> = vec![Arc::new(serialvisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn serialvisor::Subscribe>> = Vec::new();
//!
//!     let worker = SerialWorker::<String>::builder(cfg)
//!         .with_subscribers(subs)
//!         .build();
//!
//!     worker
//!         .start(HandlerFn::arc(|line: String, ctx: CancellationToken| async move {
//!             if ctx.is_cancelled() {
//!                 return Err(HandlerError::Canceled);
//!             }
//!             println!("{line}");
//!             Ok(())
//!         }))
//!         .await?;
//!
//!     worker.enqueue("hello".to_string())?;
//!     worker.enqueue("world".to_string())?;
//!
//!     worker.try_stop().await?;
//!     worker.dispose().await;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod handlers;
mod subscribers;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_JOIN_TIMEOUT};
pub use core::{SerialWorker, SerialWorkerBuilder, Transition, WorkerState};
pub use error::{
    DISPOSED_MESSAGE, ENQUEUE_STATE_MESSAGE, HandlerError, LifecycleError, START_STATE_MESSAGE,
};
pub use events::{Bus, Event, EventKind, Level};
pub use handlers::{BoxHandlerFuture, Handler, HandlerFn, HandlerRef};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: a subscriber that forwards events to `tracing`.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
