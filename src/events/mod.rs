//! Worker events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the worker loop, the state cell
//! and the shutdown supervisor.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`Level`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: worker loop, `StateCell` transitions, shutdown supervisor,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the fan-out listener feeding `SubscriberSet`, and any receiver
//!   obtained through `SerialWorker::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, Level};
