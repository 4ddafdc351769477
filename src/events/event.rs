//! # Events emitted by the serial worker.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Worker events**: what the worker loop observed (cancellation, interruption, handler failures)
//! - **Lifecycle events**: what stop/reset/dispose did (join timeout, reset, discarded requests, state changes)
//! - **Subscriber events**: health of the fan-out (overflow, panic)
//!
//! Every kind has a fixed [`Level`] and a fixed message text; both are part of
//! the observable contract. The [`Event`] struct carries additional metadata such as
//! timestamps, the attached error and the state transition.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use serialvisor::{Event, EventKind, Level};
//!
//! let ev = Event::new(EventKind::HandlerFailed).with_error("boom");
//!
//! assert_eq!(ev.kind, EventKind::HandlerFailed);
//! assert_eq!(ev.level, Level::Error);
//! assert_eq!(ev.message, "The request handler failed.");
//! assert_eq!(ev.error.as_deref(), Some("boom"));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::WorkerState;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Severity of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Bookkeeping (state changes, discarded requests).
    Debug,
    /// Expected conditions (cancellation at shutdown).
    Info,
    /// Degraded but recovered conditions (reset, join timeout).
    Warn,
    /// Failures (handler errors, forced interruption).
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        })
    }
}

/// Classification of worker events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Worker loop events ===
    /// The worker loop observed cancellation and is exiting.
    ///
    /// Sets:
    /// - `generation`: generation id of the exiting worker
    WorkerCancelled,

    /// The worker was forcibly interrupted while waiting or inside the handler.
    ///
    /// Sets:
    /// - `generation`: generation id of the interrupted worker
    /// - `error`: the interruption condition
    WorkerInterrupted,

    /// The handler returned an error (or panicked) for one request.
    ///
    /// Sets:
    /// - `generation`: generation id of the worker
    /// - `error`: the handler error
    HandlerFailed,

    // === Lifecycle events ===
    /// The worker did not stop within `join_timeout`; interruption follows.
    ///
    /// Sets:
    /// - `generation`: generation id of the stuck worker
    /// - `timeout_ms`: configured join timeout (ms)
    JoinTimedOut,

    /// The interrupted worker finished after the unbounded join.
    ///
    /// Sets:
    /// - `generation`: generation id of the interrupted worker
    InterruptJoined,

    /// The worker was reset and is back to `Initialized` with a new generation.
    ///
    /// Sets:
    /// - `generation`: id of the new generation
    ResetOccurred,

    /// Shutdown discarded requests that were never dispatched.
    ///
    /// Sets:
    /// - `count`: number of discarded requests
    RequestsDiscarded,

    /// The state cell committed a transition.
    ///
    /// Sets:
    /// - `from`, `to`: previous and new state
    StateChanged,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `error`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `error`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

impl EventKind {
    /// Returns the fixed severity of this kind.
    pub fn level(self) -> Level {
        match self {
            EventKind::StateChanged | EventKind::RequestsDiscarded => Level::Debug,
            EventKind::WorkerCancelled => Level::Info,
            EventKind::ResetOccurred
            | EventKind::JoinTimedOut
            | EventKind::InterruptJoined
            | EventKind::SubscriberOverflow
            | EventKind::SubscriberPanicked => Level::Warn,
            EventKind::WorkerInterrupted | EventKind::HandlerFailed => Level::Error,
        }
    }

    /// Returns the fixed message text of this kind.
    pub fn message(self) -> &'static str {
        match self {
            EventKind::WorkerCancelled => {
                "Worker cancellation requested; the worker loop is exiting."
            }
            EventKind::WorkerInterrupted => "Worker thread interrupted.",
            EventKind::HandlerFailed => "The request handler failed.",
            EventKind::JoinTimedOut => "The worker did not stop in time; interrupting it.",
            EventKind::InterruptJoined => "The worker was interrupted and has stopped.",
            EventKind::ResetOccurred => {
                "The worker was reset; a new generation is ready to start."
            }
            EventKind::RequestsDiscarded => "Pending requests were discarded.",
            EventKind::StateChanged => "Worker state changed.",
            EventKind::SubscriberPanicked => "An event subscriber panicked.",
            EventKind::SubscriberOverflow => "An event subscriber dropped an event.",
        }
    }
}

/// Worker event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `level`/`message`: fixed per [`EventKind`]
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Severity.
    pub level: Level,
    /// Fixed human-readable message.
    pub message: &'static str,

    /// Attached error (handler error, interruption, overflow reason).
    pub error: Option<Arc<str>>,
    /// Generation id the event refers to.
    pub generation: Option<u64>,
    /// Previous state (only for `StateChanged`).
    pub from: Option<WorkerState>,
    /// New state (only for `StateChanged`).
    pub to: Option<WorkerState>,
    /// Join timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Number of items affected (discarded requests).
    pub count: Option<usize>,
    /// Name of the emitting subscriber, if applicable.
    pub source: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            level: kind.level(),
            message: kind.message(),
            error: None,
            generation: None,
            from: None,
            to: None,
            timeout_ms: None,
            count: None,
            source: None,
        }
    }

    /// Attaches an error description.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a generation id.
    #[inline]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Attaches a state transition.
    #[inline]
    pub fn with_transition(mut self, from: WorkerState, to: WorkerState) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a count.
    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Attaches the emitting subscriber name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_error(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_error(info)
    }

    /// Returns `true` for fan-out overflow events, which are never re-reported.
    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
