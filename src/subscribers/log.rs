//! # LogWriter: forwards events to `tracing`
//!
//! A subscriber that emits every [`Event`] through the `tracing` macros at the
//! event's [`Level`]. Install any `tracing` subscriber in the application to
//! collect the output.
//!
//! ## Example output (with `tracing-subscriber`'s fmt layer)
//! ```text
//! WARN serialvisor: The worker did not stop in time; interrupting it. generation=1 timeout_ms=2500
//! ERROR serialvisor: Worker thread interrupted. generation=1 error="worker thread interrupted"
//! WARN serialvisor: The worker was interrupted and has stopped. generation=1
//! ```

use crate::events::{Event, EventKind, Level};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        if e.kind == EventKind::StateChanged {
            tracing::debug!(
                target: "serialvisor",
                seq = e.seq,
                from = ?e.from,
                to = ?e.to,
                "{}",
                e.message
            );
            return;
        }
        match e.level {
            Level::Debug => tracing::debug!(
                target: "serialvisor",
                seq = e.seq,
                kind = ?e.kind,
                count = ?e.count,
                "{}",
                e.message
            ),
            Level::Info => tracing::info!(
                target: "serialvisor",
                seq = e.seq,
                generation = ?e.generation,
                "{}",
                e.message
            ),
            Level::Warn => tracing::warn!(
                target: "serialvisor",
                seq = e.seq,
                generation = ?e.generation,
                timeout_ms = ?e.timeout_ms,
                source = ?e.source,
                error = ?e.error,
                "{}",
                e.message
            ),
            Level::Error => tracing::error!(
                target: "serialvisor",
                seq = e.seq,
                generation = ?e.generation,
                error = ?e.error,
                "{}",
                e.message
            ),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
