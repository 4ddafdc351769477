//! # Escalating stop shared by stop, reset and dispose.
//!
//! ```text
//! shutdown(shared, generation, join_timeout)
//!   ├─► queue.clear()                  (publish RequestsDiscarded if any)
//!   ├─► cancel token .cancel(); signal.reset()
//!   ├─► no running worker?             ─► done
//!   ├─► timeout(join_timeout, join)
//!   │     ├─ Ok      ─► done
//!   │     └─ Elapsed ─► publish JoinTimedOut
//!   │                  interrupt token .cancel()
//!   │                  join (unbounded)
//!   │                  publish InterruptJoined
//!   └─► worker panicked? ─► resume_unwind
//! ```
//!
//! Interruption lands at the worker's next await point. It guarantees that
//! lifecycle operations finish when a handler hangs, and says nothing about the
//! consistency of whatever the handler was holding.

use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio::time;

use crate::core::generation::Generation;
use crate::core::shared::Shared;
use crate::events::{Event, EventKind};

/// Stops the generation's worker, escalating to interruption after `join_timeout`.
pub(crate) async fn shutdown<R>(
    shared: &Shared<R>,
    generation: &mut Generation,
    join_timeout: Duration,
) {
    let discarded = shared.queue.clear();
    if discarded > 0 {
        shared.publish(
            Event::new(EventKind::RequestsDiscarded)
                .with_generation(generation.id())
                .with_count(discarded),
        );
    }

    generation.cancel_token().cancel();
    shared.signal.reset();

    let Some(handle) = generation.take_worker() else {
        return;
    };
    if handle.is_finished() {
        settle(handle.await);
        return;
    }
    settle(join_with_escalation(shared, generation, handle, join_timeout).await);
}

async fn join_with_escalation<R>(
    shared: &Shared<R>,
    generation: &Generation,
    mut handle: JoinHandle<()>,
    join_timeout: Duration,
) -> Result<(), JoinError> {
    if let Ok(res) = time::timeout(join_timeout, &mut handle).await {
        return res;
    }

    shared.publish(
        Event::new(EventKind::JoinTimedOut)
            .with_generation(generation.id())
            .with_timeout(join_timeout),
    );
    generation.interrupt_token().cancel();

    let res = handle.await;
    shared.publish(Event::new(EventKind::InterruptJoined).with_generation(generation.id()));
    res
}

/// Re-raises a panic that escaped the worker loop; an aborted worker is fine.
fn settle(res: Result<(), JoinError>) {
    if let Err(err) = res {
        if err.is_panic() {
            std::panic::resume_unwind(err.into_panic());
        }
    }
}
