//! # Worker loop: the single consumer of the request queue.
//!
//! One [`WorkerLoop`] runs per generation, on its own tokio task.
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► wait: select! { cancel, interrupt, signal }
//!   │       ├─ cancel / closed ─► publish WorkerCancelled, exit
//!   │       ├─ interrupt       ─► publish WorkerInterrupted, exit
//!   │       └─ set             ─► try_set_active(Running)
//!   ├─► drain:
//!   │     while let Some(req) = queue.pop() {
//!   │         select! { interrupt, handler.handle(req, cancel) }
//!   │         (interrupt pending after the handler returns counts as Interrupted)
//!   │           ├─ Ok          ─► next
//!   │           ├─ Canceled    ─► leave drain, exit loop
//!   │           ├─ Interrupted ─► publish WorkerInterrupted, next
//!   │           └─ Fail/panic  ─► publish HandlerFailed, next
//!   │     }
//!   └─► ReadyGuard drop ─► try_set_active(Ready)   (every exit from drain)
//! }
//! ```
//!
//! ## Rules
//! - Requests are handled **sequentially** in queue order (never concurrently)
//! - Cancellation is checked before each dequeue and raced against the wait
//! - A misbehaving handler (error, panic) never ends the loop

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::core::generation::Generation;
use crate::core::shared::Shared;
use crate::core::signal::Wake;
use crate::core::state::WorkerState;
use crate::error::HandlerError;
use crate::events::{Event, EventKind};
use crate::handlers::HandlerRef;
use crate::subscribers::panic_info;

/// Why the drain step stopped early.
#[derive(Debug)]
enum DrainExit {
    Canceled,
}

/// Moves the worker back to `Ready` whenever the drain step is left.
struct ReadyGuard<'a, R>(&'a Shared<R>);

impl<R> Drop for ReadyGuard<'_, R> {
    fn drop(&mut self) {
        self.0.try_set_active(WorkerState::Ready);
    }
}

/// The worker loop of one generation.
pub(crate) struct WorkerLoop<R> {
    shared: Arc<Shared<R>>,
    handler: HandlerRef<R>,
    cancel: CancellationToken,
    interrupt: CancellationToken,
    generation: u64,
}

impl<R: Send + 'static> WorkerLoop<R> {
    pub(crate) fn new(
        shared: Arc<Shared<R>>,
        handler: HandlerRef<R>,
        generation: &Generation,
    ) -> Self {
        Self {
            shared,
            handler,
            cancel: generation.cancel_token().clone(),
            interrupt: generation.interrupt_token().clone(),
            generation: generation.id(),
        }
    }

    /// Runs until cancellation, interruption while idle, or signal close.
    pub(crate) async fn run(self) {
        loop {
            let wake = select! {
                biased;
                _ = self.cancel.cancelled() => Wake::Closed,
                _ = self.interrupt.cancelled() => {
                    self.publish_interrupted();
                    Wake::Closed
                }
                wake = self.shared.signal.wait() => wake,
            };
            if wake == Wake::Closed {
                break;
            }

            self.shared.try_set_active(WorkerState::Running);
            let outcome = {
                let _ready = ReadyGuard(self.shared.as_ref());
                self.drain().await
            };
            if let Err(DrainExit::Canceled) = outcome {
                break;
            }
        }
        self.shared
            .publish(Event::new(EventKind::WorkerCancelled).with_generation(self.generation));
    }

    /// Handles queued requests until the queue is empty.
    async fn drain(&self) -> Result<(), DrainExit> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(DrainExit::Canceled);
            }
            let Some(request) = self.shared.queue.pop() else {
                return Ok(());
            };
            self.dispatch(request).await?;
        }
    }

    /// Runs the handler for one request and applies the per-request error policy.
    async fn dispatch(&self, request: R) -> Result<(), DrainExit> {
        let call = AssertUnwindSafe(async {
            self.handler.handle(request, self.cancel.clone()).await
        })
        .catch_unwind();

        let res = select! {
            biased;
            _ = self.interrupt.cancelled() => Err(HandlerError::Interrupted),
            res = call => res.unwrap_or_else(|panic| {
                Err(HandlerError::fail(format!("handler panicked: {}", panic_info(&*panic))))
            }),
        };
        // An interrupt raised while the handler ran without yielding lands here.
        let res = if self.interrupt.is_cancelled() {
            Err(HandlerError::Interrupted)
        } else {
            res
        };

        match res {
            Ok(()) => Ok(()),
            Err(HandlerError::Canceled) => Err(DrainExit::Canceled),
            Err(HandlerError::Interrupted) => {
                self.publish_interrupted();
                Ok(())
            }
            Err(e) => {
                self.shared.publish(
                    Event::new(EventKind::HandlerFailed)
                        .with_generation(self.generation)
                        .with_error(e.to_string()),
                );
                Ok(())
            }
        }
    }

    fn publish_interrupted(&self) {
        self.shared.publish(
            Event::new(EventKind::WorkerInterrupted)
                .with_generation(self.generation)
                .with_error(HandlerError::Interrupted.to_string()),
        );
    }
}
