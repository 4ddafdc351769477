//! State shared between producers, the worker task and the lifecycle operations.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::queue::RequestQueue;
use crate::core::signal::ReadinessSignal;
use crate::core::state::{StateCell, Transition, WorkerState};
use crate::error::LifecycleError;
use crate::events::{Bus, Event, EventKind};

pub(crate) struct Shared<R> {
    pub(crate) state: StateCell,
    pub(crate) queue: RequestQueue<R>,
    pub(crate) signal: ReadinessSignal,
    pub(crate) bus: Bus,
    /// Id of the current generation (bare read for introspection).
    generation: AtomicU64,
}

impl<R> Shared<R> {
    pub(crate) fn new(bus: Bus, generation: u64) -> Self {
        Self {
            state: StateCell::new(WorkerState::Initialized),
            queue: RequestQueue::new(),
            signal: ReadinessSignal::new(),
            bus,
            generation: AtomicU64::new(generation),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> WorkerState {
        self.state.get()
    }

    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) fn set_generation(&self, id: u64) {
        self.generation.store(id, Ordering::Release);
    }

    /// Guarded transition; returns `true` if the state changed.
    pub(crate) fn try_set(&self, requested: WorkerState) -> bool {
        let t = self.state.try_set(requested, &self.queue, &self.signal);
        self.observe(t, requested)
    }

    /// Worker-side transition between `Ready` and `Running`.
    pub(crate) fn try_set_active(&self, requested: WorkerState) -> bool {
        let t = self
            .state
            .try_set_active(requested, &self.queue, &self.signal);
        self.observe(t, requested)
    }

    pub(crate) fn enqueue(&self, request: R) -> Result<(), LifecycleError> {
        let t = self.state.enqueue(request, &self.queue, &self.signal)?;
        self.observe(t, WorkerState::Running);
        Ok(())
    }

    pub(crate) fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }

    fn observe(&self, t: Transition, requested: WorkerState) -> bool {
        match t {
            Transition::Committed(from) => {
                if self.bus.has_receivers() {
                    self.publish(
                        Event::new(EventKind::StateChanged)
                            .with_transition(from, requested)
                            .with_generation(self.generation()),
                    );
                }
                true
            }
            Transition::Unchanged | Transition::Blocked => false,
        }
    }
}
