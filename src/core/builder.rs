use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};
use super::{generation::Generation, serial_worker::SerialWorker, shared::Shared};

/// Builder for constructing a [`SerialWorker`] with optional subscribers.
pub struct SerialWorkerBuilder<R> {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    _requests: std::marker::PhantomData<fn(R)>,
}

impl<R: Send + 'static> SerialWorkerBuilder<R> {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            _requests: std::marker::PhantomData,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive worker events (state changes, handler failures,
    /// escalation) through dedicated tasks with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the worker in the `Initialized` state.
    ///
    /// Must be called from within a tokio runtime when subscribers are set.
    pub fn build(self) -> SerialWorker<R> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let generation = Generation::new();
        let shared = Arc::new(Shared::new(bus.clone(), generation.id()));
        let listener = CancellationToken::new();

        let set = SubscriberSet::new(self.subscribers, bus.clone());
        if !set.is_empty() {
            subscriber_listener(&bus, set, listener.clone());
        }
        SerialWorker::from_parts(self.cfg, shared, generation, listener)
    }
}

/// Forwards bus events to the subscriber set until `token` is cancelled.
///
/// Events already buffered when the token fires are still delivered.
fn subscriber_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            let ev = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                ev = rx.recv() => ev,
            };
            match ev {
                Ok(ev) => set.emit(Arc::new(ev)),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        loop {
            match rx.try_recv() {
                Ok(ev) => set.emit(Arc::new(ev)),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    });
}
