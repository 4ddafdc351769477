//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(R, CancellationToken) -> Fut`, producing a
//! fresh future per request. Shared state goes through an explicit `Arc<...>`
//! captured by the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use serialvisor::{HandlerFn, HandlerRef, HandlerError};
//!
//! let h: HandlerRef<u32> = HandlerFn::arc(|n: u32, ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(HandlerError::Canceled);
//!     }
//!     let _doubled = n * 2;
//!     Ok(())
//! });
//! # drop(h);
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;
use crate::handlers::handler::{BoxHandlerFuture, Handler};

/// Shared handle to a request handler.
pub type HandlerRef<R> = Arc<dyn Handler<R>>;

/// Function-backed handler implementation.
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Wraps a closure.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a closure and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<R, F, Fut> Handler<R> for HandlerFn<F>
where
    R: Send + 'static,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn handle(&self, request: R, ctx: CancellationToken) -> BoxHandlerFuture {
        Box::pin((self.f)(request, ctx))
    }
}
