//! # Request handler abstraction.
//!
//! A [`Handler`] processes one request at a time on the worker. It receives the
//! request by value together with the generation's [`CancellationToken`] and
//! should return [`HandlerError::Canceled`] once it observes cancellation.
//!
//! Handlers are never invoked concurrently with themselves for the same worker.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;

/// Boxed future returned by [`Handler::handle`].
pub type BoxHandlerFuture =
    Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'static>>;

/// # Per-request callback.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use serialvisor::{BoxHandlerFuture, Handler, HandlerError};
///
/// struct Print;
///
/// impl Handler<String> for Print {
///     fn handle(&self, request: String, ctx: CancellationToken) -> BoxHandlerFuture {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(HandlerError::Canceled);
///             }
///             println!("{request}");
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Handler<R>: Send + Sync + 'static {
    /// Processes one request.
    ///
    /// Errors other than [`HandlerError::Canceled`] are logged by the worker and the
    /// next request is processed.
    fn handle(&self, request: R, ctx: CancellationToken) -> BoxHandlerFuture;
}
