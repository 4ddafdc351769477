//! # Request handlers.
//!
//! - [`Handler`] - trait for the per-request callback
//! - [`HandlerFn`] - closure-based implementation
//! - [`HandlerRef`] - shared reference to a handler (`Arc<dyn Handler<R>>`)

mod handler;
mod handler_fn;

pub use handler::{BoxHandlerFuture, Handler};
pub use handler_fn::{HandlerFn, HandlerRef};
