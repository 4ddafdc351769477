//! Error types used by the serial worker and its request handlers.
//!
//! This module defines two main error enums:
//!
//! - [`LifecycleError`]: misuse of the worker, raised synchronously to the caller.
//! - [`HandlerError`]: errors returned by a request [`Handler`](crate::Handler).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::borrow::Cow;
use thiserror::Error;

/// Message used when an operation runs against a disposed worker.
pub const DISPOSED_MESSAGE: &str = "The worker has been disposed.";

/// Message used when a request is enqueued outside `Ready`/`Running`.
pub const ENQUEUE_STATE_MESSAGE: &str =
    "Cannot enqueue a request while the thread is not ready or running.";

/// Message used when `start` is called outside `Initialized`.
pub const START_STATE_MESSAGE: &str = "Cannot start the worker unless it is initialized.";

/// # Errors produced by lifecycle misuse.
///
/// These are the only errors a caller of [`SerialWorker`](crate::SerialWorker)
/// ever sees. Request processing failures never surface here; they are
/// reported as events instead.
///
/// Build them through [`LifecycleError::disposed`] and
/// [`LifecycleError::invalid_state`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The worker is `Disposing` or `Disposed`.
    #[error("{message}")]
    Disposed {
        /// Human-readable message.
        message: Cow<'static, str>,
        /// Name of the operation or argument that hit the disposed worker.
        field: Option<&'static str>,
    },

    /// The operation is not permitted from the current lifecycle state.
    #[error("{message}")]
    InvalidState {
        /// Human-readable message.
        message: Cow<'static, str>,
        /// Name of the operation or argument that was rejected.
        field: Option<&'static str>,
    },
}

impl LifecycleError {
    /// Creates a disposed-kind error.
    pub fn disposed(message: impl Into<Cow<'static, str>>, field: Option<&'static str>) -> Self {
        LifecycleError::Disposed {
            message: message.into(),
            field,
        }
    }

    /// Creates an invalid-lifecycle-state error.
    pub fn invalid_state(
        message: impl Into<Cow<'static, str>>,
        field: Option<&'static str>,
    ) -> Self {
        LifecycleError::InvalidState {
            message: message.into(),
            field,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use serialvisor::LifecycleError;
    ///
    /// let err = LifecycleError::disposed("gone", Some("enqueue"));
    /// assert_eq!(err.as_label(), "worker_disposed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleError::Disposed { .. } => "worker_disposed",
            LifecycleError::InvalidState { .. } => "worker_invalid_state",
        }
    }

    /// Returns the message together with the offending field, if any.
    pub fn as_message(&self) -> String {
        let (message, field) = match self {
            LifecycleError::Disposed { message, field }
            | LifecycleError::InvalidState { message, field } => (message, field),
        };
        match field {
            Some(field) => format!("{message} (field: {field})"),
            None => message.to_string(),
        }
    }

    /// Returns the operation or argument name attached to the error.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            LifecycleError::Disposed { field, .. } | LifecycleError::InvalidState { field, .. } => {
                *field
            }
        }
    }

    /// Returns `true` for the disposed kind.
    pub fn is_disposed(&self) -> bool {
        matches!(self, LifecycleError::Disposed { .. })
    }

    /// Returns `true` for the invalid-lifecycle-state kind.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, LifecycleError::InvalidState { .. })
    }
}

/// # Errors returned by request handlers.
///
/// The worker loop treats each variant differently:
/// - [`HandlerError::Canceled`] ends the worker loop (expected at shutdown);
/// - [`HandlerError::Interrupted`] is logged and the loop keeps going;
/// - [`HandlerError::Fail`] is logged and the next request is processed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler observed cancellation of its token.
    #[error("context cancelled")]
    Canceled,

    /// The handler was interrupted by the shutdown escalation.
    #[error("worker thread interrupted")]
    Interrupted,

    /// The handler failed to process the request.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl HandlerError {
    /// Creates a [`HandlerError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use serialvisor::HandlerError;
    ///
    /// let err = HandlerError::fail("disk full");
    /// assert_eq!(err.to_string(), "handler failed: disk full");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        HandlerError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Canceled => "handler_canceled",
            HandlerError::Interrupted => "handler_interrupted",
            HandlerError::Fail { .. } => "handler_failed",
        }
    }

    /// Returns `true` if the error is the cancellation kind.
    pub fn is_canceled(&self) -> bool {
        matches!(self, HandlerError::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_message_is_stable() {
        let err = LifecycleError::invalid_state(ENQUEUE_STATE_MESSAGE, Some("enqueue"));
        assert_eq!(
            err.to_string(),
            "Cannot enqueue a request while the thread is not ready or running."
        );
        assert!(err.is_invalid_state());
        assert_eq!(err.field(), Some("enqueue"));
    }

    #[test]
    fn test_as_message_appends_field() {
        let err = LifecycleError::disposed(DISPOSED_MESSAGE, Some("start"));
        assert_eq!(err.as_message(), "The worker has been disposed. (field: start)");

        let bare = LifecycleError::disposed(DISPOSED_MESSAGE, None);
        assert_eq!(bare.as_message(), DISPOSED_MESSAGE);
    }

    #[test]
    fn test_handler_labels() {
        assert_eq!(HandlerError::Canceled.as_label(), "handler_canceled");
        assert_eq!(HandlerError::Interrupted.as_label(), "handler_interrupted");
        assert_eq!(HandlerError::fail("x").as_label(), "handler_failed");
        assert!(HandlerError::Canceled.is_canceled());
        assert!(!HandlerError::Interrupted.is_canceled());
    }
}
