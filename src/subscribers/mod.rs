//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! (with the `logging` feature) the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! worker / shutdown ── publish(Event) ──► Bus ──► fan-out listener
//!                                                      │
//!                                                      ▼
//!                                               SubscriberSet::emit
//!                                           ┌──────────┼──────────┐
//!                                           ▼          ▼          ▼
//!                                       LogWriter   Metrics    Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
pub(crate) use subscriber_set::panic_info;
