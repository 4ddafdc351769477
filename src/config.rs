//! # Worker configuration.
//!
//! Provides [`Config`], the settings shared by every generation of a
//! [`SerialWorker`](crate::SerialWorker).
//!
//! ## Sentinel values
//! - `join_timeout = 0s` → skip the cooperative join and interrupt immediately
//! - `bus_capacity = 0` → clamped to 1 by the bus

use std::time::Duration;

/// Default bounded wait for the worker to stop before it is interrupted (2500 ms).
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_millis(2500);

/// Configuration for a serial worker.
///
/// ## Field semantics
/// - `join_timeout`: how long stop/reset/dispose wait for the worker after cancelling it
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for the worker to exit after cooperative cancellation.
    ///
    /// When it elapses:
    /// - a `JoinTimedOut` warning is published
    /// - the worker is interrupted at its next await point
    /// - the supervisor joins again without a bound
    pub join_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a copy of the config with a different join timeout.
    #[inline]
    #[must_use]
    pub fn with_join_timeout(mut self, join_timeout: Duration) -> Self {
        self.join_timeout = join_timeout;
        self
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `join_timeout = 2500ms` ([`DEFAULT_JOIN_TIMEOUT`])
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            bus_capacity: 1024,
        }
    }
}
