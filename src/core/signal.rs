//! # Readiness signal the worker sleeps on.
//!
//! A binary set/unset flag with a blocking wait, built on [`tokio::sync::watch`].
//! `Set` means the worker should run, `Unset` means it may sleep. Dispose moves
//! the signal to `Closed`, which releases every waiter and ignores later
//! `set`/`reset` calls.

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Unset,
    Set,
    Closed,
}

/// Why [`ReadinessSignal::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    /// The signal is set.
    Set,
    /// The signal was closed by dispose.
    Closed,
}

/// Binary wake/sleep condition.
pub(crate) struct ReadinessSignal {
    tx: watch::Sender<Flag>,
}

impl ReadinessSignal {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(Flag::Unset);
        Self { tx }
    }

    pub(crate) fn set(&self) {
        self.tx.send_if_modified(|flag| match flag {
            Flag::Unset => {
                *flag = Flag::Set;
                true
            }
            _ => false,
        });
    }

    pub(crate) fn reset(&self) {
        self.tx.send_if_modified(|flag| match flag {
            Flag::Set => {
                *flag = Flag::Unset;
                true
            }
            _ => false,
        });
    }

    pub(crate) fn is_set(&self) -> bool {
        *self.tx.borrow() == Flag::Set
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        *self.tx.borrow() == Flag::Closed
    }

    /// Releases all waiters for good.
    pub(crate) fn close(&self) {
        self.tx.send_replace(Flag::Closed);
    }

    /// Waits until the signal is set or closed.
    ///
    /// Cancel-safe: callers race it against their tokens in `select!`.
    pub(crate) async fn wait(&self) -> Wake {
        let mut rx = self.tx.subscribe();
        let flag = rx
            .wait_for(|flag| *flag != Flag::Unset)
            .await
            .map(|flag| *flag)
            .unwrap_or(Flag::Closed);
        match flag {
            Flag::Closed => Wake::Closed,
            _ => Wake::Set,
        }
    }
}
