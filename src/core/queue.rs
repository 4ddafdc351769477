//! # Unbounded FIFO of pending requests.
//!
//! Many producers push, the single worker pops. Insertion order is processing
//! order; the only way a request leaves without being handled is [`RequestQueue::clear`]
//! during shutdown.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// Multi-producer, single-consumer request queue.
pub(crate) struct RequestQueue<R> {
    items: Mutex<VecDeque<R>>,
}

impl<R> RequestQueue<R> {
    pub(crate) fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, request: R) {
        self.items.lock().push_back(request);
    }

    pub(crate) fn pop(&self) -> Option<R> {
        self.items.lock().pop_front()
    }

    /// Discards every pending request; returns how many were dropped.
    pub(crate) fn clear(&self) -> usize {
        // Drop the requests outside the lock; their destructors may be arbitrary.
        let drained = std::mem::take(&mut *self.items.lock());
        drained.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let q = RequestQueue::new();
        for i in 0..5 {
            q.push(i);
        }
        let out: Vec<_> = std::iter::from_fn(|| q.pop()).collect();
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_clear_reports_discarded() {
        let q = RequestQueue::new();
        q.push("a");
        q.push("b");
        assert_eq!(q.len(), 2);
        assert_eq!(q.clear(), 2);
        assert_eq!(q.clear(), 0);
        assert_eq!(q.pop(), None);
    }
}
