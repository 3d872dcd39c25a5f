//! Counting join primitive.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Blocks a waiter until a counter of outstanding tasks drops to zero.
///
/// Clones share the same counter.
#[derive(Clone, Default)]
pub struct WaitGroup {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    count: Mutex<usize>,
    zero: Condvar,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `n` more outstanding tasks.
    pub fn add(&self, n: usize) {
        let mut count = self.inner.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count += n;
    }

    /// Mark one task as finished.
    pub fn done(&self) {
        let mut count = self.inner.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.inner.zero.notify_all();
        }
    }

    /// Register one task and return a guard that finishes it on drop.
    ///
    /// The count is released even if the task panics.
    pub fn guard(&self) -> Guard {
        self.add(1);
        Guard { wg: self.clone() }
    }

    /// Outstanding task count.
    pub fn pending(&self) -> usize {
        *self.inner.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until every registered task has finished.
    pub fn wait(&self) {
        let count = self.inner.count.lock().unwrap_or_else(PoisonError::into_inner);
        let _count = self
            .inner
            .zero
            .wait_while(count, |n| *n > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

/// Finishes one task of its [`WaitGroup`] when dropped.
pub struct Guard {
    wg: WaitGroup,
}

impl Drop for Guard {
    fn drop(&mut self) {
        self.wg.done();
    }
}
