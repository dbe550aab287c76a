//! Shared shutdown counter for non-keep-alive servers.
//!
//! The orchestrator owns one [`WaitCounter`]; each server started with
//! `keep_alive == false` increments it when it comes online and decrements
//! it when its process exits. `wait_idle` lets the caller block until every
//! tracked server has finished.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::warn;

/// Explicit, synchronized counter of running non-keep-alive servers.
///
/// Cloning is cheap; all clones share the same count. The count never goes
/// negative: a decrement on an already-zero counter is dropped and logged.
#[derive(Debug, Clone, Default)]
pub struct WaitCounter {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    count: AtomicUsize,
    idle: Notify,
}

impl WaitCounter {
    /// Create a counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count.
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Record one more tracked server.
    pub fn increment(&self) {
        self.inner.count.fetch_add(1, Ordering::AcqRel);
    }

    /// Record one tracked server finishing. Floors at zero.
    pub fn decrement(&self) {
        let mut current = self.inner.count.load(Ordering::Acquire);
        loop {
            if current == 0 {
                warn!("wait counter decremented below zero, ignoring");
                return;
            }

            match self.inner.count.compare_exchange(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if current == 1 {
                        self.inner.idle.notify_waiters();
                    }
                    return;
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Resolve once the count reaches zero.
    ///
    /// Returns immediately when nothing is tracked, so a configuration of
    /// only keep-alive servers does not block shutdown.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}
