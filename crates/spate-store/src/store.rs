//! The work store: a guarded counter with a blocking consume.
//!
//! The counter lives behind a `parking_lot::Mutex` that is never held
//! across an `.await`. Consumers that find the store empty park on a
//! `tokio::sync::Notify`; every production broadcasts with
//! `notify_waiters()` and each woken consumer re-checks the counter under
//! the lock before taking anything.
//!
//! A consumer registers its wakeup (`Notified::enable`) *before* looking
//! at the counter, so a production landing between the check and the
//! suspension still wakes it.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, trace};

use spate_metrics::DemoMetrics;

use crate::dice::Dice;
use crate::error::{StoreError, StoreResult};

/// Initial store level used by the producer daemon.
pub const DEFAULT_INITIAL_STORE: u64 = 40;

/// Upper bound (inclusive) of units a single consumption may remove.
pub const MAX_CONSUME: u64 = 2;

/// Shared pending-work counter.
pub struct WorkloadStore {
    value: Mutex<u64>,
    available: Notify,
    /// Consumers currently parked waiting for production.
    waiting: AtomicUsize,
    dice: Arc<dyn Dice>,
    metrics: Arc<DemoMetrics>,
}

impl WorkloadStore {
    /// Create a store holding `initial` units.
    pub fn new(initial: u64, dice: Arc<dyn Dice>, metrics: Arc<DemoMetrics>) -> Self {
        metrics.set_store(initial);
        Self {
            value: Mutex::new(initial),
            available: Notify::new(),
            waiting: AtomicUsize::new(0),
            dice,
            metrics,
        }
    }

    /// Add `delta` units and wake every parked consumer.
    ///
    /// Returns the store level right after the addition.
    pub fn produce(&self, delta: u64) -> u64 {
        let level = {
            let mut value = self.value.lock();
            *value = value.saturating_add(delta);
            self.metrics.set_store(*value);
            *value
        };
        self.metrics.add_produced(delta);
        self.available.notify_waiters();

        debug!(delta, store = level, "produced work");
        level
    }

    /// Remove up to [`MAX_CONSUME`] units, waiting while the store is empty.
    ///
    /// The amount removed is `min(draw, level)` with `draw` uniform in
    /// `0..=MAX_CONSUME`, so a consumption may remove nothing. There is no
    /// timeout: if production stops, this waits forever. Dropping the
    /// future while it waits removes nothing.
    pub async fn consume(&self) -> u64 {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(removed) = self.try_consume() {
                return removed;
            }

            let _waiting = WaitingGuard::enter(&self.waiting);
            trace!("store empty, waiting for production");
            notified.await;
        }
    }

    /// Like [`consume`](Self::consume), but give up after `timeout`.
    pub async fn consume_within(&self, timeout: Duration) -> StoreResult<u64> {
        tokio::time::timeout(timeout, self.consume())
            .await
            .map_err(|_| StoreError::ConsumeTimedOut(timeout))
    }

    /// Remove work if any is pending, without waiting.
    ///
    /// Returns `None` when the store is empty.
    pub fn try_consume(&self) -> Option<u64> {
        let (removed, level) = {
            let mut value = self.value.lock();
            if *value == 0 {
                return None;
            }
            let removed = self.dice.roll(MAX_CONSUME).min(*value);
            *value -= removed;
            self.metrics.set_store(*value);
            (removed, *value)
        };
        self.metrics.add_consumed(removed);

        debug!(removed, store = level, "consumed work");
        Some(removed)
    }

    /// Current level, read under the same lock as mutations.
    pub fn snapshot(&self) -> u64 {
        *self.value.lock()
    }

    /// Number of consumers currently parked on an empty store.
    pub fn waiting_consumers(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

/// Counts a parked consumer for as long as it is alive.
struct WaitingGuard<'a>(&'a AtomicUsize);

impl<'a> WaitingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
