//! Gauges and counters exported by the producer.
//!
//! Every value is a plain atomic. Writers update them after the guarded
//! state they mirror has changed, so a scrape may lag one mutation behind
//! but never blocks the writer.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

/// Point-in-time copy of all exported values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Pending work units in the store.
    pub store: u64,
    /// Desired replicas of the watched service (last known).
    pub desired_replicas: u64,
    /// Running replicas of the watched service (last known).
    pub actual_replicas: u64,
    /// Units added by production since start.
    pub produced_total: u64,
    /// Units removed by consumption since start.
    pub consumed_total: u64,
}

/// Write-mostly metrics side channel shared by the store, the telemetry
/// poller, and the `/metrics` handler.
#[derive(Debug, Default)]
pub struct DemoMetrics {
    store: AtomicU64,
    desired_replicas: AtomicU64,
    actual_replicas: AtomicU64,
    produced_total: AtomicU64,
    consumed_total: AtomicU64,
}

impl DemoMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the store level after a mutation.
    pub fn set_store(&self, value: u64) {
        self.store.store(value, Ordering::Relaxed);
        trace!(store = value, "store gauge updated");
    }

    /// Record the last known replica counts.
    pub fn set_replicas(&self, desired: u64, actual: u64) {
        self.desired_replicas.store(desired, Ordering::Relaxed);
        self.actual_replicas.store(actual, Ordering::Relaxed);
    }

    pub fn add_produced(&self, units: u64) {
        self.produced_total.fetch_add(units, Ordering::Relaxed);
    }

    pub fn add_consumed(&self, units: u64) {
        self.consumed_total.fetch_add(units, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            store: self.store.load(Ordering::Relaxed),
            desired_replicas: self.desired_replicas.load(Ordering::Relaxed),
            actual_replicas: self.actual_replicas.load(Ordering::Relaxed),
            produced_total: self.produced_total.load(Ordering::Relaxed),
            consumed_total: self.consumed_total.load(Ordering::Relaxed),
        }
    }
}
