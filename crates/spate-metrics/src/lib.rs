//! spate-metrics — observability for the spate demo producer.
//!
//! Holds the process-wide gauges and counters (store level, replica
//! counts, produced/consumed units) and renders them in the Prometheus
//! text exposition format.
//!
//! # Architecture
//!
//! ```text
//! DemoMetrics
//!   ├── set_store()      ← WorkloadStore after each mutation
//!   ├── set_replicas()   ← ReplicaTelemetry after each refresh
//!   └── snapshot() → MetricsSnapshot
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod gauges;
pub mod prometheus;

pub use gauges::{DemoMetrics, MetricsSnapshot};
pub use prometheus::render_prometheus;
