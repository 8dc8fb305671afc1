//! spate-api — HTTP surface of the producer.
//!
//! Provides axum route handlers around the shared work store, the
//! production parameters, and the replica telemetry.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Live chart page |
//! | GET | `/config?amount=&variation=` | Update production parameters |
//! | GET, POST | `/consume` | Take work from the store (may wait) |
//! | GET | `/metrics` | Prometheus exposition |
//! | GET | `/stats` | WebSocket stream of store and replica counts |

pub mod handlers;
pub mod stats;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;

use spate_metrics::DemoMetrics;
use spate_store::{ProductionParameters, WorkloadStore};
use spate_telemetry::ReplicaTelemetry;

pub use stats::{StatsSnapshot, StatsStreamer};

/// Default period between two pushes on a stats stream.
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(2);

/// Shared state for API handlers.
///
/// Built once at startup; every field is shared by reference.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<WorkloadStore>,
    pub params: Arc<ProductionParameters>,
    pub telemetry: Arc<ReplicaTelemetry>,
    pub metrics: Arc<DemoMetrics>,
    /// Period of each observer's stats stream.
    pub stats_interval: Duration,
    /// Upper bound on how long a consume request waits. `None` waits forever.
    pub consume_timeout: Option<Duration>,
}

/// Build the complete router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/config", get(handlers::configure))
        .route("/consume", get(handlers::consume).post(handlers::consume))
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/stats", get(stats::stats_socket))
        .with_state(state)
}
