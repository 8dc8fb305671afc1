//! Error types for orchestrator queries and replica telemetry.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by an orchestrator backend.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid docker host: {0}")]
    InvalidHost(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{path} returned status {status}")]
    Status { path: String, status: u16 },

    #[error("decode error: {0}")]
    Decode(String),
}

/// Errors surfaced by a single telemetry query.
///
/// These never leave the telemetry poller except through its explicit
/// per-query methods; `refresh()` logs them and serves cached values.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("replica telemetry unavailable for service {service}: {source}")]
    Unavailable {
        service: String,
        #[source]
        source: OrchestratorError,
    },

    #[error("service {service} does not run with a fixed replica count")]
    NotReplicatedMode { service: String },
}
