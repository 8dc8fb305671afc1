//! Replica telemetry with a last-known-good cache.
//!
//! The cache is two atomics, independent from the work store lock. A
//! successful query overwrites its value; a failed one leaves it alone.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{debug, warn};

use spate_metrics::DemoMetrics;

use crate::error::TelemetryError;
use crate::orchestrator::{Orchestrator, ServiceMode};

/// Desired and running replica counts of the watched service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplicaSnapshot {
    pub desired: u64,
    pub actual: u64,
}

/// Polls the orchestrator for one service and remembers the last answers.
pub struct ReplicaTelemetry {
    orchestrator: Arc<dyn Orchestrator>,
    service: String,
    desired: AtomicU64,
    actual: AtomicU64,
    metrics: Arc<DemoMetrics>,
}

impl ReplicaTelemetry {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        service: impl Into<String>,
        metrics: Arc<DemoMetrics>,
    ) -> Self {
        Self {
            orchestrator,
            service: service.into(),
            desired: AtomicU64::new(0),
            actual: AtomicU64::new(0),
            metrics,
        }
    }

    /// Name of the watched service.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Check that the watched service can be inspected.
    ///
    /// Used once at startup; the caller decides whether failure is fatal.
    pub async fn probe(&self) -> Result<ServiceMode, TelemetryError> {
        self.orchestrator
            .service_mode(&self.service)
            .await
            .map_err(|source| TelemetryError::Unavailable {
                service: self.service.clone(),
                source,
            })
    }

    /// Query the desired replica count and cache it on success.
    pub async fn refresh_desired(&self) -> Result<u64, TelemetryError> {
        match self.probe().await? {
            ServiceMode::Replicated {
                replicas: Some(replicas),
            } => {
                self.desired.store(replicas, Ordering::Relaxed);
                Ok(replicas)
            }
            ServiceMode::Replicated { replicas: None } | ServiceMode::Global => {
                Err(TelemetryError::NotReplicatedMode {
                    service: self.service.clone(),
                })
            }
        }
    }

    /// Query the running replica count and cache it on success.
    pub async fn refresh_actual(&self) -> Result<u64, TelemetryError> {
        let running = self
            .orchestrator
            .running_tasks(&self.service)
            .await
            .map_err(|source| TelemetryError::Unavailable {
                service: self.service.clone(),
                source,
            })?;
        self.actual.store(running, Ordering::Relaxed);
        Ok(running)
    }

    /// Refresh both counts and return the best known values.
    ///
    /// Never fails: each query that errors is logged and its cached value
    /// is returned instead.
    pub async fn refresh(&self) -> ReplicaSnapshot {
        let (desired, actual) = tokio::join!(self.refresh_desired(), self.refresh_actual());

        if let Err(e) = desired {
            warn!(service = %self.service, error = %e, "counting desired replicas failed");
        }
        if let Err(e) = actual {
            warn!(service = %self.service, error = %e, "counting actual replicas failed");
        }

        let snapshot = self.cached();
        self.metrics.set_replicas(snapshot.desired, snapshot.actual);
        debug!(
            service = %self.service,
            desired = snapshot.desired,
            actual = snapshot.actual,
            "replica telemetry refreshed"
        );
        snapshot
    }

    /// Last known values without querying.
    pub fn cached(&self) -> ReplicaSnapshot {
        ReplicaSnapshot {
            desired: self.desired.load(Ordering::Relaxed),
            actual: self.actual.load(Ordering::Relaxed),
        }
    }
}
