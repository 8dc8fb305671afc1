//! The orchestrator seam.

use async_trait::async_trait;

use crate::error::OrchestratorError;

/// How the orchestrator schedules a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    /// Fixed replica count. `None` when the orchestrator reports the mode
    /// without a count.
    Replicated { replicas: Option<u64> },
    /// One task per node.
    Global,
}

/// Read-only, best-effort queries against the fleet orchestrator.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Inspect how `service` is scheduled.
    async fn service_mode(&self, service: &str) -> Result<ServiceMode, OrchestratorError>;

    /// Count tasks of `service` that are currently running.
    async fn running_tasks(&self, service: &str) -> Result<u64, OrchestratorError>;
}
