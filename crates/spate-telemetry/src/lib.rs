//! spate-telemetry — replica counts of the watched worker service.
//!
//! Queries an [`Orchestrator`] for the desired and running replica counts
//! of one named service and keeps the last values that were read
//! successfully. A failed query is logged and the cached value is served
//! instead, so the stats stream never stalls on the orchestrator.
//!
//! # Architecture
//!
//! ```text
//! ReplicaTelemetry
//!   ├── refresh_desired() → Orchestrator::service_mode()
//!   ├── refresh_actual()  → Orchestrator::running_tasks()
//!   └── refresh() → ReplicaSnapshot (fresh or last known)
//!
//! DockerOrchestrator (Docker Engine API, swarm mode)
//!   ├── GET /services/{name}
//!   └── GET /tasks?filters=...
//! ```

pub mod docker;
pub mod error;
pub mod orchestrator;
pub mod poller;

pub use docker::{DockerEndpoint, DockerOrchestrator};
pub use error::{OrchestratorError, TelemetryError};
pub use orchestrator::{Orchestrator, ServiceMode};
pub use poller::{ReplicaSnapshot, ReplicaTelemetry};
