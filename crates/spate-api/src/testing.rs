//! Test fixtures shared by the handler and stream tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use spate_metrics::DemoMetrics;
use spate_store::{Dice, ProductionParameters, WorkloadStore};
use spate_telemetry::{Orchestrator, OrchestratorError, ReplicaTelemetry, ServiceMode};

use crate::{ApiState, DEFAULT_STATS_INTERVAL};

/// Always draws `self.0`, capped at the requested maximum.
pub struct FixedDice(pub u64);

impl Dice for FixedDice {
    fn roll(&self, max: u64) -> u64 {
        self.0.min(max)
    }
}

/// Scripted orchestrator; `None` makes the query fail.
#[derive(Default)]
pub struct FakeOrchestrator {
    replicas: Mutex<Option<u64>>,
    running: Mutex<Option<u64>>,
}

impl FakeOrchestrator {
    pub fn set(&self, replicas: Option<u64>, running: Option<u64>) {
        *self.replicas.lock().unwrap() = replicas;
        *self.running.lock().unwrap() = running;
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn service_mode(&self, service: &str) -> Result<ServiceMode, OrchestratorError> {
        match *self.replicas.lock().unwrap() {
            Some(n) => Ok(ServiceMode::Replicated { replicas: Some(n) }),
            None => Err(OrchestratorError::NotFound(service.to_string())),
        }
    }

    async fn running_tasks(&self, _service: &str) -> Result<u64, OrchestratorError> {
        self.running
            .lock()
            .unwrap()
            .ok_or_else(|| OrchestratorError::Connect("connection refused".to_string()))
    }
}

/// API state over a store holding `initial` units whose consumptions
/// always draw `draw`.
pub fn test_state(initial: u64, draw: u64) -> (ApiState, Arc<FakeOrchestrator>) {
    let metrics = Arc::new(DemoMetrics::new());
    let fake = Arc::new(FakeOrchestrator::default());
    let store = Arc::new(WorkloadStore::new(
        initial,
        Arc::new(FixedDice(draw)),
        metrics.clone(),
    ));
    let telemetry = Arc::new(ReplicaTelemetry::new(fake.clone(), "consumer", metrics.clone()));

    let state = ApiState {
        store,
        params: Arc::new(ProductionParameters::default()),
        telemetry,
        metrics,
        stats_interval: DEFAULT_STATS_INTERVAL,
        consume_timeout: None,
    };
    (state, fake)
}
