//! HTTP surface regression tests.
//!
//! Drives the full router the daemon serves: configuration, consumption
//! (including waiting on an empty store), Prometheus exposition, and the
//! WebSocket stats stream over a real socket.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use tokio::sync::watch;
use tower::ServiceExt;

use spate_api::{ApiState, build_router};
use spate_metrics::DemoMetrics;
use spate_store::{Dice, Producer, ProductionParameters, ProductionSettings, WorkloadStore};
use spate_telemetry::{Orchestrator, OrchestratorError, ReplicaTelemetry, ServiceMode};

struct FixedDice(u64);

impl Dice for FixedDice {
    fn roll(&self, max: u64) -> u64 {
        self.0.min(max)
    }
}

/// Orchestrator stand-in; `None` simulates an unreachable engine.
#[derive(Default)]
struct FakeOrchestrator {
    counts: Mutex<Option<(u64, u64)>>,
}

impl FakeOrchestrator {
    fn set(&self, counts: Option<(u64, u64)>) {
        *self.counts.lock().unwrap() = counts;
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn service_mode(&self, service: &str) -> Result<ServiceMode, OrchestratorError> {
        match *self.counts.lock().unwrap() {
            Some((desired, _)) => Ok(ServiceMode::Replicated {
                replicas: Some(desired),
            }),
            None => Err(OrchestratorError::NotFound(service.to_string())),
        }
    }

    async fn running_tasks(&self, _service: &str) -> Result<u64, OrchestratorError> {
        match *self.counts.lock().unwrap() {
            Some((_, actual)) => Ok(actual),
            None => Err(OrchestratorError::Connect("connection refused".to_string())),
        }
    }
}

fn test_state(initial: u64, draw: u64) -> (ApiState, Arc<FakeOrchestrator>) {
    let metrics = Arc::new(DemoMetrics::new());
    let fake = Arc::new(FakeOrchestrator::default());
    let state = ApiState {
        store: Arc::new(WorkloadStore::new(
            initial,
            Arc::new(FixedDice(draw)),
            metrics.clone(),
        )),
        params: Arc::new(ProductionParameters::default()),
        telemetry: Arc::new(ReplicaTelemetry::new(fake.clone(), "consumer", metrics.clone())),
        metrics,
        stats_interval: Duration::from_millis(100),
        consume_timeout: None,
    };
    (state, fake)
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn index_page_served() {
    let (state, _) = test_state(40, 2);
    let resp = build_router(state).oneshot(get("/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("storeChart"));
}

#[tokio::test]
async fn config_updates_parameters() {
    let (state, _) = test_state(40, 2);
    let router = build_router(state.clone());

    let resp = router.oneshot(get("/config?amount=10&variation=0")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.params.get(), ProductionSettings { amount: 10, variation: 0 });
}

#[tokio::test]
async fn config_ignores_bad_field_but_applies_good_one() {
    let (state, _) = test_state(40, 2);
    let router = build_router(state.clone());

    let resp = router.oneshot(get("/config?amount=abc&variation=3")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.params.get(), ProductionSettings { amount: 5, variation: 3 });
}

#[tokio::test]
async fn config_repeated_key_uses_first_value() {
    let (state, _) = test_state(40, 2);
    let router = build_router(state.clone());

    let resp = router
        .oneshot(get("/config?amount=10&amount=12&variation=3"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.params.get(), ProductionSettings { amount: 10, variation: 3 });
}

#[tokio::test]
async fn config_without_query_is_accepted() {
    let (state, _) = test_state(40, 2);
    let resp = build_router(state.clone()).oneshot(get("/config")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.params.get(), ProductionSettings::default());
}

#[tokio::test]
async fn consume_post_returns_no_content() {
    let (state, _) = test_state(40, 2);
    let router = build_router(state.clone());

    state.store.produce(7);
    let req = Request::builder()
        .method("POST")
        .uri("/consume")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.store.snapshot(), 45);
}

#[tokio::test]
async fn consume_get_is_accepted() {
    let (state, _) = test_state(1, 2);
    let resp = build_router(state.clone()).oneshot(get("/consume")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.store.snapshot(), 0);
}

#[tokio::test(start_paused = true)]
async fn consume_on_empty_store_waits_for_producer() {
    let (state, _) = test_state(0, 2);
    let router = build_router(state.clone());

    let request = tokio::spawn(router.oneshot(get("/consume")));
    while state.store.waiting_consumers() == 0 {
        tokio::task::yield_now().await;
    }
    assert!(!request.is_finished());

    // The production loop unblocks it.
    let producer = Producer::new(
        state.store.clone(),
        state.params.clone(),
        Arc::new(FixedDice(0)),
        Duration::from_secs(1),
    );
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move { producer.run(shutdown_rx).await });

    let resp = request.await.unwrap().unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    // Default amount 5, no variation draw, minus 2 consumed.
    assert_eq!(state.store.snapshot(), 3);
}

#[tokio::test(start_paused = true)]
async fn consume_timeout_answers_unavailable() {
    let (mut state, _) = test_state(0, 2);
    state.consume_timeout = Some(Duration::from_secs(2));

    let resp = build_router(state).oneshot(get("/consume")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn metrics_expose_store_gauge() {
    let (state, fake) = test_state(40, 2);
    fake.set(Some((4, 3)));
    state.telemetry.refresh().await;
    state.store.produce(7);

    let resp = build_router(state).oneshot(get("/metrics")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let text = body_text(resp).await;
    assert!(text.contains("spate_demo_store 47\n"));
    assert!(text.contains("spate_demo_desired_replicas 4\n"));
    assert!(text.contains("spate_demo_actual_replicas 3\n"));
    assert!(text.contains("spate_demo_produced_total 7\n"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (state, _) = test_state(40, 2);
    let resp = build_router(state).oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_stream_over_websocket() {
    let (state, fake) = test_state(40, 2);
    fake.set(Some((3, 2)));
    let router = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/stats"))
        .await
        .unwrap();

    let first = ws.next().await.unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(first.to_text().unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"store": "40", "desiredReplicas": "3", "actualReplicas": "2"})
    );

    // Orchestrator outage: replica fields go stale, store stays live.
    fake.set(None);
    state.store.produce(5);
    loop {
        let msg = ws.next().await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
        if json["store"] == "45" {
            assert_eq!(json["desiredReplicas"], "3");
            assert_eq!(json["actualReplicas"], "2");
            break;
        }
    }

    ws.close(None).await.unwrap();
}
