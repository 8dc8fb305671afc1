//! HTTP handlers.
//!
//! Orchestrator failures never reach these handlers: configuration and
//! consumption only touch the local store and parameters.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use tracing::{debug, warn};

use crate::ApiState;

const INDEX_PAGE: &str = include_str!("../assets/index.html");

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

// ── Production parameters ──────────────────────────────────────

/// Raw query of a configuration request.
///
/// Values stay strings so that one malformed field does not reject the
/// whole request. A repeated key keeps its first value.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConfigQuery {
    pub amount: Option<String>,
    pub variation: Option<String>,
}

impl ConfigQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "amount" => &mut query.amount,
                "variation" => &mut query.variation,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// GET /config?amount=<int>&variation=<int>
pub async fn configure(
    State(state): State<ApiState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let query = ConfigQuery::from_pairs(pairs);
    let settings = state
        .params
        .apply_raw(query.amount.as_deref(), query.variation.as_deref());
    ApiResponse::ok(settings)
}

// ── Consumption ────────────────────────────────────────────────

/// GET|POST /consume
///
/// Waits until the store has work, takes some, and answers 204. Without a
/// configured timeout the request can stay open indefinitely.
pub async fn consume(State(state): State<ApiState>) -> impl IntoResponse {
    match state.consume_timeout {
        None => {
            let removed = state.store.consume().await;
            debug!(removed, "consume request served");
            StatusCode::NO_CONTENT.into_response()
        }
        Some(timeout) => match state.store.consume_within(timeout).await {
            Ok(removed) => {
                debug!(removed, "consume request served");
                StatusCode::NO_CONTENT.into_response()
            }
            Err(e) => {
                warn!(error = %e, "consume request gave up");
                error_response(&e.to_string(), StatusCode::SERVICE_UNAVAILABLE).into_response()
            }
        },
    }
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = spate_metrics::render_prometheus(&state.metrics.snapshot());
    (
        StatusCode::OK,
        [("content-type", spate_metrics::prometheus::CONTENT_TYPE)],
        body,
    )
}
