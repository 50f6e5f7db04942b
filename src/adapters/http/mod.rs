//! HTTP adapter: the anomaly scoring endpoint.
//!
//! Routes:
//! - `POST /api/anomaly`: score a batch of snapshots
//! - `POST /api/anomaly/explain`: per-metric breakdown of each snapshot
//! - `GET /health`: liveness and active threshold
//!
//! Every response body has the shape `{"success": bool, "data"?: ..., "error"?: ...}`.

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::{ScoreRequest, ScoringService};
use crate::domain::ScoreExplanation;
use crate::ports::AnomalyDetector;
use crate::PulsewatchError;

const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

impl ApiResponse<()> {
    fn err(msg: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        })
    }
}

#[derive(Debug, Serialize)]
struct ExplainResponse {
    explanations: Vec<ScoreExplanation>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    threshold: f64,
    uptime_seconds: i64,
    checked_at: DateTime<Utc>,
}

struct AppState<D>
where
    D: AnomalyDetector,
{
    service: ScoringService<D>,
    started_at: DateTime<Utc>,
}

/// Build the router for a scoring service.
pub fn router<D>(service: ScoringService<D>) -> Router
where
    D: AnomalyDetector + 'static,
{
    let state = Arc::new(AppState {
        service,
        started_at: Utc::now(),
    });

    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/health", get(health::<D>))
        .route(
            "/api/anomaly",
            post(score_readings::<D>).fallback(method_not_allowed),
        )
        .route(
            "/api/anomaly/explain",
            post(explain_readings::<D>).fallback(method_not_allowed),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn score_readings<D>(State(state): State<Arc<AppState<D>>>, body: Bytes) -> Response
where
    D: AnomalyDetector + 'static,
{
    match ScoreRequest::from_slice(&body) {
        Ok(request) => (StatusCode::OK, ApiResponse::ok(state.service.score(&request))).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn explain_readings<D>(State(state): State<Arc<AppState<D>>>, body: Bytes) -> Response
where
    D: AnomalyDetector + 'static,
{
    match ScoreRequest::from_slice(&body) {
        Ok(request) => {
            let explanations = state.service.explain(&request);
            (StatusCode::OK, ApiResponse::ok(ExplainResponse { explanations })).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn health<D>(State(state): State<Arc<AppState<D>>>) -> Response
where
    D: AnomalyDetector + 'static,
{
    let now = Utc::now();
    let body = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        threshold: state.service.detector().threshold(),
        uptime_seconds: (now - state.started_at).num_seconds(),
        checked_at: now,
    };
    (StatusCode::OK, ApiResponse::ok(body)).into_response()
}

async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, ApiResponse::err("Method not allowed")).into_response()
}

/// Every [`PulsewatchError`] describes bad caller input.
fn error_response(err: &PulsewatchError) -> Response {
    tracing::debug!("Rejected scoring request: {err}");
    (StatusCode::BAD_REQUEST, ApiResponse::err(err.to_string())).into_response()
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked while serving a request");
    (StatusCode::INTERNAL_SERVER_ERROR, ApiResponse::err(INTERNAL_ERROR)).into_response()
}
