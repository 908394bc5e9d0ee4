use crate::metrics::Metrics;
use crate::report::Reporter;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

#[derive(Clone)]
pub struct HttpAppState {
    pub metrics: Arc<Metrics>,
    pub reporter: Reporter,
}

pub fn build_router(metrics: Arc<Metrics>, reporter: Reporter) -> Router {
    Router::new()
        .route("/", get(check_handler))
        .route("/api/check", get(check_handler))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .with_state(HttpAppState { metrics, reporter })
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn check_handler(State(state): State<HttpAppState>) -> Response {
    let start = Instant::now();
    let report = state.reporter.check().await;
    state.metrics.observe_report(&report, start.elapsed());

    match serde_json::to_vec_pretty(&report) {
        Ok(body) => {
            let mut response = Response::new(Body::from(body));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(err) => {
            error!(error = %err, "failed to serialize report");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to serialize report: {err}"),
            )
                .into_response()
        }
    }
}

async fn metrics_handler(State(state): State<HttpAppState>) -> Response {
    match state.metrics.encode_metrics() {
        Ok(encoded) => {
            let mut response = Response::new(Body::from(encoded));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to encode metrics: {err}"),
        )
            .into_response(),
    }
}
