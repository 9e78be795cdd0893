//! Observability HTTP Routes
//!
//! Unauthenticated liveness, version and metrics endpoints, plus the
//! fallback for unknown paths.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::response::JsonResponse;
use super::state::AppState;

pub const DOCS_URL: &str = "https://github.com/gerladeno/media-storage-service";

/// Create observability routes
pub fn observability_routes(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/version", get(version_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn ping_handler() -> impl IntoResponse {
    Json(JsonResponse::data("pong"))
}

async fn version_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(JsonResponse::data(state.version))
}

/// Metrics handler - Prometheus text exposition
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render_prometheus(),
    )
}

pub async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        format!("404 page not found. Check docs: {}", DOCS_URL),
    )
}
