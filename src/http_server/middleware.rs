//! Request middleware
//!
//! - `require_bearer` authenticates the caller and stores its identity in the
//!   request extensions
//! - `track_metrics` records latency and counts per method, route and status

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::debug;
use uuid::Uuid;

use super::response::ApiError;
use super::state::AppState;
use crate::observability::normalize_path;

/// Authenticate the request or answer 401/500 without calling the handler
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.gate.authenticate(request.headers()) {
        Ok(caller) => {
            debug!(subject = caller.subject(), "caller authenticated");
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => {
            state.metrics.increment_auth_rejections();
            ApiError::from(e).into_response()
        }
    }
}

/// Route label: the matched route template, or the raw path with UUIDs
/// replaced when no route matched
fn route_label(request: &Request) -> String {
    match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => normalize_path(request.uri().path()),
    }
}

pub async fn track_metrics(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = route_label(&request);
    let start = Instant::now();

    let response = next.run(request).await;

    state
        .metrics
        .record_request(&method, &route, response.status().as_u16(), start.elapsed());
    response
}

/// Generates `x-request-id` values when the caller sent none
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        Uuid::new_v4().to_string().parse().ok().map(RequestId::new)
    }
}
