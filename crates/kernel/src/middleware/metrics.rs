//! Request metrics middleware.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Label for requests that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

/// Count and time each request against its route template.
///
/// The template (`/api/business/locations/{place_id}/registrations`) is
/// used instead of the concrete path to keep label cardinality bounded.
/// Requests answered by the fallback carry no template and share one label.
pub async fn track_http_metrics(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    let response = next.run(request).await;

    state.metrics().record_request(
        &method,
        &route,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}
