//! HTTP route handlers.

pub mod health;
pub mod locations;
pub mod metrics;
pub mod persons;

use axum::Router;

use crate::error::AppError;
use crate::middleware::track_http_metrics;
use crate::state::AppState;

/// All kernel routes with request metrics attached.
///
/// Transport layers (CORS, tracing) are added by the caller.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(metrics::router())
        .merge(locations::router())
        .merge(persons::router())
        .fallback(|| async { AppError::NotFound })
        // After the fallback so unmatched requests are counted too
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            track_http_metrics,
        ))
        .with_state(state)
}
