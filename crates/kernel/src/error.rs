//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::aggregate::PlaceKeyError;
use crate::store::StoreError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("search store error")]
    Store(#[from] StoreError),
}

impl From<PlaceKeyError> for AppError {
    fn from(e: PlaceKeyError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

/// Failure envelope.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Store(StoreError::Request(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Store(_) => StatusCode::BAD_GATEWAY,
        };

        // Upstream details stay in the log, never in the body
        let error = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                "internal server error".to_string()
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "search store error");
                "search backend unavailable".to_string()
            }
            _ => self.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
