use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::assessment::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Per-question evaluator failures and empty aggregations never reach this type:
/// the controller recovers from both locally.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Persistence error: {0}")]
    Persistence(StoreError),

    #[error("Evaluation timed out after {0}s")]
    EvaluationTimeout(u64),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidData { .. } => AppError::UnprocessableEntity(err.to_string()),
            other => AppError::Persistence(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error, details) = match &self {
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Not found",
                msg.clone(),
            ),
            AppError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
                "Invalid request",
                msg.clone(),
            ),
            AppError::UnprocessableEntity(msg) => {
                tracing::warn!("Unprocessable submission: {msg}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNPROCESSABLE_ENTITY",
                    "Submission data is malformed",
                    msg.clone(),
                )
            }
            AppError::Persistence(e) => {
                tracing::error!("Persistence error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "Failed to store the report",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::EvaluationTimeout(secs) => {
                tracing::error!("Evaluation timed out after {secs}s");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EVALUATION_TIMEOUT",
                    "Failed to generate the report",
                    format!("Evaluation did not finish within {secs}s; no report was written"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error,
            "code": code,
            "details": details
        }));

        (status, body).into_response()
    }
}
