use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::classifier::RejectionReason;
use crate::generation::sanitizer::SanitizeError;
use crate::llm_client::LlmError;
use crate::render::RenderError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Mapping: validation and policy rejection -> 400, unknown profile -> 404,
/// everything after validation -> 500 with a plain-text
/// `PDF generation failed: <message>` body. No partial responses are sent.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("posting rejected ({0})")]
    Rejected(RejectionReason),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("model invocation failed: {0}")]
    Llm(#[from] LlmError),

    #[error("model output rejected: {0}")]
    Sanitize(#[from] SanitizeError),

    #[error("assembled resume is incomplete: {0}")]
    Incomplete(String),

    #[error("profile store error: {0}")]
    Store(#[from] StoreError),

    #[error("document rendering failed: {0}")]
    Render(#[from] RenderError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            AppError::Rejected(reason) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": reason.message(),
                    "locationType": reason,
                })),
            )
                .into_response(),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            other => {
                tracing::error!("pipeline failure: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("PDF generation failed: {other}"),
                )
                    .into_response()
            }
        }
    }
}
