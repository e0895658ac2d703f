use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::render::RenderError;
use crate::resume::archive::ArchiveError;
use crate::resume::validation::BulkRequestError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid bulk export request: {0}")]
    BulkRequest(#[from] BulkRequestError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details: Option<Value> = None;
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::BulkRequest(e) => {
                details = e.details();
                (StatusCode::BAD_REQUEST, e.code(), e.to_string())
            }
            AppError::Render(e) => {
                tracing::error!("Render error: {e}");
                let code = match e {
                    RenderError::Input { .. } => "RENDER_INPUT_ERROR",
                    RenderError::Engine(_) => "RENDER_ENGINE_ERROR",
                    RenderError::Timeout { .. } => "RENDER_TIMEOUT",
                    RenderError::Corrupt(_) => "RENDER_CORRUPT_OUTPUT",
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    code,
                    "Failed to generate resume".to_string(),
                )
            }
            AppError::Archive(e) => {
                tracing::error!("Archive error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ARCHIVE_ERROR",
                    "Failed to build the export archive".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
