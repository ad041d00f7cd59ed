use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use embedq_core::FacadeError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`FacadeError`] and adds HTTP-specific variants. Every variant turns
/// into a JSON body `{"error": ..., "code": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Facade(#[from] FacadeError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The worker reported a failure for a task the caller was waiting on.
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Facade(err) => match err {
                FacadeError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                FacadeError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", "Task not found".to_string())
                }
                FacadeError::Rejected { .. } => {
                    (StatusCode::BAD_REQUEST, "INVALID_STATE", err.to_string())
                }
                FacadeError::NotCompleted { .. } => {
                    (StatusCode::BAD_REQUEST, "NOT_COMPLETED", err.to_string())
                }
                FacadeError::Store(store) => {
                    tracing::error!(error = %store, "task store error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::TaskFailed(msg) => (StatusCode::BAD_GATEWAY, "TASK_FAILED", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
