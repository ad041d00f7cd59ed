pub mod embeddings;
pub mod health;
pub mod tasks;
pub mod worker;

use axum::Router;
use embedq_core::TaskId;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Every authenticated route: client, worker and OpenAI-compatible.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(tasks::router())
        .merge(worker::router())
        .merge(embeddings::router())
}

/// Ids that do not parse cannot exist, so they are reported like unknown ids.
pub(crate) fn parse_task_id(raw: &str) -> AppResult<TaskId> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Task not found".into()))
}
