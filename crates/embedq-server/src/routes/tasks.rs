//! Client endpoints: submit text, read status and results.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use embedq_core::{TaskId, TaskResult, TaskView};
use serde::{Deserialize, Serialize};

use super::parse_task_id;
use crate::auth::BearerAuth;
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTask {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedTask {
    pub id: TaskId,
}

/// POST /tasks -- submit a text for embedding.
async fn create_task(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Json(body): Json<CreateTask>,
) -> AppResult<Json<CreatedTask>> {
    let id = state.facade.submit(body.text).await?;
    tracing::info!(task_id = %id, "task created");
    Ok(Json(CreatedTask { id }))
}

/// GET /tasks/{id} -- status plus embedding or error.
async fn get_task(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<TaskView>> {
    let id = parse_task_id(&id)?;
    Ok(Json(state.facade.fetch(id).await?))
}

/// GET /tasks/{id}/result -- embedding only; 400 until completed.
async fn get_task_result(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<TaskResult>> {
    let id = parse_task_id(&id)?;
    Ok(Json(state.facade.fetch_result(id).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task))
        .route("/tasks/{id}", get(get_task))
        .route("/tasks/{id}/result", get(get_task_result))
}
