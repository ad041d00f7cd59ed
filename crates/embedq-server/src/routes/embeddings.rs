//! OpenAI-compatible `POST /v1/embeddings` on top of the queue.
//!
//! The request is queued like any other task and the handler waits (bounded
//! by `SUBMIT_WAIT_MAX_SECS`) for a worker to finish it. When the bound runs
//! out the caller gets `202` with the task id and continues via `/tasks/{id}`.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use embedq_core::{TaskId, TaskStatus, WaitOutcome};
use serde::{Deserialize, Serialize};

use crate::auth::BearerAuth;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const DEFAULT_MODEL: &str = "embedq";

#[derive(Debug, Deserialize)]
pub struct EmbeddingsRequest {
    pub input: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Seconds to wait for a worker; clamped to the server maximum.
    #[serde(default)]
    pub wait_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingData {
    pub object: &'static str,
    pub index: usize,
    pub embedding: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingsResponse {
    pub object: &'static str,
    pub data: Vec<EmbeddingData>,
    pub model: String,
}

/// Body of the `202` returned when the wait bound elapses first.
#[derive(Debug, Serialize)]
pub struct Accepted {
    pub id: TaskId,
    pub status: TaskStatus,
}

async fn create_embeddings(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Json(body): Json<EmbeddingsRequest>,
) -> AppResult<Response> {
    let max_wait = state.config.submit_wait_max();
    let wait = body
        .wait_secs
        .map(Duration::from_secs)
        .map_or(max_wait, |w| w.min(max_wait));
    let model = body.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());

    match state.facade.submit_and_wait(body.input, wait).await? {
        WaitOutcome::Finished(view) => match (view.embedding, view.error) {
            (Some(embedding), _) => Ok(Json(EmbeddingsResponse {
                object: "list",
                data: vec![EmbeddingData {
                    object: "embedding",
                    index: 0,
                    embedding,
                }],
                model,
            })
            .into_response()),
            (None, error) => Err(AppError::TaskFailed(error.unwrap_or_default())),
        },
        WaitOutcome::Pending(view) => {
            tracing::debug!(task_id = %view.id, wait_secs = wait.as_secs(), "embedding not ready, acknowledging");
            Ok((
                StatusCode::ACCEPTED,
                Json(Accepted {
                    id: view.id,
                    status: view.status,
                }),
            )
                .into_response())
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/embeddings", post(create_embeddings))
}
