//! Worker endpoints: claim the next task, report the outcome.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use embedq_core::ClaimedTask;
use serde::{Deserialize, Serialize};

use super::parse_task_id;
use crate::auth::BearerAuth;
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NextTask {
    /// `null` when nothing is pending; workers re-poll on their own schedule.
    pub task: Option<ClaimedTask>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub embedding: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct FailRequest {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ReportAccepted {
    pub status: &'static str,
}

/// POST /worker/next
async fn claim_next(_auth: BearerAuth, State(state): State<AppState>) -> AppResult<Json<NextTask>> {
    let task = state.facade.worker_claim().await?;
    Ok(Json(NextTask { task }))
}

/// POST /worker/complete/{id}
async fn complete(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CompleteRequest>,
) -> AppResult<Json<ReportAccepted>> {
    let id = parse_task_id(&id)?;
    state.facade.worker_complete(id, body.embedding).await?;
    Ok(Json(ReportAccepted {
        status: "completed",
    }))
}

/// POST /worker/fail/{id}
async fn fail(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FailRequest>,
) -> AppResult<Json<ReportAccepted>> {
    let id = parse_task_id(&id)?;
    state.facade.worker_fail(id, body.error).await?;
    Ok(Json(ReportAccepted { status: "failed" }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/worker/next", post(claim_next))
        .route("/worker/complete/{id}", post(complete))
        .route("/worker/fail/{id}", post(fail))
}
