use axum::extract::State;
use axum::{Json, Router, routing::get};
use embedq_core::QueueCounts;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the task store cannot be read.
    pub status: &'static str,
    pub version: &'static str,
    pub counts: Option<QueueCounts>,
}

/// GET /health -- unauthenticated liveness plus queue depth.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let counts = match state.facade.counts().await {
        Ok(counts) => Some(counts),
        Err(e) => {
            tracing::warn!(error = %e, "health check could not read task counts");
            None
        }
    };

    Json(HealthResponse {
        status: if counts.is_some() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        counts,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
