//! TaskFacade - client / worker 向けの境界
//!
//! # 設計原則
//! - 状態を持たない（`Arc<TaskQueue>` のみ）
//! - スケジューリングの判断をしない
//! - 入力検証と、Transition -> FacadeError の変換だけを行う

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use super::view::{ClaimedTask, TaskResult, TaskView, WaitOutcome};
use crate::domain::{TaskId, TaskOutcome, TaskStatus};
use crate::error::{QueueError, StoreError};
use crate::observability::QueueCounts;
use crate::ports::Transition;
use crate::queue::TaskQueue;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("task {id} is {status}, not processing")]
    Rejected { id: TaskId, status: TaskStatus },

    #[error("task {id} is not completed (status: {status})")]
    NotCompleted { id: TaskId, status: TaskStatus },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<QueueError> for FacadeError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::EmptyText => FacadeError::Validation(err.to_string()),
            QueueError::Store(e) => FacadeError::Store(e),
        }
    }
}

pub struct TaskFacade {
    queue: Arc<TaskQueue>,
    poll_interval: Duration,
}

impl TaskFacade {
    pub fn new(queue: Arc<TaskQueue>) -> Self {
        Self {
            queue,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// How often `submit_and_wait` re-reads the task.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    // ---- client side ----

    pub async fn submit(&self, text: impl Into<String>) -> Result<TaskId, FacadeError> {
        Ok(self.queue.submit(text).await?)
    }

    pub async fn fetch(&self, id: TaskId) -> Result<TaskView, FacadeError> {
        self.queue
            .get(id)
            .await?
            .map(TaskView::from)
            .ok_or(FacadeError::NotFound(id))
    }

    pub async fn fetch_result(&self, id: TaskId) -> Result<TaskResult, FacadeError> {
        let task = self.queue.get(id).await?.ok_or(FacadeError::NotFound(id))?;

        match task.outcome {
            TaskOutcome::Completed { embedding } => Ok(TaskResult { id, embedding }),
            other => Err(FacadeError::NotCompleted {
                id,
                status: other.status(),
            }),
        }
    }

    /// Submit, then poll until the task is terminal or `wait` elapses.
    ///
    /// Never blocks past `wait`; a task still in flight at the bound comes
    /// back as [`WaitOutcome::Pending`].
    pub async fn submit_and_wait(
        &self,
        text: impl Into<String>,
        wait: Duration,
    ) -> Result<WaitOutcome, FacadeError> {
        let id = self.submit(text).await?;
        let deadline = Instant::now() + wait;

        loop {
            let view = self.fetch(id).await?;
            if view.status.is_terminal() {
                return Ok(WaitOutcome::Finished(view));
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::debug!(task_id = %id, status = %view.status, "bounded wait elapsed");
                return Ok(WaitOutcome::Pending(view));
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    pub async fn counts(&self) -> Result<QueueCounts, FacadeError> {
        Ok(self.queue.counts().await?)
    }

    // ---- worker side ----

    pub async fn worker_claim(&self) -> Result<Option<ClaimedTask>, FacadeError> {
        Ok(self.queue.claim_next().await?.map(ClaimedTask::from))
    }

    pub async fn worker_complete(
        &self,
        id: TaskId,
        embedding: Vec<f64>,
    ) -> Result<(), FacadeError> {
        if embedding.is_empty() {
            return Err(FacadeError::Validation("embedding must not be empty".into()));
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(FacadeError::Validation(
                "embedding must contain only finite numbers".into(),
            ));
        }

        let result = self.queue.complete(id, embedding).await?;
        accept(id, result)
    }

    pub async fn worker_fail(&self, id: TaskId, error: impl Into<String>) -> Result<(), FacadeError> {
        let error = error.into();
        if error.trim().is_empty() {
            return Err(FacadeError::Validation("error message must not be empty".into()));
        }

        let result = self.queue.fail(id, error).await?;
        accept(id, result)
    }
}

fn accept(id: TaskId, result: Transition) -> Result<(), FacadeError> {
    match result {
        Transition::Applied(_) => Ok(()),
        Transition::NotFound => Err(FacadeError::NotFound(id)),
        Transition::WrongState(status) => Err(FacadeError::Rejected { id, status }),
    }
}
