//! Queue coordinator: submit / claim / complete / fail over a [`TaskStore`].
//!
//! Design intent:
//! - The store owns every mutation; the coordinator only decides which
//!   conditional transition to ask for.
//! - Empty queue is `Ok(None)`, a rejected report is `Ok(Transition::..)`.
//!   Only backend failures are `Err`.

use std::sync::Arc;

use crate::domain::{Task, TaskId, TaskOutcome, TaskStatus};
use crate::error::QueueError;
use crate::observability::QueueCounts;
use crate::ports::{TaskStore, Transition};

pub struct TaskQueue {
    store: Arc<dyn TaskStore>,
}

impl TaskQueue {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Enqueue a new task in `pending`.
    pub async fn submit(&self, text: impl Into<String>) -> Result<TaskId, QueueError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QueueError::EmptyText);
        }

        let task = self.store.insert(text).await?;
        tracing::debug!(task_id = %task.id, "task submitted");
        Ok(task.id)
    }

    /// Claim the oldest pending task (`pending -> processing`).
    ///
    /// Never waits for work: returns `None` immediately when nothing is pending.
    pub async fn claim_next(&self) -> Result<Option<Task>, QueueError> {
        let claimed = self.store.claim_oldest_pending().await?;
        match &claimed {
            Some(task) => tracing::debug!(task_id = %task.id, "task claimed"),
            None => tracing::trace!("claim found no pending task"),
        }
        Ok(claimed)
    }

    /// `processing -> completed`, attaching the embedding.
    pub async fn complete(
        &self,
        id: TaskId,
        embedding: Vec<f64>,
    ) -> Result<Transition, QueueError> {
        self.report(id, TaskOutcome::Completed { embedding }).await
    }

    /// `processing -> failed`, attaching the error message.
    pub async fn fail(&self, id: TaskId, error: impl Into<String>) -> Result<Transition, QueueError> {
        self.report(
            id,
            TaskOutcome::Failed {
                error: error.into(),
            },
        )
        .await
    }

    pub async fn get(&self, id: TaskId) -> Result<Option<Task>, QueueError> {
        Ok(self.store.get(id).await?)
    }

    pub async fn counts(&self) -> Result<QueueCounts, QueueError> {
        Ok(self.store.counts().await?)
    }

    async fn report(&self, id: TaskId, outcome: TaskOutcome) -> Result<Transition, QueueError> {
        let target = outcome.status();
        let result = self
            .store
            .transition(id, TaskStatus::Processing, outcome)
            .await?;

        match &result {
            Transition::Applied(_) => {
                tracing::info!(task_id = %id, status = %target, "task finished");
            }
            Transition::NotFound => {
                tracing::warn!(task_id = %id, status = %target, "report for unknown task rejected");
            }
            Transition::WrongState(actual) => {
                tracing::warn!(
                    task_id = %id,
                    status = %target,
                    actual = %actual,
                    "report for task not in processing rejected"
                );
            }
        }
        Ok(result)
    }
}
