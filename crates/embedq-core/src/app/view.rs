//! Shapes handed to callers of [`TaskFacade`](super::TaskFacade).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Task, TaskId, TaskOutcome, TaskStatus};

/// Full view of a task: status plus whichever payload that status carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: TaskId,
    pub text: String,
    pub status: TaskStatus,
    pub embedding: Option<Vec<f64>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        let status = task.status();
        let (embedding, error) = match task.outcome {
            TaskOutcome::Completed { embedding } => (Some(embedding), None),
            TaskOutcome::Failed { error } => (None, Some(error)),
            TaskOutcome::Pending | TaskOutcome::Processing => (None, None),
        };

        Self {
            id: task.id,
            text: task.text,
            status,
            embedding,
            error,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Embedding of a completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: TaskId,
    pub embedding: Vec<f64>,
}

/// What a worker needs to process a claimed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedTask {
    pub id: TaskId,
    pub text: String,
}

impl From<Task> for ClaimedTask {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            text: task.text,
        }
    }
}

/// Result of a bounded wait on a freshly submitted task.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    /// Reached `completed` or `failed` within the bound.
    Finished(TaskView),

    /// Still `pending` or `processing` when the bound elapsed.
    Pending(TaskView),
}
