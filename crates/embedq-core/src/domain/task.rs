//! Task record: the text, its outcome and timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{TaskId, TaskStatus};

/// What has happened to a task so far.
///
/// The payload lives on the variant, so an embedding can only exist on a
/// completed task and an error only on a failed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskOutcome {
    Pending,
    Processing,
    Completed { embedding: Vec<f64> },
    Failed { error: String },
}

impl TaskOutcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Pending => TaskStatus::Pending,
            TaskOutcome::Processing => TaskStatus::Processing,
            TaskOutcome::Completed { .. } => TaskStatus::Completed,
            TaskOutcome::Failed { .. } => TaskStatus::Failed,
        }
    }

    pub fn embedding(&self) -> Option<&[f64]> {
        match self {
            TaskOutcome::Completed { embedding } => Some(embedding),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TaskOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// A unit of work: one text submitted for embedding.
///
/// - `id` and `text` never change after creation.
/// - `updated_at` moves on every state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub outcome: TaskOutcome,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId, text: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            text,
            outcome: TaskOutcome::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.outcome.status()
    }

    /// Apply `next` if it is a forward edge from the current status.
    ///
    /// Returns `false` (and leaves the task untouched) otherwise.
    pub fn advance(&mut self, next: TaskOutcome, now: DateTime<Utc>) -> bool {
        if !self.status().can_transition_to(next.status()) {
            return false;
        }
        self.outcome = next;
        self.updated_at = now;
        true
    }
}
