use serde::{Deserialize, Serialize};

use crate::domain::TaskStatus;

/// Snapshot of how many tasks sit in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

impl QueueCounts {
    pub fn record(&mut self, status: TaskStatus) {
        self.add(status, 1);
    }

    pub fn add(&mut self, status: TaskStatus, n: usize) {
        match status {
            TaskStatus::Pending => self.pending += n,
            TaskStatus::Processing => self.processing += n,
            TaskStatus::Completed => self.completed += n,
            TaskStatus::Failed => self.failed += n,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.processing + self.completed + self.failed
    }
}
