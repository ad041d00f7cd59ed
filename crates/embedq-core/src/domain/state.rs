//! Task state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task status.
///
/// State transitions:
/// - Pending -> Processing (claim)
/// - Processing -> Completed (worker reports an embedding)
/// - Processing -> Failed (worker reports an error)
///
/// Completed and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Submitted, waiting for a worker.
    Pending,

    /// Claimed by exactly one worker.
    Processing,

    /// Embedding attached.
    Completed,

    /// Error message attached.
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether `self -> next` is an edge of the state machine.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TaskStatus::Pending, TaskStatus::Processing, true)]
    #[case(TaskStatus::Processing, TaskStatus::Completed, true)]
    #[case(TaskStatus::Processing, TaskStatus::Failed, true)]
    #[case(TaskStatus::Pending, TaskStatus::Completed, false)]
    #[case(TaskStatus::Pending, TaskStatus::Failed, false)]
    #[case(TaskStatus::Processing, TaskStatus::Pending, false)]
    #[case(TaskStatus::Completed, TaskStatus::Failed, false)]
    #[case(TaskStatus::Failed, TaskStatus::Completed, false)]
    #[case(TaskStatus::Completed, TaskStatus::Processing, false)]
    fn transitions_only_move_forward(
        #[case] from: TaskStatus,
        #[case] to: TaskStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn terminal_states_have_no_exits() {
        let all = [
            TaskStatus::Pending,
            TaskStatus::Processing,
            TaskStatus::Completed,
            TaskStatus::Failed,
        ];
        for from in all.iter().copied().filter(|s| s.is_terminal()) {
            assert!(all.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn parses_its_own_display() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Processing,
            TaskStatus::Completed,
            TaskStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<TaskStatus>(), Ok(status));
        }
        assert!("done".parse::<TaskStatus>().is_err());
    }
}
