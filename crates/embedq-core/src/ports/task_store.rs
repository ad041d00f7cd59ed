//! TaskStore port - タスクの正本（source of truth）
//!
//! TaskStore は状態を永続化できる唯一のコンポーネントです。
//!
//! # 実装
//! - `impls::InMemoryTaskStore`: 開発・テスト用
//! - `impls::SqliteTaskStore`: SQLite（sqlx）

use async_trait::async_trait;

use crate::domain::{Task, TaskId, TaskOutcome, TaskStatus};
use crate::error::StoreError;
use crate::observability::QueueCounts;

/// Result of a conditional state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The row was in the expected state and now holds the new outcome.
    Applied(Task),

    /// No task with that id.
    NotFound,

    /// The task exists but is in `actual`, not the expected state.
    WrongState(TaskStatus),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }
}

/// TaskStore は状態の正本（source of truth）
///
/// # 設計原則
/// - `claim_oldest_pending` と `transition` はそれぞれ 1 つの不可分操作
///   （read してから別途 write する実装は不可）
/// - 無関係な行の更新は互いに待たない
/// - 拒否（NotFound / WrongState）はエラーではなく `Transition` で返す
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Create a `pending` task with fresh timestamps and a unique id.
    async fn insert(&self, text: String) -> Result<Task, StoreError>;

    /// Point lookup. No side effects.
    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Move the oldest `pending` task (by `created_at`, then id) to
    /// `processing` and return it. `None` when nothing is pending.
    async fn claim_oldest_pending(&self) -> Result<Option<Task>, StoreError>;

    /// Replace the outcome of `id` with `to` only if its current status is
    /// `from` and `from -> to.status()` is a forward edge.
    async fn transition(
        &self,
        id: TaskId,
        from: TaskStatus,
        to: TaskOutcome,
    ) -> Result<Transition, StoreError>;

    /// Number of tasks per status.
    async fn counts(&self) -> Result<QueueCounts, StoreError>;
}
