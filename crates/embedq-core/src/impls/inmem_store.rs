//! InMemoryTaskStore - 開発・テスト用の TaskStore
//!
//! # 実装詳細
//! - 行ごとに `Mutex<Task>` を持ち、状態遷移はその行のロック内で完結する
//! - pending 行は `(created_at, id)` 順の BTreeSet で管理する
//! - ロック順序は常に pending -> rows -> row（逆順で取らない）

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::domain::{Task, TaskId, TaskOutcome, TaskStatus};
use crate::error::StoreError;
use crate::observability::QueueCounts;
use crate::ports::{Clock, IdGenerator, SystemClock, TaskStore, Transition, UlidGenerator};

/// Claim order: earliest `created_at`, then id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PendingKey {
    created_at: DateTime<Utc>,
    id: TaskId,
}

type Row = Arc<Mutex<Task>>;

pub struct InMemoryTaskStore {
    /// All task rows (single source of truth).
    rows: RwLock<HashMap<TaskId, Row>>,

    /// Claim candidates. May hold stale keys for rows that already left
    /// `pending` through `transition`; claim skips those.
    pending: Mutex<BTreeSet<PendingKey>>,

    clock: Arc<dyn Clock>,
    ids: UlidGenerator<Arc<dyn Clock>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            pending: Mutex::new(BTreeSet::new()),
            ids: UlidGenerator::new(Arc::clone(&clock)),
            clock,
        }
    }

    async fn row(&self, id: TaskId) -> Option<Row> {
        self.rows.read().await.get(&id).cloned()
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, text: String) -> Result<Task, StoreError> {
        let now = self.clock.now();
        let id = self.ids.generate_task_id();
        let task = Task::new(id, text, now);

        // row を先に入れる: pending に見えた時点で必ず row が引ける
        self.rows
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(task.clone())));
        self.pending.lock().await.insert(PendingKey {
            created_at: now,
            id,
        });

        Ok(task)
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let Some(row) = self.row(id).await else {
            return Ok(None);
        };
        let task = row.lock().await.clone();
        Ok(Some(task))
    }

    async fn claim_oldest_pending(&self) -> Result<Option<Task>, StoreError> {
        let mut pending = self.pending.lock().await;

        while let Some(key) = pending.pop_first() {
            let Some(row) = self.row(key.id).await else {
                continue;
            };
            let mut task = row.lock().await;
            if task.advance(TaskOutcome::Processing, self.clock.now()) {
                return Ok(Some(task.clone()));
            }
            tracing::debug!(task_id = %key.id, status = %task.status(), "dropping stale pending key");
        }

        Ok(None)
    }

    async fn transition(
        &self,
        id: TaskId,
        from: TaskStatus,
        to: TaskOutcome,
    ) -> Result<Transition, StoreError> {
        let Some(row) = self.row(id).await else {
            return Ok(Transition::NotFound);
        };

        let mut task = row.lock().await;
        let actual = task.status();
        if actual != from || !task.advance(to, self.clock.now()) {
            return Ok(Transition::WrongState(actual));
        }

        Ok(Transition::Applied(task.clone()))
    }

    async fn counts(&self) -> Result<QueueCounts, StoreError> {
        let rows: Vec<Row> = self.rows.read().await.values().cloned().collect();

        let mut counts = QueueCounts::default();
        for row in rows {
            counts.record(row.lock().await.status());
        }
        Ok(counts)
    }
}
