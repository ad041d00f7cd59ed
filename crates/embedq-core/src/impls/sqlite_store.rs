//! SQLite implementation of [`TaskStore`].
//!
//! Uses [`sqlx`] with the `sqlite` feature.  Migrations are embedded at
//! compile time from `./migrations` and run by [`SqliteTaskStore::connect`].
//!
//! # Atomicity
//!
//! Claim and transition are each one `UPDATE ... RETURNING` statement, so the
//! "check current status" and "write new status" halves cannot interleave with
//! another writer.  Only after a transition misses is the row read again, to
//! tell the caller whether the id is unknown or the task has moved on.
//!
//! # Timestamps
//!
//! Stored as fixed-width RFC 3339 with microseconds (`...T12:00:00.000000Z`)
//! so text order equals time order.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::domain::{Task, TaskId, TaskOutcome, TaskStatus};
use crate::error::StoreError;
use crate::observability::QueueCounts;
use crate::ports::{Clock, IdGenerator, SystemClock, TaskStore, Transition, UlidGenerator};

const COLUMNS: &str = "id, text, status, embedding, error, created_at, updated_at";

type TaskRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

/// SQLite-backed task store.
pub struct SqliteTaskStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    ids: UlidGenerator<Arc<dyn Clock>>,
}

impl SqliteTaskStore {
    /// Open (or create) the database at `url` and run pending migrations.
    ///
    /// `url` is a sqlx SQLite URL, e.g. `"sqlite://embedq.db"` or
    /// `"sqlite::memory:"` for tests.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        Self::connect_with_clock(url, Arc::new(SystemClock)).await
    }

    pub async fn connect_with_clock(url: &str, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // :memory: は接続ごとに別 DB になるので 1 本を使い回す
        let pool = if url.contains(":memory:") || url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(8)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(url, "sqlite task store ready");

        Ok(Self {
            pool,
            ids: UlidGenerator::new(Arc::clone(&clock)),
            clock,
        })
    }

    /// Close every pooled connection. Further calls fail with a pool error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(6)
    }

    /// Explain why a conditional update touched nothing.
    async fn rejection(&self, id: TaskId) -> Result<Transition, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT status FROM tasks WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            None => Ok(Transition::NotFound),
            Some((status,)) => {
                let status = status.parse::<TaskStatus>().map_err(|e| StoreError::Corrupt {
                    id: id.to_string(),
                    reason: format!("{e}"),
                })?;
                Ok(Transition::WrongState(status))
            }
        }
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_row(row: TaskRow) -> Result<Task, StoreError> {
    let (id, text, status, embedding, error, created_at, updated_at) = row;
    let corrupt = |reason: String| StoreError::Corrupt {
        id: id.clone(),
        reason,
    };

    let task_id = id.parse::<TaskId>().map_err(|e| corrupt(format!("{e}")))?;
    let status = status
        .parse::<TaskStatus>()
        .map_err(|e| corrupt(format!("{e}")))?;
    let parse_ts = |raw: &str| {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| corrupt(format!("timestamp {raw:?}: {e}")))
    };

    let outcome = match (status, embedding, error) {
        (TaskStatus::Pending, None, None) => TaskOutcome::Pending,
        (TaskStatus::Processing, None, None) => TaskOutcome::Processing,
        (TaskStatus::Completed, Some(raw), None) => TaskOutcome::Completed {
            embedding: serde_json::from_str(&raw).map_err(|e| corrupt(format!("embedding: {e}")))?,
        },
        (TaskStatus::Failed, None, Some(error)) => TaskOutcome::Failed { error },
        (status, ..) => return Err(corrupt(format!("payload does not match status {status}"))),
    };

    Ok(Task {
        id: task_id,
        text,
        outcome,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn insert(&self, text: String) -> Result<Task, StoreError> {
        let now = self.now();
        let id = self.ids.generate_task_id();

        sqlx::query(
            "INSERT INTO tasks (id, text, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4)",
        )
        .bind(id.to_string())
        .bind(&text)
        .bind(TaskStatus::Pending.as_str())
        .bind(format_ts(now))
        .execute(&self.pool)
        .await?;

        Ok(Task::new(id, text, now))
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1");
        let row: Option<TaskRow> = sqlx::query_as(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(decode_row).transpose()
    }

    async fn claim_oldest_pending(&self) -> Result<Option<Task>, StoreError> {
        let query = format!(
            "UPDATE tasks \
             SET status = ?1, updated_at = ?2 \
             WHERE id = ( \
                 SELECT id FROM tasks \
                 WHERE status = ?3 \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT 1 \
             ) AND status = ?3 \
             RETURNING {COLUMNS}"
        );
        let row: Option<TaskRow> = sqlx::query_as(&query)
            .bind(TaskStatus::Processing.as_str())
            .bind(format_ts(self.now()))
            .bind(TaskStatus::Pending.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(decode_row).transpose()
    }

    async fn transition(
        &self,
        id: TaskId,
        from: TaskStatus,
        to: TaskOutcome,
    ) -> Result<Transition, StoreError> {
        if !from.can_transition_to(to.status()) {
            return self.rejection(id).await;
        }

        let embedding = to
            .embedding()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Corrupt {
                id: id.to_string(),
                reason: format!("embedding: {e}"),
            })?;

        let query = format!(
            "UPDATE tasks \
             SET status = ?1, embedding = ?2, error = ?3, updated_at = ?4 \
             WHERE id = ?5 AND status = ?6 \
             RETURNING {COLUMNS}"
        );
        let row: Option<TaskRow> = sqlx::query_as(&query)
            .bind(to.status().as_str())
            .bind(embedding)
            .bind(to.error())
            .bind(format_ts(self.now()))
            .bind(id.to_string())
            .bind(from.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Transition::Applied(decode_row(row)?)),
            None => self.rejection(id).await,
        }
    }

    async fn counts(&self) -> Result<QueueCounts, StoreError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM tasks GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = QueueCounts::default();
        for (status, n) in rows {
            let status = status.parse::<TaskStatus>().map_err(|e| StoreError::Corrupt {
                id: "*".into(),
                reason: format!("{e}"),
            })?;
            counts.add(status, n.max(0) as usize);
        }
        Ok(counts)
    }
}
