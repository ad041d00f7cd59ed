use thiserror::Error;

/// Backend failure of a [`TaskStore`](crate::ports::TaskStore).
///
/// Rejected transitions are not errors; see [`Transition`](crate::ports::Transition).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt task row {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("task text must not be empty")]
    EmptyText,

    #[error(transparent)]
    Store(#[from] StoreError),
}
