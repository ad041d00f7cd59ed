//! Queue lifecycle properties, checked against every TaskStore backend.

use std::collections::HashSet;
use std::sync::Arc;

use embedq_core::impls::{InMemoryTaskStore, SqliteTaskStore};
use embedq_core::ports::{TaskStore, Transition};
use embedq_core::{TaskId, TaskQueue, TaskStatus};
use rstest::rstest;
use tempfile::TempDir;
use ulid::Ulid;

#[derive(Debug, Clone, Copy)]
enum Backend {
    Memory,
    /// `sqlite::memory:` (single pooled connection)
    Sqlite,
    /// File database with the regular multi-connection pool.
    SqliteFile,
}

/// The `TempDir` must outlive the queue for `SqliteFile`.
async fn queue(backend: Backend) -> (Arc<TaskQueue>, Option<TempDir>) {
    let (store, dir): (Arc<dyn TaskStore>, _) = match backend {
        Backend::Memory => (Arc::new(InMemoryTaskStore::new()), None),
        Backend::Sqlite => (
            Arc::new(SqliteTaskStore::connect("sqlite::memory:").await.unwrap()),
            None,
        ),
        Backend::SqliteFile => {
            let dir = tempfile::tempdir().unwrap();
            let url = format!("sqlite://{}", dir.path().join("tasks.db").display());
            (Arc::new(SqliteTaskStore::connect(&url).await.unwrap()), Some(dir))
        }
    };
    (Arc::new(TaskQueue::new(store)), dir)
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_hand_out_each_task_once(
    #[values(Backend::Memory, Backend::Sqlite, Backend::SqliteFile)] backend: Backend,
) {
    const PENDING: usize = 50;
    const CLAIMERS: usize = 120;

    let (queue, _dir) = queue(backend).await;
    let mut submitted = HashSet::new();
    for i in 0..PENDING {
        submitted.insert(queue.submit(format!("text {i}")).await.unwrap());
    }

    let handles: Vec<_> = (0..CLAIMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.claim_next().await.unwrap() })
        })
        .collect();

    let mut claimed = Vec::new();
    let mut empty = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Some(task) => {
                assert_eq!(task.status(), TaskStatus::Processing);
                claimed.push(task.id);
            }
            None => empty += 1,
        }
    }

    let distinct: HashSet<TaskId> = claimed.iter().copied().collect();
    assert_eq!(claimed.len(), PENDING);
    assert_eq!(distinct, submitted);
    assert_eq!(empty, CLAIMERS - PENDING);
}

#[rstest]
#[tokio::test]
async fn complete_and_fail_succeed_exactly_once(
    #[values(Backend::Memory, Backend::Sqlite, Backend::SqliteFile)] backend: Backend,
) {
    let (queue, _dir) = queue(backend).await;
    let a = queue.submit("a").await.unwrap();
    let b = queue.submit("b").await.unwrap();
    queue.claim_next().await.unwrap();
    queue.claim_next().await.unwrap();

    assert!(queue.complete(a, vec![0.1]).await.unwrap().is_applied());
    assert_eq!(
        queue.complete(a, vec![0.9]).await.unwrap(),
        Transition::WrongState(TaskStatus::Completed)
    );
    assert_eq!(
        queue.fail(a, "late").await.unwrap(),
        Transition::WrongState(TaskStatus::Completed)
    );

    assert!(queue.fail(b, "timeout").await.unwrap().is_applied());
    assert_eq!(
        queue.fail(b, "timeout").await.unwrap(),
        Transition::WrongState(TaskStatus::Failed)
    );

    // 最初の報告だけが残る
    let a = queue.get(a).await.unwrap().unwrap();
    assert_eq!(a.outcome.embedding(), Some(&[0.1][..]));
}

#[rstest]
#[tokio::test]
async fn submit_then_fetch_is_pending(
    #[values(Backend::Memory, Backend::Sqlite, Backend::SqliteFile)] backend: Backend,
) {
    let (queue, _dir) = queue(backend).await;

    let id = queue.submit("hello").await.unwrap();
    let task = queue.get(id).await.unwrap().unwrap();

    assert_eq!(task.status(), TaskStatus::Pending);
    assert_eq!(task.outcome.embedding(), None);
    assert_eq!(task.outcome.error(), None);
}

#[rstest]
#[tokio::test]
async fn completed_task_carries_its_embedding(
    #[values(Backend::Memory, Backend::Sqlite, Backend::SqliteFile)] backend: Backend,
) {
    let (queue, _dir) = queue(backend).await;
    let id = queue.submit("hello").await.unwrap();

    let claimed = queue.claim_next().await.unwrap().unwrap();
    assert_eq!(claimed.id, id);
    queue.complete(id, vec![0.1, 0.2]).await.unwrap();

    let task = queue.get(id).await.unwrap().unwrap();
    assert_eq!(task.status(), TaskStatus::Completed);
    assert_eq!(task.outcome.embedding(), Some(&[0.1, 0.2][..]));
    assert_eq!(task.outcome.error(), None);
    assert!(task.updated_at >= task.created_at);
}

#[rstest]
#[tokio::test]
async fn embedding_values_keep_full_precision(
    #[values(Backend::Memory, Backend::Sqlite, Backend::SqliteFile)] backend: Backend,
) {
    let (queue, _dir) = queue(backend).await;
    let id = queue.submit("hello").await.unwrap();
    queue.claim_next().await.unwrap();

    let embedding = vec![0.123456789012345, 1e39, -2.5e-300];
    queue.complete(id, embedding.clone()).await.unwrap();

    let task = queue.get(id).await.unwrap().unwrap();
    assert_eq!(task.outcome.embedding(), Some(&embedding[..]));
}

#[rstest]
#[tokio::test]
async fn failed_task_carries_its_error(
    #[values(Backend::Memory, Backend::Sqlite, Backend::SqliteFile)] backend: Backend,
) {
    let (queue, _dir) = queue(backend).await;
    let id = queue.submit("hello").await.unwrap();
    queue.claim_next().await.unwrap();

    queue.fail(id, "timeout").await.unwrap();

    let task = queue.get(id).await.unwrap().unwrap();
    assert_eq!(task.status(), TaskStatus::Failed);
    assert_eq!(task.outcome.error(), Some("timeout"));
    assert_eq!(task.outcome.embedding(), None);
}

#[rstest]
#[tokio::test]
async fn claim_on_empty_queue_is_none(
    #[values(Backend::Memory, Backend::Sqlite, Backend::SqliteFile)] backend: Backend,
) {
    let (queue, _dir) = queue(backend).await;

    assert!(queue.claim_next().await.unwrap().is_none());
}

#[rstest]
#[tokio::test]
async fn reports_for_unknown_or_pending_tasks_change_nothing(
    #[values(Backend::Memory, Backend::Sqlite, Backend::SqliteFile)] backend: Backend,
) {
    let (queue, _dir) = queue(backend).await;
    let unknown = TaskId::from_ulid(Ulid::new());
    let pending = queue.submit("hello").await.unwrap();
    let before = queue.get(pending).await.unwrap().unwrap();

    assert_eq!(queue.complete(unknown, vec![1.0]).await.unwrap(), Transition::NotFound);
    assert_eq!(queue.fail(unknown, "x").await.unwrap(), Transition::NotFound);
    assert_eq!(
        queue.complete(pending, vec![1.0]).await.unwrap(),
        Transition::WrongState(TaskStatus::Pending)
    );
    assert_eq!(
        queue.fail(pending, "x").await.unwrap(),
        Transition::WrongState(TaskStatus::Pending)
    );

    assert_eq!(queue.get(pending).await.unwrap().unwrap(), before);
    assert!(queue.get(unknown).await.unwrap().is_none());
    assert_eq!(queue.counts().await.unwrap().pending, 1);
}

#[rstest]
#[tokio::test]
async fn claims_follow_submission_order(
    #[values(Backend::Memory, Backend::Sqlite, Backend::SqliteFile)] backend: Backend,
) {
    let (queue, _dir) = queue(backend).await;
    let a = queue.submit("A").await.unwrap();
    let b = queue.submit("B").await.unwrap();
    let c = queue.submit("C").await.unwrap();

    for expected in [a, b, c] {
        assert_eq!(queue.claim_next().await.unwrap().unwrap().id, expected);
    }
    assert!(queue.claim_next().await.unwrap().is_none());
}

#[rstest]
#[tokio::test]
async fn counts_follow_the_lifecycle(
    #[values(Backend::Memory, Backend::Sqlite, Backend::SqliteFile)] backend: Backend,
) {
    let (queue, _dir) = queue(backend).await;
    let a = queue.submit("a").await.unwrap();
    let b = queue.submit("b").await.unwrap();
    queue.submit("c").await.unwrap();
    queue.submit("d").await.unwrap();
    queue.claim_next().await.unwrap();
    queue.claim_next().await.unwrap();
    queue.claim_next().await.unwrap();
    queue.complete(a, vec![1.0]).await.unwrap();
    queue.fail(b, "x").await.unwrap();

    let counts = queue.counts().await.unwrap();
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.processing, 1);
    assert_eq!(counts.completed, 1);
    assert_eq!(counts.failed, 1);
}
