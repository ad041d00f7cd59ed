use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::app::{FacadeError, TaskFacade};
use crate::ports::Embedder;

/// Worker group handle.
/// - `request_shutdown` で全ワーカーが新しい claim をやめる
/// - `shutdown_and_join()` で全ワーカーの終了を待てる
///
/// claim 後にワーカーが落ちた task は `processing` のまま残る（reaper は無い）。
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers that poll `facade` every `poll_interval` when idle.
    pub fn spawn(
        n: usize,
        facade: Arc<TaskFacade>,
        embedder: Arc<dyn Embedder>,
        poll_interval: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let facade = Arc::clone(&facade);
            let embedder = Arc::clone(&embedder);
            let mut rx = shutdown_rx.clone();

            let join = tokio::spawn(async move {
                worker_loop(worker_id, facade, embedder, poll_interval, &mut rx).await;
            });
            joins.push(join);
        }

        Self { shutdown_tx, joins }
    }

    /// Stop taking new claims. In-flight embeddings still get reported.
    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for j in self.joins {
            let _ = j.await;
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    facade: Arc<TaskFacade>,
    embedder: Arc<dyn Embedder>,
    poll_interval: Duration,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let claimed = match facade.worker_claim().await {
            Ok(claimed) => claimed,
            Err(e) => {
                tracing::error!(worker_id, error = %e, "claim failed");
                None
            }
        };

        let Some(task) = claimed else {
            // 空なら poll_interval 待つ。shutdown が来たら即座に起きる
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                _ = tokio::time::sleep(poll_interval) => {}
            }
            continue;
        };

        tracing::debug!(worker_id, task_id = %task.id, "embedding task");
        let report = match embedder.embed(&task.text).await {
            Ok(embedding) => facade.worker_complete(task.id, embedding).await,
            Err(message) => facade.worker_fail(task.id, message).await,
        };

        match report {
            Ok(()) => {}
            // embedder が空ベクトル等を返した場合は失敗として記録する
            Err(FacadeError::Validation(reason)) => {
                if let Err(e) = facade.worker_fail(task.id, reason).await {
                    tracing::error!(worker_id, task_id = %task.id, error = %e, "fail report failed");
                }
            }
            Err(e) => {
                tracing::error!(worker_id, task_id = %task.id, error = %e, "report failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;
    use crate::impls::InMemoryTaskStore;
    use crate::queue::TaskQueue;
    use async_trait::async_trait;

    /// "fail" で始まるテキストは失敗、それ以外は [len] を返す
    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f64>, String> {
            if text.starts_with("fail") {
                return Err(format!("cannot embed {text}"));
            }
            if text == "empty" {
                return Ok(vec![]);
            }
            Ok(vec![text.len() as f64])
        }
    }

    fn facade() -> Arc<TaskFacade> {
        let queue = TaskQueue::new(Arc::new(InMemoryTaskStore::new()));
        Arc::new(TaskFacade::new(Arc::new(queue)))
    }

    async fn wait_until_drained(facade: &TaskFacade, total: usize) {
        for _ in 0..200 {
            let counts = facade.counts().await.unwrap();
            if counts.completed + counts.failed == total {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("workers did not drain the queue");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn workers_drain_the_queue() {
        let facade = facade();
        let mut ids = Vec::new();
        for i in 0..20 {
            ids.push(facade.submit(format!("text {i}")).await.unwrap());
        }
        let failing = facade.submit("fail me").await.unwrap();
        let empty = facade.submit("empty").await.unwrap();

        let group = WorkerGroup::spawn(
            3,
            Arc::clone(&facade),
            Arc::new(LengthEmbedder),
            Duration::from_millis(5),
        );
        wait_until_drained(&facade, 22).await;
        group.shutdown_and_join().await;

        for id in ids {
            assert_eq!(facade.fetch(id).await.unwrap().status, TaskStatus::Completed);
        }
        let failed = facade.fetch(failing).await.unwrap();
        assert_eq!(failed.error.as_deref(), Some("cannot embed fail me"));
        assert_eq!(facade.fetch(empty).await.unwrap().status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn idle_workers_stop_on_shutdown() {
        let group = WorkerGroup::spawn(
            2,
            facade(),
            Arc::new(LengthEmbedder),
            Duration::from_secs(60),
        );

        tokio::time::timeout(Duration::from_secs(1), group.shutdown_and_join())
            .await
            .expect("shutdown should wake sleeping workers");
    }
}
