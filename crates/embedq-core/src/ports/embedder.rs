//! Embedder port - 埋め込み計算の抽象化
//!
//! 埋め込みの計算そのものはキューの関心外（ブラックボックス）。
//! WorkerGroup はこの trait 越しにだけ呼び出します。

use async_trait::async_trait;

/// Turns one task text into an embedding.
///
/// An `Err` is reported to the queue as the task's failure message.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, String>;
}
