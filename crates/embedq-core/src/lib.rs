//! embedq-core
//!
//! Embedding task queue: clients submit text, workers claim it, and a small
//! state machine (`pending -> processing -> completed | failed`) keeps every
//! task in exactly one place.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（TaskId, Task, TaskOutcome, TaskStatus）
//! - **ports**: 抽象化レイヤー（TaskStore, Clock, IdGenerator, Embedder）
//! - **impls**: ports の実装（InMemoryTaskStore, SqliteTaskStore）
//! - **queue**: TaskQueue（submit / claim / complete / fail）
//! - **app**: TaskFacade（HTTP などの外側から使う境界）
//! - **worker**: WorkerGroup（Embedder を回すワーカー）

pub mod app;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod worker;

pub use app::{ClaimedTask, FacadeError, TaskFacade, TaskResult, TaskView, WaitOutcome};
pub use domain::{Task, TaskId, TaskOutcome, TaskStatus};
pub use error::{QueueError, StoreError};
pub use observability::QueueCounts;
pub use queue::TaskQueue;
pub use worker::WorkerGroup;
