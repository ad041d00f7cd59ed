//! App - アプリケーション層
//!
//! HTTP ハンドラなど外側のレイヤーが使う境界です。
//!
//! # 主要コンポーネント
//! - **TaskFacade**: client / worker 向けの操作（入力検証と型変換のみ）
//! - **view**: 外部に返す形（TaskView, TaskResult, ClaimedTask）

pub mod facade;
pub mod view;

pub use self::facade::{FacadeError, TaskFacade};
pub use self::view::{ClaimedTask, TaskResult, TaskView, WaitOutcome};
