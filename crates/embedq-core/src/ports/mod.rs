//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（SQLite、時計、埋め込みモデルなど）への
//! インターフェースを提供し、実装の詳細を隠蔽します。

pub mod clock;
pub mod embedder;
pub mod id_generator;
pub mod task_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::embedder::Embedder;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::task_store::{TaskStore, Transition};
