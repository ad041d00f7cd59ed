//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: 開発・テスト用の正本
//! - **SqliteTaskStore**: SQLite による永続化

pub mod inmem_store;
pub mod sqlite_store;

pub use self::inmem_store::InMemoryTaskStore;
pub use self::sqlite_store::SqliteTaskStore;
