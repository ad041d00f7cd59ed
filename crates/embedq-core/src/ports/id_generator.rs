//! IdGenerator port - ID 生成の抽象化
//!
//! テスト容易性のために、trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use std::sync::Mutex;

use ulid::Ulid;

use crate::domain::TaskId;
use crate::ports::Clock;

/// IdGenerator は分散システムで使える ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数スレッドから使える）
pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> TaskId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// 同じミリ秒内（あるいは時計が戻った場合）は直前の ULID を +1 するので、
/// 生成順序と ID の順序が一致します。
pub struct UlidGenerator<C> {
    clock: C,
    last: Mutex<Option<Ulid>>,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last: Mutex::new(None),
        }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        let next = match *last {
            Some(prev) if prev.timestamp_ms() >= timestamp_ms => {
                // random 部が溢れたら新しい乱数で作り直す
                prev.increment()
                    .unwrap_or_else(|| Ulid::from_parts(prev.timestamp_ms() + 1, rand::random()))
            }
            _ => Ulid::from_parts(timestamp_ms, rand::random()),
        };

        *last = Some(next);
        next
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        TaskId::from_ulid(self.next_ulid())
    }
}
