//! 消息时间戳来源
//!
//! 事件路由在保存消息时通过 [`Clock`] 取得 `sent_at`，测试中可替换为固定时间。

use domain::Timestamp;
use time::OffsetDateTime;

pub trait Clock: Send + Sync {
    /// 当前时间（UTC）
    fn now(&self) -> Timestamp;
}

/// 读取系统时间
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        OffsetDateTime::now_utc()
    }
}

/// 始终返回同一时刻
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedClock(pub Timestamp);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
