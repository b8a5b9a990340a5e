//! 聊天室系统核心领域模型
//!
//! 包含连接标识、在线用户条目、聊天消息等核心类型，以及相关的错误定义。

pub mod errors;
pub mod message;
pub mod presence;
pub mod value_objects;

// 重新导出常用类型
pub use errors::*;
pub use message::{ChatMessage, NewMessage};
pub use presence::PresenceEntry;
pub use value_objects::{ConnectionId, MessageId, NonEmptyText, Timestamp};
