use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{MessageId, NonEmptyText, Timestamp};

/// 尚未持久化的聊天消息，作者与正文均已校验非空。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub author: NonEmptyText,
    pub body: NonEmptyText,
    pub sent_at: Timestamp,
}

impl NewMessage {
    pub fn parse(
        author: Option<String>,
        body: Option<String>,
        sent_at: Timestamp,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            author: NonEmptyText::parse("name", author)?,
            body: NonEmptyText::parse("message", body)?,
            sent_at,
        })
    }
}

/// 已持久化的聊天消息，创建后不可变。
///
/// 线上格式沿用客户端约定的字段名：`name` / `message` / `time`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    #[serde(rename = "name")]
    pub author: String,
    #[serde(rename = "message")]
    pub body: String,
    #[serde(rename = "time", with = "time::serde::rfc3339")]
    pub sent_at: Timestamp,
}

impl ChatMessage {
    /// 存储分配标识后生成持久化记录
    pub fn persisted(id: MessageId, message: NewMessage) -> Self {
        Self {
            id,
            author: message.author.into_inner(),
            body: message.body.into_inner(),
            sent_at: message.sent_at,
        }
    }
}
