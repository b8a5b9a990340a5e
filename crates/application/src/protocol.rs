//! 连接级事件协议
//!
//! 每个文本帧都是 `{"event": <名称>, "data": <负载>}` 形式的 JSON 对象。
//! 事件名沿用前端已有的约定（`join`、`typing`、`sendMessage` /
//! `joined`、`onlineUser`、`typing`、`newMessage`）。

use domain::{ChatMessage, ConnectionId, PresenceEntry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 客户端发往服务端的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// 以自报的显示名加入聊天室
    Join { name: String },
    /// 正在输入
    Typing,
    /// 发送消息
    SendMessage(SendMessagePayload),
    /// 传输层断开，不从线上解析
    Disconnect,
}

/// `sendMessage` 的负载，字段缺失时为 `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessagePayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}

#[derive(Debug, Deserialize)]
struct InboundFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl ClientEvent {
    /// 解析一个入站文本帧
    pub fn from_frame(text: &str) -> Result<Self, ProtocolError> {
        let frame: InboundFrame = serde_json::from_str(text)?;
        match frame.event.as_str() {
            "join" => {
                let name = match frame.data {
                    serde_json::Value::String(name) => name,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                Ok(Self::Join { name })
            }
            "typing" => Ok(Self::Typing),
            "sendMessage" => {
                let payload = if frame.data.is_null() {
                    SendMessagePayload::default()
                } else {
                    serde_json::from_value(frame.data)?
                };
                Ok(Self::SendMessage(payload))
            }
            _ => Err(ProtocolError::UnknownEvent(frame.event)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Typing => "typing",
            Self::SendMessage(_) => "sendMessage",
            Self::Disconnect => "disconnect",
        }
    }
}

/// `newMessage` 的负载：已持久化的消息及发送者连接
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCreated {
    pub msg: ChatMessage,
    #[serde(rename = "socketId")]
    pub socket_id: ConnectionId,
}

/// 服务端发往客户端的事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// 加入成功，附带全部历史消息（仅发给加入者）
    #[serde(rename = "joined")]
    JoinedHistory(Vec<ChatMessage>),
    /// 在线列表变化（发给所有连接）
    #[serde(rename = "onlineUser")]
    PresenceChanged(Vec<PresenceEntry>),
    /// 某连接正在输入（发给所有连接，包括发送者）
    #[serde(rename = "typing")]
    TypingNotice(ConnectionId),
    /// 新消息已保存（发给所有连接）
    #[serde(rename = "newMessage")]
    MessageCreated(MessageCreated),
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
