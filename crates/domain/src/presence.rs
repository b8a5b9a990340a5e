use serde::{Deserialize, Serialize};

use crate::value_objects::ConnectionId;

/// 在线用户条目：一个已加入的连接及其自报的显示名。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub id: ConnectionId,
    #[serde(rename = "name")]
    pub display_name: String,
}

impl PresenceEntry {
    pub fn new(id: ConnectionId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}
