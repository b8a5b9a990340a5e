use std::sync::Arc;

use domain::ConnectionId;

use crate::protocol::ServerEvent;

/// 出站事件在所有接收方之间共享，避免逐连接深拷贝历史消息
pub type OutboundEvent = Arc<ServerEvent>;

/// 广播通道：发给单个连接或所有当前打开的连接。
///
/// 尽力而为，已断开或未知的连接静默跳过，不返回错误。
pub trait Broadcaster: Send + Sync {
    /// 发给所有连接，返回实际投递的连接数
    fn send_to_all(&self, event: ServerEvent) -> usize;

    /// 发给指定连接，目标不存在或已关闭时返回 `false`
    fn send_to_one(&self, connection_id: ConnectionId, event: ServerEvent) -> bool;
}
