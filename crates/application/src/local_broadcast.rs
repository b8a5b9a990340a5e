// 进程内广播器实现：每个连接一个无界发送队列
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use domain::ConnectionId;
use tokio::sync::mpsc;

use crate::broadcaster::{Broadcaster, OutboundEvent};
use crate::protocol::ServerEvent;

pub type OutboundReceiver = mpsc::UnboundedReceiver<OutboundEvent>;

#[derive(Default)]
pub struct LocalBroadcaster {
    connections: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<OutboundEvent>>>,
}

impl LocalBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个新打开的连接，返回其出站事件队列
    pub fn register(&self, connection_id: ConnectionId) -> OutboundReceiver {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(connection_id, sender);
        receiver
    }

    pub fn unregister(&self, connection_id: ConnectionId) {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&connection_id);
    }

    pub fn connection_count(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Broadcaster for LocalBroadcaster {
    fn send_to_all(&self, event: ServerEvent) -> usize {
        let event = Arc::new(event);
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        connections
            .values()
            .filter(|sender| sender.send(event.clone()).is_ok())
            .count()
    }

    fn send_to_one(&self, connection_id: ConnectionId, event: ServerEvent) -> bool {
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        match connections.get(&connection_id) {
            Some(sender) => sender.send(Arc::new(event)).is_ok(),
            None => {
                tracing::debug!(connection_id = %connection_id, "目标连接不存在，跳过发送");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_to_all_reaches_every_registered_connection() {
        let broadcaster = LocalBroadcaster::new();
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        let mut rx_a = broadcaster.register(a);
        let mut rx_b = broadcaster.register(b);

        let delivered = broadcaster.send_to_all(ServerEvent::TypingNotice(a));
        assert_eq!(delivered, 2);
        assert_eq!(*rx_a.recv().await.unwrap(), ServerEvent::TypingNotice(a));
        assert_eq!(*rx_b.recv().await.unwrap(), ServerEvent::TypingNotice(a));
    }

    #[tokio::test]
    async fn send_to_one_only_reaches_target() {
        let broadcaster = LocalBroadcaster::new();
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        let mut rx_a = broadcaster.register(a);
        let mut rx_b = broadcaster.register(b);

        assert!(broadcaster.send_to_one(a, ServerEvent::JoinedHistory(Vec::new())));
        assert_eq!(*rx_a.recv().await.unwrap(), ServerEvent::JoinedHistory(Vec::new()));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn closed_and_unknown_targets_are_skipped() {
        let broadcaster = LocalBroadcaster::new();
        let open = ConnectionId::generate();
        let closed = ConnectionId::generate();
        let _rx_open = broadcaster.register(open);
        drop(broadcaster.register(closed));

        assert_eq!(broadcaster.send_to_all(ServerEvent::TypingNotice(open)), 1);
        assert!(!broadcaster.send_to_one(closed, ServerEvent::TypingNotice(open)));
        assert!(!broadcaster.send_to_one(ConnectionId::generate(), ServerEvent::TypingNotice(open)));
    }

    #[test]
    fn unregister_removes_connection() {
        let broadcaster = LocalBroadcaster::new();
        let id = ConnectionId::generate();
        let _rx = broadcaster.register(id);
        assert_eq!(broadcaster.connection_count(), 1);

        broadcaster.unregister(id);
        assert_eq!(broadcaster.connection_count(), 0);
        assert_eq!(broadcaster.send_to_all(ServerEvent::TypingNotice(id)), 0);
    }
}
