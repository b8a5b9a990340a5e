use std::sync::{Mutex, MutexGuard, PoisonError};

use domain::{ConnectionId, PresenceEntry};

/// 在线用户注册表
///
/// 按加入顺序保存已加入连接的 `(连接标识, 显示名)`。只由事件路由修改。
/// 所有操作在同一把互斥锁内完成且不会挂起，可在任意异步任务中直接调用。
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: Mutex<Vec<PresenceEntry>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<PresenceEntry>> {
        // 持锁期间没有可能 panic 的逻辑，中毒时数据仍然完整
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 追加一个条目，不检查重复
    pub fn add(&self, connection_id: ConnectionId, display_name: impl Into<String>) {
        self.entries()
            .push(PresenceEntry::new(connection_id, display_name));
    }

    /// 移除第一个匹配的条目；连接从未加入时返回 `false`
    pub fn remove(&self, connection_id: ConnectionId) -> bool {
        let mut entries = self.entries();
        match entries.iter().position(|entry| entry.id == connection_id) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// 当前在线列表的有序快照
    pub fn snapshot(&self) -> Vec<PresenceEntry> {
        self.entries().clone()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_keeps_join_order() {
        let registry = PresenceRegistry::new();
        let alice = ConnectionId::generate();
        let bob = ConnectionId::generate();

        registry.add(alice, "Alice");
        registry.add(bob, "Bob");

        assert_eq!(
            registry.snapshot(),
            vec![
                PresenceEntry::new(alice, "Alice"),
                PresenceEntry::new(bob, "Bob"),
            ]
        );
    }

    #[test]
    fn remove_unknown_connection_is_noop() {
        let registry = PresenceRegistry::new();
        let alice = ConnectionId::generate();
        registry.add(alice, "Alice");

        assert!(!registry.remove(ConnectionId::generate()));
        assert_eq!(registry.snapshot(), vec![PresenceEntry::new(alice, "Alice")]);
    }

    #[test]
    fn duplicate_join_needs_two_removals() {
        let registry = PresenceRegistry::new();
        let alice = ConnectionId::generate();
        registry.add(alice, "Alice");
        registry.add(alice, "Alice again");
        assert_eq!(registry.len(), 2);

        assert!(registry.remove(alice));
        assert_eq!(
            registry.snapshot(),
            vec![PresenceEntry::new(alice, "Alice again")]
        );
        assert!(registry.remove(alice));
        assert!(registry.is_empty());
    }

    #[test]
    fn size_tracks_joined_connections() {
        let registry = PresenceRegistry::new();
        let ids: Vec<_> = (0..5).map(|_| ConnectionId::generate()).collect();
        for (i, id) in ids.iter().enumerate() {
            registry.add(*id, format!("user-{i}"));
        }
        registry.remove(ids[1]);
        registry.remove(ids[3]);

        assert_eq!(registry.len(), 3);
        let names: Vec<_> = registry
            .snapshot()
            .into_iter()
            .map(|entry| entry.display_name)
            .collect();
        assert_eq!(names, vec!["user-0", "user-2", "user-4"]);
    }
}
