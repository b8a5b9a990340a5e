use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::repository::MessageStore;

/// 停机时清空存储的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// 清空成功，附带删除条数
    Cleared(u64),
    /// 清空失败，只记录日志，停机照常进行
    ClearFailed(String),
}

/// 停机协调器
///
/// `shutdown` 只会真正执行一次：并发或重复调用会等待首次调用完成并拿到同一个结果。
pub struct ShutdownCoordinator {
    message_store: Arc<dyn MessageStore>,
    outcome: OnceCell<ShutdownOutcome>,
}

impl ShutdownCoordinator {
    pub fn new(message_store: Arc<dyn MessageStore>) -> Self {
        Self {
            message_store,
            outcome: OnceCell::new(),
        }
    }

    pub async fn shutdown(&self) -> ShutdownOutcome {
        self.outcome
            .get_or_init(|| async {
                tracing::info!("服务正在停止，删除所有聊天记录...");
                match self.message_store.clear().await {
                    Ok(removed) => {
                        tracing::info!(removed, "所有聊天记录已删除");
                        ShutdownOutcome::Cleared(removed)
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "停机清理失败");
                        ShutdownOutcome::ClearFailed(err.to_string())
                    }
                }
            })
            .await
            .clone()
    }

    pub fn has_run(&self) -> bool {
        self.outcome.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{memory::InMemoryMessageStore, MockMessageStore};
    use domain::{NewMessage, RepositoryError};
    use time::OffsetDateTime;

    #[tokio::test]
    async fn shutdown_empties_store() {
        let store = Arc::new(InMemoryMessageStore::new());
        for n in 0..3 {
            store
                .append(
                    NewMessage::parse(
                        Some("Alice".into()),
                        Some(format!("m{n}")),
                        OffsetDateTime::now_utc(),
                    )
                    .unwrap(),
                )
                .await
                .unwrap();
        }
        let coordinator = ShutdownCoordinator::new(store.clone());

        assert!(!coordinator.has_run());
        assert_eq!(coordinator.shutdown().await, ShutdownOutcome::Cleared(3));
        assert!(coordinator.has_run());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_shutdowns_clear_once() {
        let mut store = MockMessageStore::new();
        store.expect_clear().times(1).returning(|| Ok(5));
        let coordinator = Arc::new(ShutdownCoordinator::new(Arc::new(store)));

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let coordinator = coordinator.clone();
            tasks.push(tokio::spawn(async move { coordinator.shutdown().await }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), ShutdownOutcome::Cleared(5));
        }
        assert_eq!(coordinator.shutdown().await, ShutdownOutcome::Cleared(5));
    }

    #[tokio::test]
    async fn clear_failure_is_reported_not_retried() {
        let mut store = MockMessageStore::new();
        store
            .expect_clear()
            .times(1)
            .returning(|| Err(RepositoryError::storage("connection refused")));
        let coordinator = ShutdownCoordinator::new(Arc::new(store));

        let outcome = coordinator.shutdown().await;
        assert!(matches!(outcome, ShutdownOutcome::ClearFailed(ref msg) if msg.contains("connection refused")));
        assert_eq!(coordinator.shutdown().await, outcome);
    }
}
