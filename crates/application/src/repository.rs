use async_trait::async_trait;
use domain::{ChatMessage, NewMessage, RepositoryError};

/// 消息存储适配器：只追加、可全量查询、仅在停机时清空。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    // 追加一条消息，由存储分配标识
    async fn append(&self, message: NewMessage) -> Result<ChatMessage, RepositoryError>;

    // 按追加顺序返回全部历史，不分页
    async fn list_all(&self) -> Result<Vec<ChatMessage>, RepositoryError>;

    // 清空存储，返回删除的条数
    async fn clear(&self) -> Result<u64, RepositoryError>;
}

/// 内存实现的消息存储（用于开发和测试）
pub mod memory {
    use super::*;
    use domain::MessageId;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct Inner {
        messages: Vec<ChatMessage>,
        last_id: i64,
    }

    #[derive(Default)]
    pub struct InMemoryMessageStore {
        inner: RwLock<Inner>,
    }

    impl InMemoryMessageStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn len(&self) -> usize {
            self.inner.read().await.messages.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.len().await == 0
        }
    }

    #[async_trait]
    impl MessageStore for InMemoryMessageStore {
        async fn append(&self, message: NewMessage) -> Result<ChatMessage, RepositoryError> {
            let mut inner = self.inner.write().await;
            // 清空后标识不回退，与数据库序列行为一致
            inner.last_id += 1;
            let record = ChatMessage::persisted(MessageId::new(inner.last_id), message);
            inner.messages.push(record.clone());
            Ok(record)
        }

        async fn list_all(&self) -> Result<Vec<ChatMessage>, RepositoryError> {
            Ok(self.inner.read().await.messages.clone())
        }

        async fn clear(&self) -> Result<u64, RepositoryError> {
            let mut inner = self.inner.write().await;
            let removed = inner.messages.len() as u64;
            inner.messages.clear();
            Ok(removed)
        }
    }

}
