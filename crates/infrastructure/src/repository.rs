use application::MessageStore;
use async_trait::async_trait;
use domain::{ChatMessage, MessageId, NewMessage, RepositoryError};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use time::OffsetDateTime;

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::storage(err.to_string())
}

#[derive(Debug, FromRow)]
struct ChatRecord {
    id: i64,
    name: String,
    message: String,
    sent_at: OffsetDateTime,
}

impl From<ChatRecord> for ChatMessage {
    fn from(value: ChatRecord) -> Self {
        ChatMessage {
            id: MessageId::new(value.id),
            author: value.name,
            body: value.message,
            sent_at: value.sent_at,
        }
    }
}

/// PostgreSQL 实现的消息存储
#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn append(&self, message: NewMessage) -> Result<ChatMessage, RepositoryError> {
        let record = sqlx::query_as::<_, ChatRecord>(
            r#"
            INSERT INTO chats (name, message, sent_at)
            VALUES ($1, $2, $3)
            RETURNING id, name, message, sent_at
            "#,
        )
        .bind(message.author.as_str())
        .bind(message.body.as_str())
        .bind(message.sent_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.into())
    }

    async fn list_all(&self) -> Result<Vec<ChatMessage>, RepositoryError> {
        let records = sqlx::query_as::<_, ChatRecord>(
            r#"
            SELECT id, name, message, sent_at
            FROM chats
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(ChatMessage::from).collect())
    }

    async fn clear(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM chats")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        tracing::debug!(rows = result.rows_affected(), "chats 表已清空");
        Ok(result.rows_affected())
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
