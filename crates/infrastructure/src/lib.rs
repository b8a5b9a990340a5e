//! 基础设施层实现。
//!
//! 提供 PostgreSQL 消息存储与连接池、迁移等适配器，实现应用层定义的接口。

pub mod migrations;
pub mod repository;

pub use migrations::MIGRATOR;
pub use repository::{create_pg_pool, PgMessageStore};
