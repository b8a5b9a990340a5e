//! 主应用程序入口
//!
//! 启动 Axum Web 服务；收到 SIGINT / SIGTERM 或服务退出时清空聊天记录后结束进程。

use std::{path::PathBuf, sync::Arc};

use application::{InMemoryMessageStore, MessageStore, ShutdownCoordinator};
use config::{AppConfig, StoreBackend};
use infrastructure::{create_pg_pool, PgMessageStore, MIGRATOR};
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, StaticAssets};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    tracing::info!(config = %config.sanitize(), "配置已加载");

    // 先监听端口，再连接存储
    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!("聊天室服务器启动在 http://{}", listener.local_addr()?);

    let message_store = connect_message_store(&config).await?;
    let shutdown = ShutdownCoordinator::new(message_store.clone());

    let assets = StaticAssets {
        root: PathBuf::from(&config.server.static_dir),
        index_file: PathBuf::from(&config.server.index_file),
    };
    let state = AppState::with_store(message_store, assets);
    let chat_service = state.chat_service.clone();
    let app = router(state);

    // WebSocket 连接不会自行结束，因此不等待优雅关闭：收到信号后直接清理并退出
    let mut server = tokio::spawn(async move { axum::serve(listener, app).await });

    let result = tokio::select! {
        name = shutdown_signal() => {
            tracing::info!(signal = name, "接收到终止信号，开始停机");
            server.abort();
            Ok(())
        }
        joined = &mut server => match joined {
            Ok(Ok(())) => {
                tracing::info!("HTTP 服务已退出");
                Ok(())
            }
            Ok(Err(err)) => Err(anyhow::Error::from(err)),
            Err(err) => Err(anyhow::Error::from(err)),
        }
    };

    // 连接任务在进程退出前仍可能运行，先停止写入，保证清空之后不再有新消息落库
    chat_service.close_publishing().await;
    shutdown.shutdown().await;
    result
}

async fn connect_message_store(config: &AppConfig) -> anyhow::Result<Arc<dyn MessageStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!("使用内存消息存储");
            Ok(Arc::new(InMemoryMessageStore::new()))
        }
        StoreBackend::Postgres => {
            let pool =
                create_pg_pool(&config.database.url, config.database.max_connections).await?;
            MIGRATOR.run(&pool).await?;
            tracing::info!("已连接 PostgreSQL 消息存储");
            Ok(Arc::new(PgMessageStore::new(pool)))
        }
    }
}

/// 等待 Ctrl+C 或终止信号，返回信号名
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "无法监听 Ctrl+C 信号");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig_term) => {
                sig_term.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "无法监听终止信号");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
