use std::{path::PathBuf, sync::Arc};

use application::{
    ChatService, ChatServiceDependencies, Clock, LocalBroadcaster, MessageStore,
    PresenceRegistry, SystemClock,
};

/// 静态资源位置
#[derive(Debug, Clone)]
pub struct StaticAssets {
    /// 静态资源根目录
    pub root: PathBuf,
    /// `/` 返回的入口页面
    pub index_file: PathBuf,
}

#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    pub broadcaster: Arc<LocalBroadcaster>,
    pub assets: StaticAssets,
}

impl AppState {
    pub fn new(
        chat_service: Arc<ChatService>,
        broadcaster: Arc<LocalBroadcaster>,
        assets: StaticAssets,
    ) -> Self {
        Self {
            chat_service,
            broadcaster,
            assets,
        }
    }

    /// 以给定的消息存储组装单聊天室所需的全部服务
    pub fn with_store(message_store: Arc<dyn MessageStore>, assets: StaticAssets) -> Self {
        let broadcaster = Arc::new(LocalBroadcaster::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let chat_service = ChatService::new(ChatServiceDependencies {
            message_store,
            presence: Arc::new(PresenceRegistry::new()),
            broadcaster: broadcaster.clone(),
            clock,
        });

        Self::new(Arc::new(chat_service), broadcaster, assets)
    }
}
