use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex as SyncMutex, MutexGuard, PoisonError,
};

use domain::{ChatMessage, ConnectionId, NewMessage, PresenceEntry};
use tokio::sync::Mutex;

use crate::{
    broadcaster::Broadcaster,
    clock::Clock,
    error::ApplicationResult,
    presence::PresenceRegistry,
    protocol::{ClientEvent, MessageCreated, SendMessagePayload, ServerEvent},
    repository::MessageStore,
};

pub struct ChatServiceDependencies {
    pub message_store: Arc<dyn MessageStore>,
    pub presence: Arc<PresenceRegistry>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub clock: Arc<dyn Clock>,
}

/// 事件路由：把连接级事件转换为在线列表变更、消息持久化和广播。
///
/// 不校验连接状态：重复 `join` 会产生重复的在线条目，未加入就断开只会广播
/// 未变化的在线列表。
pub struct ChatService {
    deps: ChatServiceDependencies,
    // 追加与广播在同一临界区内完成，保证 newMessage 的广播顺序与存储顺序一致
    publish_lock: Mutex<()>,
    publishing_closed: AtomicBool,
    // 在线列表的修改、快照与 onlineUser 广播在同一临界区内完成，
    // 最后一次广播的内容总是与注册表一致
    presence_lock: SyncMutex<()>,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self {
            deps,
            publish_lock: Mutex::new(()),
            publishing_closed: AtomicBool::new(false),
            presence_lock: SyncMutex::new(()),
        }
    }

    fn presence_guard(&self) -> MutexGuard<'_, ()> {
        self.presence_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// 分发单个事件到对应的处理函数
    pub async fn handle_event(
        &self,
        connection_id: ConnectionId,
        event: ClientEvent,
    ) -> ApplicationResult<()> {
        match event {
            ClientEvent::Join { name } => self.join(connection_id, name).await,
            ClientEvent::Typing => {
                self.typing(connection_id);
                Ok(())
            }
            ClientEvent::SendMessage(payload) => {
                self.send_message(connection_id, payload).await?;
                Ok(())
            }
            ClientEvent::Disconnect => {
                self.disconnect(connection_id);
                Ok(())
            }
        }
    }

    /// 加入聊天室
    ///
    /// 先读取历史：读取失败时不登记在线状态，也不发送任何事件。
    pub async fn join(&self, connection_id: ConnectionId, name: String) -> ApplicationResult<()> {
        let history = self.deps.message_store.list_all().await?;

        let _guard = self.presence_guard();
        self.deps.presence.add(connection_id, name.as_str());
        let online = self.deps.presence.snapshot();

        tracing::info!(
            connection_id = %connection_id,
            display_name = %name,
            online = online.len(),
            history = history.len(),
            "用户加入聊天室"
        );

        self.deps
            .broadcaster
            .send_to_all(ServerEvent::PresenceChanged(online));
        self.deps
            .broadcaster
            .send_to_one(connection_id, ServerEvent::JoinedHistory(history));

        Ok(())
    }

    /// 转发输入提示，包括发送者本身
    pub fn typing(&self, connection_id: ConnectionId) {
        tracing::trace!(connection_id = %connection_id, "typing");
        self.deps
            .broadcaster
            .send_to_all(ServerEvent::TypingNotice(connection_id));
    }

    /// 保存并广播消息
    ///
    /// 作者或正文缺失/为空时静默丢弃，返回 `Ok(None)`。
    pub async fn send_message(
        &self,
        connection_id: ConnectionId,
        payload: SendMessagePayload,
    ) -> ApplicationResult<Option<ChatMessage>> {
        let _guard = self.publish_lock.lock().await;
        if self.publishing_closed.load(Ordering::Acquire) {
            tracing::debug!(connection_id = %connection_id, "服务正在停止，丢弃消息");
            return Ok(None);
        }

        let message = match NewMessage::parse(payload.name, payload.message, self.deps.clock.now())
        {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(connection_id = %connection_id, error = %err, "丢弃无效消息");
                return Ok(None);
            }
        };

        let record = self.deps.message_store.append(message).await?;

        let delivered = self
            .deps
            .broadcaster
            .send_to_all(ServerEvent::MessageCreated(MessageCreated {
                msg: record.clone(),
                socket_id: connection_id,
            }));

        tracing::debug!(
            connection_id = %connection_id,
            message_id = %record.id,
            delivered,
            "消息已保存并广播"
        );

        Ok(Some(record))
    }

    /// 连接断开：移除第一个匹配的在线条目并广播在线列表
    pub fn disconnect(&self, connection_id: ConnectionId) -> bool {
        let _guard = self.presence_guard();
        let removed = self.deps.presence.remove(connection_id);
        let online = self.deps.presence.snapshot();

        tracing::info!(
            connection_id = %connection_id,
            removed,
            online = online.len(),
            "连接断开"
        );

        self.deps
            .broadcaster
            .send_to_all(ServerEvent::PresenceChanged(online));
        removed
    }

    /// 停止接受新消息
    ///
    /// 返回时没有正在进行的追加，之后的 `sendMessage` 都会被丢弃。
    /// 停机时在清空存储之前调用。
    pub async fn close_publishing(&self) {
        let _guard = self.publish_lock.lock().await;
        self.publishing_closed.store(true, Ordering::Release);
        tracing::info!("已停止接受新消息");
    }

    pub fn online_users(&self) -> Vec<PresenceEntry> {
        self.deps.presence.snapshot()
    }
}
