use std::sync::Arc;

use domain::ConnectionId;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::protocol::ClientEvent;
use crate::services::ChatService;

/// 单个连接的生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 传输会话已打开，尚未加入
    Connected,
    /// 已声明显示名
    Joined,
    /// 已断开，终态
    Terminated,
}

/// 连接级状态机
///
/// 事件按到达顺序逐个交给 [`ChatService`]。单个事件失败只记录日志，
/// 不影响该连接后续事件，也不影响其他连接。
pub struct ConnectionSession {
    connection_id: ConnectionId,
    state: ConnectionState,
    service: Arc<ChatService>,
}

impl ConnectionSession {
    pub fn new(service: Arc<ChatService>, connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            state: ConnectionState::Connected,
            service,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub async fn dispatch(&mut self, event: ClientEvent) {
        if self.state == ConnectionState::Terminated {
            tracing::debug!(
                connection_id = %self.connection_id,
                event = event.name(),
                "连接已终止，忽略事件"
            );
            return;
        }

        let event_name = event.name();
        let next_state = match event {
            ClientEvent::Join { .. } => ConnectionState::Joined,
            ClientEvent::Disconnect => ConnectionState::Terminated,
            ClientEvent::Typing | ClientEvent::SendMessage(_) => self.state,
        };

        match self.service.handle_event(self.connection_id, event).await {
            Ok(()) => self.state = next_state,
            Err(err) => {
                tracing::error!(
                    connection_id = %self.connection_id,
                    event = event_name,
                    error = %err,
                    "事件处理失败"
                );
                // 断开总是终态，即使处理过程中出错
                if next_state == ConnectionState::Terminated {
                    self.state = next_state;
                }
            }
        }
    }

    /// 在独立任务中驱动该连接的事件队列
    ///
    /// 队列关闭而未收到断开事件时，补发一次断开，保证在线列表被清理。
    pub fn spawn(mut self) -> SessionHandle {
        let (sender, mut receiver) = mpsc::unbounded_channel::<ClientEvent>();
        let connection_id = self.connection_id;

        let task = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                self.dispatch(event).await;
                if self.state == ConnectionState::Terminated {
                    break;
                }
            }
            if self.state != ConnectionState::Terminated {
                self.dispatch(ClientEvent::Disconnect).await;
            }
            self.state
        });

        SessionHandle {
            connection_id,
            sender,
            task,
        }
    }
}

/// 连接事件队列的发送端
pub struct SessionHandle {
    connection_id: ConnectionId,
    sender: mpsc::UnboundedSender<ClientEvent>,
    task: JoinHandle<ConnectionState>,
}

impl SessionHandle {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// 投递一个事件，会话已结束时返回 `false`
    pub fn submit(&self, event: ClientEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    /// 投递断开事件并等待队列中已有事件全部处理完
    pub async fn close(self) -> ConnectionState {
        let _ = self.sender.send(ClientEvent::Disconnect);
        drop(self.sender);
        match self.task.await {
            Ok(state) => state,
            Err(err) => {
                tracing::error!(
                    connection_id = %self.connection_id,
                    error = %err,
                    "连接事件任务异常结束"
                );
                ConnectionState::Terminated
            }
        }
    }
}
