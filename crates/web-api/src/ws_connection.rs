use application::{ClientEvent, ConnectionSession, OutboundReceiver, SessionHandle};
use axum::{
    body::Bytes,
    extract::ws::{Message as WsMessage, WebSocket},
};
use domain::ConnectionId;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::state::AppState;

/// WebSocket 连接管理器
///
/// 封装单个 WebSocket 连接的所有状态和逻辑，包括：
/// - 出站事件转发
/// - 入站帧解析并投递到连接事件队列
/// - Ping/Pong 心跳
/// - 断开后的清理
pub struct WebSocketConnection {
    socket: WebSocket,
    state: AppState,
    connection_id: ConnectionId,
    outbound: OutboundReceiver,
    session: SessionHandle,
}

impl WebSocketConnection {
    /// 为新打开的传输会话分配标识，登记广播通道并启动事件路由任务
    pub fn new(socket: WebSocket, state: AppState) -> Self {
        let connection_id = ConnectionId::generate();
        let outbound = state.broadcaster.register(connection_id);
        let session = ConnectionSession::new(state.chat_service.clone(), connection_id).spawn();

        tracing::info!(connection_id = %connection_id, "WebSocket 连接已建立");

        Self {
            socket,
            state,
            connection_id,
            outbound,
            session,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// 运行 WebSocket 连接的主循环，直到任一方向结束
    pub async fn run(self) {
        let Self {
            socket,
            state,
            connection_id,
            mut outbound,
            session,
        } = self;

        let (mut sender, mut incoming) = socket.split();

        // 创建 mpsc channel 来解耦对 sender 的访问
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<WsCommand>(32);

        // 发送任务：统一处理所有对 WebSocket sender 的写操作
        let mut send_task = tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    Some(cmd) = cmd_rx.recv() => match cmd {
                        WsCommand::SendPong(data) => WsMessage::Pong(data),
                    },
                    Some(event) = outbound.recv() => match event.to_json() {
                        Ok(json) => WsMessage::Text(json.into()),
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to serialize websocket payload");
                            continue;
                        }
                    },
                    else => break,
                };
                if sender.send(frame).await.is_err() {
                    tracing::debug!(connection_id = %connection_id, "发送失败，对端已关闭");
                    break;
                }
            }
        });

        // 接收任务：解析客户端帧并投递到事件队列
        let mut recv_task = tokio::spawn(async move {
            while let Some(Ok(message)) = incoming.next().await {
                if Self::handle_incoming(connection_id, message, &session, &cmd_tx)
                    .await
                    .is_err()
                {
                    break;
                }
            }
            session
        });

        // 等待任意一个任务完成（连接断开）
        let session = tokio::select! {
            _ = &mut send_task => {
                recv_task.abort();
                recv_task.await.ok()
            }
            result = &mut recv_task => {
                send_task.abort();
                result.ok()
            }
        };

        // 先停止向该连接投递，再让事件队列处理完剩余事件和断开
        state.broadcaster.unregister(connection_id);
        match session {
            Some(session) => {
                session.close().await;
            }
            None => {
                // 接收任务被中止时会话句柄随之丢弃，路由任务会自行补发断开
                tracing::debug!(connection_id = %connection_id, "会话句柄已随接收任务释放");
            }
        }

        tracing::info!(connection_id = %connection_id, "WebSocket 连接已断开");
    }

    /// 处理来自客户端的消息
    async fn handle_incoming(
        connection_id: ConnectionId,
        message: WsMessage,
        session: &SessionHandle,
        cmd_tx: &mpsc::Sender<WsCommand>,
    ) -> Result<(), ()> {
        match message {
            WsMessage::Text(text) => match ClientEvent::from_frame(text.as_str()) {
                Ok(event) => {
                    if !session.submit(event) {
                        return Err(());
                    }
                }
                Err(err) => {
                    tracing::warn!(connection_id = %connection_id, error = %err, "忽略无法解析的帧");
                }
            },
            WsMessage::Binary(_) => {
                tracing::debug!(connection_id = %connection_id, "忽略二进制帧");
            }
            WsMessage::Ping(data) => {
                if cmd_tx.send(WsCommand::SendPong(data)).await.is_err() {
                    return Err(());
                }
            }
            WsMessage::Pong(_) => {}
            WsMessage::Close(_) => {
                tracing::debug!(connection_id = %connection_id, "WebSocket收到关闭消息");
                return Err(());
            }
        }
        Ok(())
    }
}

/// WebSocket 写操作命令
#[derive(Debug)]
enum WsCommand {
    SendPong(Bytes),
}
