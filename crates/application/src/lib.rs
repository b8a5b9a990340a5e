//! 应用层实现。
//!
//! 这里提供聊天室的连接生命周期与消息广播用例：在线用户注册表、事件路由、
//! 广播通道、消息存储抽象以及停机清理。

pub mod broadcaster;
pub mod clock;
pub mod error;
pub mod local_broadcast;
pub mod presence;
pub mod protocol;
pub mod repository;
pub mod services;
pub mod shutdown;

pub use broadcaster::{Broadcaster, OutboundEvent};
pub use clock::{Clock, SystemClock};
pub use error::{ApplicationError, ApplicationResult};
pub use local_broadcast::{LocalBroadcaster, OutboundReceiver};
pub use presence::PresenceRegistry;
pub use protocol::{ClientEvent, MessageCreated, ProtocolError, SendMessagePayload, ServerEvent};
pub use repository::{memory::InMemoryMessageStore, MessageStore};
pub use services::{
    ChatService, ChatServiceDependencies, ConnectionSession, ConnectionState, SessionHandle,
};
pub use shutdown::{ShutdownCoordinator, ShutdownOutcome};
