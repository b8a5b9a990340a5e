mod chat_service;
mod session;

pub use chat_service::{ChatService, ChatServiceDependencies};
pub use session::{ConnectionSession, ConnectionState, SessionHandle};
