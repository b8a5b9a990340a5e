//! Web API 层。
//!
//! 提供 Axum 路由：入口页面、静态资源，以及承载聊天事件协议的 WebSocket 端点。

mod routes;
mod state;
mod ws_connection;

pub use routes::router;
pub use state::{AppState, StaticAssets};
pub use ws_connection::WebSocketConnection;
