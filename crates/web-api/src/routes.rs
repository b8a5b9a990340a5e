use axum::{
    extract::{State, WebSocketUpgrade},
    http::{Method, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{state::AppState, ws_connection::WebSocketConnection};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);

    Router::new()
        .route_service("/", ServeFile::new(&state.assets.index_file))
        .route("/health", get(health))
        .route("/ws", get(websocket_upgrade))
        .fallback_service(ServeDir::new(&state.assets.root))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn websocket_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        WebSocketConnection::new(socket, state).run().await;
    })
}
