#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use application::{InMemoryMessageStore, MessageStore, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpListener, net::TcpStream, sync::oneshot, time::timeout};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as TungsteniteMessage, MaybeTlsStream, WebSocketStream,
};
use web_api::{router, AppState, StaticAssets};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const INDEX_HTML: &str = "<!doctype html><title>chatter</title>";
pub const APP_JS: &str = "console.log('chatter');";

pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<InMemoryMessageStore>,
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn connect(&self) -> Client {
        let (ws, _) = connect_async(format!("ws://{}/ws", self.addr))
            .await
            .expect("websocket connect");
        ws
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// 为每个测试准备独立的静态资源目录
fn static_assets() -> StaticAssets {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "chatter-web-api-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    let public = dir.join("public");
    std::fs::create_dir_all(&public).expect("create static dir");
    std::fs::write(dir.join("index.html"), INDEX_HTML).expect("write index");
    std::fs::write(public.join("app.js"), APP_JS).expect("write asset");

    StaticAssets {
        root: public,
        index_file: dir.join("index.html"),
    }
}

pub async fn spawn_server() -> TestServer {
    let store = Arc::new(InMemoryMessageStore::new());
    let state = AppState::with_store(store.clone() as Arc<dyn MessageStore>, static_assets());
    let app = router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    TestServer {
        addr,
        store,
        state,
        shutdown: Some(shutdown_tx),
    }
}

pub async fn send_json(ws: &mut Client, frame: serde_json::Value) {
    ws.send(TungsteniteMessage::Text(frame.to_string().into()))
        .await
        .expect("send frame");
}

/// 读取下一个服务端事件，跳过控制帧
pub async fn next_event(ws: &mut Client) -> ServerEvent {
    loop {
        let message = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for server event")
            .expect("stream ended")
            .expect("websocket error");
        if let TungsteniteMessage::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("server event json");
        }
    }
}
