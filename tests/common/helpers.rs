use futures_util::{SinkExt, StreamExt};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use cyberwatch::{AppState, Config, Server, models::ServerEvent};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const WAIT: Duration = Duration::from_secs(5);

pub fn create_test_state() -> Arc<AppState> {
    Arc::new(AppState::new(Config::default()))
}

/// Serves the full router on an ephemeral port. Producers are not started,
/// so every frame a test sees was caused by the test.
pub async fn spawn_server(state: Arc<AppState>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Server::router(state).into_make_service_with_connect_info::<SocketAddr>();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

/// Connects and consumes the welcome frame.
pub async fn connect_ready(addr: SocketAddr) -> WsClient {
    let mut ws = connect(addr).await;
    assert!(matches!(next_event(&mut ws).await, ServerEvent::ConnectionEstablished { .. }));
    ws
}

pub async fn send_text(ws: &mut WsClient, text: &str) {
    ws.send(Message::text(text)).await.unwrap();
}

pub async fn next_event(ws: &mut WsClient) -> ServerEvent {
    try_next_event(ws, WAIT).await.expect("no event before timeout")
}

/// The next text frame decoded, or `None` if nothing arrives within `wait`.
pub async fn try_next_event(ws: &mut WsClient, wait: Duration) -> Option<ServerEvent> {
    timeout(wait, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return ServerEvent::from_frame(text.as_str()).unwrap();
                }
                Some(Ok(_)) => continue,
                other => panic!("socket ended: {other:?}"),
            }
        }
    })
    .await
    .ok()
}

/// Polls until the registry holds `expected` connections.
pub async fn wait_for_clients(state: &AppState, expected: usize) {
    timeout(WAIT, async {
        while state.registry.size().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("registry size never settled");
}
