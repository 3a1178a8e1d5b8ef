use axum::{
    extract::{ConnectInfo, State, ws::WebSocketUpgrade},
    http::HeaderMap,
    response::Response,
};
use std::{net::SocketAddr, sync::Arc};

use crate::{
    state::AppState, utils::id_generator::connection_id, websocket::connection::handle_socket,
};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let user_agent = headers
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let id = connection_id();

    ws.on_upgrade(move |socket| handle_socket(socket, state, addr, user_agent, id))
}
