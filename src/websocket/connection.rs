use axum::extract::ws::{Message as WsMessage, WebSocket};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use std::{net::SocketAddr, sync::Arc};
use tokio::{sync::mpsc, time::interval};
use tracing::{debug, error, info, warn};

use crate::{
    models::{ClientData, ServerEvent},
    state::AppState,
    websocket::dispatch,
};

pub async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    ip: SocketAddr,
    user_agent: Option<String>,
    id: Arc<str>,
) {
    let (tx, mut rx) = mpsc::channel::<Arc<str>>(state.config.queue_capacity);
    let client = ClientData::new(id.clone(), ip, user_agent, tx);

    if !state.registry.add(client).await {
        warn!(client = %id, "Connection id already registered, closing");
        return;
    }
    info!(client = %id, peer = %ip, "Client connected");

    state.registry.send_to(&id, &ServerEvent::welcome()).await;

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Send task
    let heartbeat_every = state.config.heartbeat_interval();
    let send_id = id.clone();
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = interval(heartbeat_every);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                frame = rx.recv() => {
                    let Some(frame) = frame else { break };
                    if ws_sender.send(WsMessage::Text(frame.as_ref().into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    let ping = match (ServerEvent::Ping { timestamp: Utc::now() }).to_frame() {
                        Ok(frame) => frame,
                        Err(e) => {
                            error!(client = %send_id, error = %e, "Failed to encode heartbeat");
                            continue;
                        }
                    };
                    if ws_sender.send(WsMessage::Text(ping.as_ref().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Receive task
    let recv_state = state.clone();
    let recv_id = id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(WsMessage::Text(text)) => {
                    debug!(client = %recv_id, len = text.len(), "Frame received");
                    dispatch::handle_text(&recv_state, &recv_id, text.as_str()).await;
                }
                Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {
                    recv_state.registry.touch(&recv_id).await;
                }
                Ok(WsMessage::Close(_)) => break,
                Ok(WsMessage::Binary(_)) => continue,
                Err(e) => {
                    debug!(client = %recv_id, error = %e, "Socket error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.registry.remove(&id).await;
    let remaining = state.registry.size().await;
    info!(client = %id, remaining, "Client disconnected");
}
