use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    models::{ClientMessage, ServerEvent},
    state::AppState,
};

/// Decodes one inbound text frame and acts on it. Malformed input is logged
/// and dropped; the connection stays open.
pub async fn handle_text(state: &AppState, id: &str, text: &str) {
    match ClientMessage::from_frame(text) {
        Ok(message) => handle_message(state, id, message).await,
        Err(e) => warn!(client = %id, error = %e, "Dropping malformed message"),
    }
}

pub async fn handle_message(state: &AppState, id: &str, message: ClientMessage) {
    match message {
        ClientMessage::ClientConnected { .. } => {
            debug!(client = %id, "Sending initial data");
            let snapshot = state.snapshot().await;
            state.registry.send_to(id, &snapshot).await;
        }
        ClientMessage::AttackMode { enabled } => {
            debug!(client = %id, enabled, "Attack mode requested");
            state.set_attack_mode(enabled).await;
        }
        ClientMessage::Ping { .. } => {
            let pong = ServerEvent::Pong { timestamp: Utc::now() };
            state.registry.send_to(id, &pong).await;
        }
        ClientMessage::Pong { .. } => {
            state.registry.touch(id).await;
        }
        ClientMessage::Unknown => {
            debug!(client = %id, "Ignoring message with unknown type");
        }
    }
}
