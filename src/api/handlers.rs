use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::ApiError;
use crate::{
    models::{
        AttackModePayload, AttackModeReply, AttackerRecord, ClientData, Stats, StatusReport,
    },
    state::AppState,
};

pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    let mut clients: Vec<_> = state
        .registry
        .clients()
        .await
        .iter()
        .map(ClientData::summary)
        .collect();
    clients.sort_by(|a, b| a.connected_at.cmp(&b.connected_at));

    Json(StatusReport {
        status: "online".to_string(),
        uptime: state.uptime_secs(),
        attack_mode: state.mode.is_enabled(),
        connected_clients: clients.len(),
        timestamp: Utc::now(),
        clients,
    })
}

pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<Stats> {
    Json(state.current_stats())
}

pub async fn attacks_handler(State(state): State<Arc<AppState>>) -> Json<Vec<AttackerRecord>> {
    Json(state.attacker_sample().await)
}

pub async fn attack_mode_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AttackModePayload>, JsonRejection>,
) -> Result<Json<AttackModeReply>, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "Rejected attack-mode request");
        ApiError::BadRequest
    })?;

    let notified = state.set_attack_mode(payload.enabled).await;
    info!(enabled = payload.enabled, notified, "Attack mode changed over HTTP");

    Ok(Json(AttackModeReply {
        success: true,
        attack_mode: payload.enabled,
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
