use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use super::handlers;
use crate::state::AppState;

pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/status", get(handlers::status_handler))
        .route("/api/stats", get(handlers::stats_handler))
        .route("/api/attacks", get(handlers::attacks_handler))
        .route("/api/attack-mode", post(handlers::attack_mode_handler))
}
