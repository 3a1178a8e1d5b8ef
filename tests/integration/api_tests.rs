use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::mpsc;
use tower::ServiceExt;

use cyberwatch::{
    Server,
    models::{ClientData, ServerEvent},
};

use crate::helpers::*;

async fn call(state: Arc<cyberwatch::AppState>, request: Request<Body>) -> (StatusCode, Value) {
    let response = Server::router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_status_reports_connections_and_mode() {
    let state = create_test_state();
    let (tx, _rx) = mpsc::channel(4);
    let addr = "127.0.0.1:8080".parse::<SocketAddr>().unwrap();
    let agent = Some("Test Agent".to_string());
    state
        .registry
        .add(ClientData::new(Arc::from("TEST1234"), addr, agent, tx))
        .await;
    state.registry.touch("TEST1234").await;

    let (status, body) = call(state, get("/api/status")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "online");
    assert_eq!(body["connectedClients"], 1);
    assert_eq!(body["attackMode"], false);
    assert!(body["uptime"].is_u64());
    assert!(body["timestamp"].is_string());

    let client = &body["clients"][0];
    assert_eq!(client["id"], "TEST1234");
    assert_eq!(client["ip"], "127.0.0.1");
    assert_eq!(client["userAgent"], "Test Agent");
    assert!(client["connectedAt"].is_string());
    assert!(client["lastActivity"].is_string());
}

#[tokio::test]
async fn test_stats_and_attacks() {
    let state = create_test_state();

    let (status, stats) = call(state.clone(), get("/api/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(stats["activeThreats"].is_u64());
    assert!(stats["blockedIPs"].is_u64());

    let (status, attacks) = call(state, get("/api/attacks")).await;
    assert_eq!(status, StatusCode::OK);
    let attacks = attacks.as_array().unwrap();
    assert_eq!(attacks.len(), 10);
    assert!(attacks[0]["ip"].is_string());
    assert!(attacks[0]["type"].is_string());
}

#[tokio::test]
async fn test_attack_mode_post_broadcasts() {
    let state = create_test_state();
    let (tx, mut rx) = mpsc::channel(4);
    let addr = "127.0.0.1:8080".parse::<SocketAddr>().unwrap();
    state.registry.add(ClientData::new(Arc::from("TEST1234"), addr, None, tx)).await;

    let request = post_json("/api/attack-mode", r#"{"enabled":true}"#);
    let (status, body) = call(state.clone(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["attackMode"], true);
    assert!(state.mode.is_enabled());
    let frame = rx.recv().await.unwrap();
    assert_eq!(
        ServerEvent::from_frame(&frame).unwrap(),
        ServerEvent::AttackModeChanged { enabled: true }
    );
}

#[tokio::test]
async fn test_attack_mode_missing_field_means_off() {
    let state = create_test_state();
    state.mode.set(true);

    let (status, body) = call(state.clone(), post_json("/api/attack-mode", "{}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attackMode"], false);
    assert!(!state.mode.is_enabled());
}

#[tokio::test]
async fn test_attack_mode_invalid_json() {
    let state = create_test_state();

    let (status, body) = call(state.clone(), post_json("/api/attack-mode", "{enabled:")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
    assert!(!state.mode.is_enabled());
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (status, body) = call(create_test_state(), get("/nonexistent")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}
