use futures_util::SinkExt;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

use cyberwatch::models::{ServerEvent, event::WELCOME_MESSAGE};

use crate::helpers::*;

#[tokio::test]
async fn test_welcome_is_the_first_frame() {
    let state = create_test_state();
    let addr = spawn_server(state.clone()).await;
    let mut ws = connect(addr).await;

    match next_event(&mut ws).await {
        ServerEvent::ConnectionEstablished { message, .. } => assert_eq!(message, WELCOME_MESSAGE),
        other => panic!("expected welcome, got {other:?}"),
    }
    assert!(try_next_event(&mut ws, Duration::from_millis(200)).await.is_none());
    assert_eq!(state.registry.size().await, 1);
}

#[tokio::test]
async fn test_client_connected_yields_snapshot() {
    let state = create_test_state();
    let addr = spawn_server(state).await;
    let mut ws = connect_ready(addr).await;

    send_text(&mut ws, r#"{"type":"client_connected","timestamp":"2024-05-01T10:00:00Z"}"#).await;

    match next_event(&mut ws).await {
        ServerEvent::InitialData { stats, attacks } => {
            assert_eq!(attacks.len(), 10);
            assert!(stats.uptime.is_some());
        }
        other => panic!("expected initial_data, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ping_gets_exactly_one_pong() {
    let state = create_test_state();
    let addr = spawn_server(state).await;
    let mut a = connect_ready(addr).await;
    let mut b = connect_ready(addr).await;

    send_text(&mut a, r#"{"type":"ping","timestamp":"2024-05-01T10:00:00Z"}"#).await;

    assert!(matches!(next_event(&mut a).await, ServerEvent::Pong { .. }));
    assert!(try_next_event(&mut a, Duration::from_millis(200)).await.is_none());
    assert!(try_next_event(&mut b, Duration::from_millis(200)).await.is_none());
}

#[tokio::test]
async fn test_attack_mode_is_broadcast_to_all() {
    let state = create_test_state();
    let addr = spawn_server(state.clone()).await;
    let mut a = connect_ready(addr).await;
    let mut b = connect_ready(addr).await;

    send_text(&mut a, r#"{"type":"attack_mode","enabled":true}"#).await;

    for ws in [&mut a, &mut b] {
        assert_eq!(next_event(ws).await, ServerEvent::AttackModeChanged { enabled: true });
    }
    assert!(state.mode.is_enabled());
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection() {
    let state = create_test_state();
    let addr = spawn_server(state.clone()).await;
    let mut ws = connect_ready(addr).await;

    send_text(&mut ws, "{{{ not json").await;
    send_text(&mut ws, r#"{"type":"subscribe","channel":"alerts"}"#).await;
    ws.send(Message::binary(vec![1u8, 2, 3])).await.unwrap();
    send_text(&mut ws, r#"{"type":"ping"}"#).await;

    assert!(matches!(next_event(&mut ws).await, ServerEvent::Pong { .. }));
    assert_eq!(state.registry.size().await, 1);
}

#[tokio::test]
async fn test_close_removes_connection() {
    let state = create_test_state();
    let addr = spawn_server(state.clone()).await;
    let mut a = connect_ready(addr).await;
    let _b = connect_ready(addr).await;
    wait_for_clients(&state, 2).await;

    a.close(None).await.unwrap();
    wait_for_clients(&state, 1).await;

    let event = ServerEvent::AttackModeChanged { enabled: false };
    assert_eq!(state.registry.broadcast(&event).await, 1);
}
