use tokio::{sync::mpsc, time::timeout};

use cyberwatch::{
    client::{
        ClientTransport, DashboardSink, ReconnectPolicy, TransportState, WsConnector, api,
        endpoint::endpoint_for_origin,
    },
    models::{AttackerRecord, Stats},
};

use crate::helpers::*;

/// Forwards the name of every routed event to the test.
struct Forward(mpsc::UnboundedSender<&'static str>);

impl DashboardSink for Forward {
    fn on_welcome(&mut self, _message: &str) {
        let _ = self.0.send("welcome");
    }

    fn on_snapshot(&mut self, _stats: &Stats, attackers: &[AttackerRecord]) {
        assert_eq!(attackers.len(), 10);
        let _ = self.0.send("snapshot");
    }

    fn on_mode_changed(&mut self, enabled: bool) {
        let _ = self.0.send(if enabled { "mode:on" } else { "mode:off" });
    }
}

async fn next_kind(rx: &mut mpsc::UnboundedReceiver<&'static str>) -> &'static str {
    timeout(WAIT, rx.recv()).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_transport_handshake_against_server() {
    let state = create_test_state();
    let addr = spawn_server(state.clone()).await;
    let endpoint = endpoint_for_origin(&format!("http://{}", addr.ip()), addr.port()).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (transport, handle) = ClientTransport::new(
        WsConnector::default(),
        endpoint,
        ReconnectPolicy::default(),
        Forward(tx),
    );
    let driver = tokio::spawn(transport.run());

    assert_eq!(next_kind(&mut rx).await, "welcome");
    assert_eq!(next_kind(&mut rx).await, "snapshot");
    assert_eq!(handle.state(), TransportState::Connected);

    handle.set_attack_mode(true);
    assert_eq!(next_kind(&mut rx).await, "mode:on");
    assert!(state.mode.is_enabled());

    handle.disconnect();
    driver.await.unwrap();
    wait_for_clients(&state, 0).await;
}

#[tokio::test]
async fn test_http_api_helpers() {
    let state = create_test_state();
    let addr = spawn_server(state.clone()).await;
    let base = format!("http://{addr}");

    let report = api::fetch_status(&base).await.unwrap();
    assert_eq!(report.status, "online");
    assert!(!report.attack_mode);

    assert!(api::set_remote_attack_mode(&base, true).await.unwrap());
    assert!(state.mode.is_enabled());
    assert!(api::fetch_status(&base).await.unwrap().attack_mode);
}
