use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc::error::TrySendError};
use tracing::{debug, error, warn};

use crate::models::{ClientData, ServerEvent};

pub type Clients = Arc<RwLock<HashMap<Arc<str>, ClientData>>>;

/// The set of open connections.
///
/// Sending never waits on a socket: frames are pushed onto each connection's
/// bounded queue with `try_send`. A closed or full queue is a send failure and
/// removes that connection.
#[derive(Clone, Debug, Default)]
pub struct ConnectionRegistry {
    clients: Clients,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if a connection with the same id is already registered.
    pub async fn add(&self, client: ClientData) -> bool {
        let mut clients = self.clients.write().await;
        if clients.contains_key(&client.id) {
            return false;
        }
        clients.insert(client.id.clone(), client);
        true
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.clients.write().await.remove(id).is_some()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.clients.read().await.contains_key(id)
    }

    /// Records inbound activity on a connection.
    pub async fn touch(&self, id: &str) {
        if let Some(client) = self.clients.read().await.get(id) {
            client.touch();
        }
    }

    pub async fn size(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn clients(&self) -> Vec<ClientData> {
        self.clients.read().await.values().cloned().collect()
    }

    /// Sends `event` to every registered connection; returns the delivery count.
    pub async fn broadcast(&self, event: &ServerEvent) -> usize {
        match event.to_frame() {
            Ok(frame) => self.broadcast_frame(frame).await,
            Err(e) => {
                error!(kind = event.kind(), error = %e, "Failed to encode broadcast");
                0
            }
        }
    }

    /// Delivers an already-encoded frame to the membership as of this call.
    pub async fn broadcast_frame(&self, frame: Arc<str>) -> usize {
        let targets: Vec<(Arc<str>, _)> = {
            let clients = self.clients.read().await;
            clients
                .values()
                .map(|client| (client.id.clone(), client.tx.clone()))
                .collect()
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    let reason = send_failure(&e);
                    warn!(client = %id, reason, "Dropping client after failed send");
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut clients = self.clients.write().await;
            for id in &failed {
                clients.remove(id);
            }
        }

        debug!(delivered, dropped = failed.len(), "Broadcast complete");
        delivered
    }

    /// Sends `event` to one connection. Returns `false` if it is not
    /// registered or the send failed, in which case it is removed.
    pub async fn send_to(&self, id: &str, event: &ServerEvent) -> bool {
        let tx = match self.clients.read().await.get(id) {
            Some(client) => client.tx.clone(),
            None => return false,
        };

        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(client = %id, kind = event.kind(), error = %e, "Failed to encode reply");
                return false;
            }
        };

        match tx.try_send(frame) {
            Ok(()) => true,
            Err(e) => {
                warn!(client = %id, reason = send_failure(&e), "Dropping client after failed send");
                self.remove(id).await;
                false
            }
        }
    }
}

fn send_failure<T>(e: &TrySendError<T>) -> &'static str {
    match e {
        TrySendError::Full(_) => "queue full",
        TrySendError::Closed(_) => "connection closed",
    }
}
