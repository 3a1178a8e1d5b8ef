use chrono::{DateTime, TimeZone, Utc};
use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};
use tokio::sync::mpsc;

use super::ClientSummary;

/// A registered connection: peer metadata plus the queue drained by its writer task.
#[derive(Clone, Debug)]
pub struct ClientData {
    pub id: Arc<str>,
    pub ip: SocketAddr,
    pub user_agent: Option<String>,
    pub connected_at: DateTime<Utc>,
    pub tx: mpsc::Sender<Arc<str>>,
    last_activity: Arc<AtomicI64>,
}

impl ClientData {
    pub fn new(
        id: Arc<str>,
        ip: SocketAddr,
        user_agent: Option<String>,
        tx: mpsc::Sender<Arc<str>>,
    ) -> Self {
        let connected_at = Utc::now();
        Self {
            id,
            ip,
            user_agent,
            connected_at,
            tx,
            last_activity: Arc::new(AtomicI64::new(connected_at.timestamp_millis())),
        }
    }

    pub fn touch(&self) {
        self.last_activity
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.last_activity.load(Ordering::Relaxed))
            .single()
            .unwrap_or(self.connected_at)
    }

    pub fn summary(&self) -> ClientSummary {
        ClientSummary {
            id: self.id.to_string(),
            ip: self.ip.ip().to_string(),
            user_agent: self.user_agent.clone(),
            connected_at: self.connected_at,
            last_activity: self.last_activity(),
        }
    }
}
