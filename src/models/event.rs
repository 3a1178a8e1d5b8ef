//! Wire vocabulary shared by the server and the client.
//!
//! Every frame is a JSON object whose `type` field selects the variant.
//! Tags this build does not know decode to `Unknown` so that consumers can
//! skip them; text that is not a JSON object with a `type` is a codec error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::attack::{AttackCategory, AttackerRecord, RiskTier};
use crate::error::Result;

pub const WELCOME_MESSAGE: &str = "Connected to CyberWatch Security Server";

/// Feed line describing a single attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub details: String,
    pub risk: RiskTier,
    #[serde(rename = "type")]
    pub category: AttackCategory,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub active_threats: u32,
    #[serde(rename = "blockedIPs")]
    pub blocked_ips: u32,
    pub countries: u32,
    /// Seconds since the server started; absent for simulated stats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSample {
    pub blocked: u32,
    pub allowed: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub country: String,
    pub risk: RiskTier,
    #[serde(rename = "type")]
    pub category: AttackCategory,
}

/// Server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    ConnectionEstablished {
        message: String,
        timestamp: DateTime<Utc>,
    },
    InitialData {
        stats: Stats,
        attacks: Vec<AttackerRecord>,
    },
    AttackModeChanged {
        enabled: bool,
    },
    AttackEvent {
        event: FeedEntry,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attacker: Option<AttackerRecord>,
    },
    StatsUpdate {
        stats: Stats,
    },
    ChartData {
        data: ChartSample,
    },
    MapUpdate {
        location: GeoPoint,
    },
    Ping {
        timestamp: DateTime<Utc>,
    },
    Pong {
        timestamp: DateTime<Utc>,
    },
    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    pub fn welcome() -> Self {
        Self::ConnectionEstablished {
            message: WELCOME_MESSAGE.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished { .. } => "connection_established",
            Self::InitialData { .. } => "initial_data",
            Self::AttackModeChanged { .. } => "attack_mode_changed",
            Self::AttackEvent { .. } => "attack_event",
            Self::StatsUpdate { .. } => "stats_update",
            Self::ChartData { .. } => "chart_data",
            Self::MapUpdate { .. } => "map_update",
            Self::Ping { .. } => "ping",
            Self::Pong { .. } => "pong",
            Self::Unknown => "unknown",
        }
    }

    /// Serializes once into a frame that can be shared between connections.
    pub fn to_frame(&self) -> Result<Arc<str>> {
        Ok(Arc::from(serde_json::to_string(self)?))
    }

    pub fn from_frame(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    ClientConnected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    AttackMode {
        #[serde(default)]
        enabled: bool,
    },
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    pub fn client_connected() -> Self {
        Self::ClientConnected {
            timestamp: Some(Utc::now()),
        }
    }

    pub fn pong() -> Self {
        Self::Pong {
            timestamp: Some(Utc::now()),
        }
    }

    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_frame(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
