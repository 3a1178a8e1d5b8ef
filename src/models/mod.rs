pub mod attack;
pub mod client;
pub mod event;
pub mod status;

pub use attack::{AttackCategory, AttackerRecord, Country, RiskTier};
pub use client::ClientData;
pub use event::{ChartSample, ClientMessage, FeedEntry, GeoPoint, ServerEvent, Stats};
pub use status::{AttackModePayload, AttackModeReply, ClientSummary, StatusReport};
