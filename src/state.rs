use chrono::Utc;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};
use tinyrand::{Rand, Seeded, StdRand};
use tinyrand_std::thread_rand;
use tracing::info;

use crate::{
    config::Config,
    generator::draw,
    models::{AttackerRecord, ServerEvent, Stats},
    utils::attacker_book::AttackerBook,
    websocket::registry::ConnectionRegistry,
};

/// Records included in an `initial_data` snapshot and `/api/attacks`.
pub const SNAPSHOT_SIZE: usize = 10;

/// Process-wide attack-mode flag. Clones share the same flag; last write wins.
#[derive(Clone, Debug, Default)]
pub struct AttackMode(Arc<AtomicBool>);

impl AttackMode {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Stores the new value and returns the previous one.
    pub fn set(&self, enabled: bool) -> bool {
        self.0.swap(enabled, Ordering::Relaxed)
    }
}

pub struct AppState {
    pub registry: ConnectionRegistry,
    pub mode: AttackMode,
    pub attackers: AttackerBook,
    pub config: Config,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            mode: AttackMode::new(config.attack_mode),
            attackers: AttackerBook::new(config.retention(), config.max_attackers),
            config,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Updates the mode and tells every connection, the caller's included.
    pub async fn set_attack_mode(&self, enabled: bool) -> usize {
        let previous = self.mode.set(enabled);
        info!(enabled, previous, "Attack mode set");
        self.registry
            .broadcast(&ServerEvent::AttackModeChanged { enabled })
            .await
    }

    pub fn current_stats(&self) -> Stats {
        draw::draw_stats(
            &mut thread_rand(),
            &draw::SERVER_STATS,
            self.mode.is_enabled(),
            Some(self.uptime_secs()),
        )
    }

    /// The most recent attackers, topped up with synthetic records so the
    /// sample always has [`SNAPSHOT_SIZE`] entries.
    pub async fn attacker_sample(&self) -> Vec<AttackerRecord> {
        let mut sample = self.attackers.recent(SNAPSHOT_SIZE).await;
        if sample.len() < SNAPSHOT_SIZE {
            let mut rng = StdRand::seed(thread_rand().next_u64());
            let now = Utc::now();
            while sample.len() < SNAPSHOT_SIZE {
                sample.push(draw::draw_archived_attacker(&mut rng, now));
            }
        }
        sample
    }

    pub async fn snapshot(&self) -> ServerEvent {
        ServerEvent::InitialData {
            stats: self.current_stats(),
            attacks: self.attacker_sample().await,
        }
    }
}
