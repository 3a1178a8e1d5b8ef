//! Periodic producers of synthetic telemetry.
//!
//! Each producer is its own task and reads the attack-mode flag on every
//! tick, so a toggle takes effect from the next tick onward.

pub mod draw;

use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tinyrand::{Rand, Seeded, StdRand};
use tinyrand_std::thread_rand;
use tokio::{
    task::JoinHandle,
    time::{Instant, interval_at, sleep},
};
use tracing::{debug, info};

use crate::{models::ServerEvent, state::AppState};

pub const ATTACK_INTERVAL_CALM: Duration = Duration::from_secs(5);
pub const ATTACK_INTERVAL_ACTIVE: Duration = Duration::from_secs(2);
pub const STATS_INTERVAL: Duration = Duration::from_secs(10);
pub const CHART_INTERVAL: Duration = Duration::from_secs(3);
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

pub fn attack_interval(attack_mode: bool) -> Duration {
    if attack_mode {
        ATTACK_INTERVAL_ACTIVE
    } else {
        ATTACK_INTERVAL_CALM
    }
}

fn fresh_rng() -> StdRand {
    StdRand::seed(thread_rand().next_u64())
}

/// Handles to the running producers. Dropping it leaves them running;
/// call [`Generator::shutdown`] to stop them.
pub struct Generator {
    tasks: Vec<JoinHandle<()>>,
}

impl Generator {
    pub fn spawn(state: Arc<AppState>) -> Self {
        info!("Starting event generator");
        let tasks = vec![
            tokio::spawn(attack_loop(state.clone())),
            tokio::spawn(stats_loop(state.clone())),
            tokio::spawn(chart_loop(state.clone())),
            tokio::spawn(cleanup_loop(state)),
        ];
        Self { tasks }
    }

    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
        info!("Event generator stopped");
    }
}

/// Draws one attack and, unless the tick is skipped, records it and sends
/// `attack_event` followed by `map_update`. Returns whether anything was sent.
pub async fn emit_attack<R: Rand>(state: &AppState, rng: &mut R) -> bool {
    let attack_mode = state.mode.is_enabled();
    let Some(draw) = draw::draw_attack(rng, &draw::SERVER_ATTACKS, attack_mode) else {
        debug!("Attack tick skipped");
        return false;
    };

    let attacker = draw.attacker();
    state.attackers.upsert(attacker.clone(), draw.timestamp).await;

    state
        .registry
        .broadcast(&ServerEvent::AttackEvent {
            event: draw.feed_entry(),
            attacker: Some(attacker),
        })
        .await;
    state
        .registry
        .broadcast(&ServerEvent::MapUpdate {
            location: draw.location(),
        })
        .await;
    true
}

async fn attack_loop(state: Arc<AppState>) {
    let mut rng = fresh_rng();
    loop {
        sleep(attack_interval(state.mode.is_enabled())).await;
        emit_attack(&state, &mut rng).await;
    }
}

async fn stats_loop(state: Arc<AppState>) {
    let mut ticker = interval_at(Instant::now() + STATS_INTERVAL, STATS_INTERVAL);
    loop {
        ticker.tick().await;
        let stats = state.current_stats();
        state.registry.broadcast(&ServerEvent::StatsUpdate { stats }).await;
    }
}

async fn chart_loop(state: Arc<AppState>) {
    let mut rng = fresh_rng();
    let mut ticker = interval_at(Instant::now() + CHART_INTERVAL, CHART_INTERVAL);
    loop {
        ticker.tick().await;
        let data = draw::draw_chart_sample(&mut rng, state.mode.is_enabled());
        state.registry.broadcast(&ServerEvent::ChartData { data }).await;
    }
}

async fn cleanup_loop(state: Arc<AppState>) {
    let mut ticker = interval_at(Instant::now() + CLEANUP_INTERVAL, CLEANUP_INTERVAL);
    loop {
        ticker.tick().await;
        let evicted = state.attackers.evict_expired(Utc::now()).await;
        if evicted > 0 {
            let remaining = state.attackers.len().await;
            info!(evicted, remaining, "Expired attacker records");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, models::ClientData};
    use std::net::SocketAddr;
    use tokio::sync::mpsc;

    async fn state_with_client() -> (Arc<AppState>, mpsc::Receiver<Arc<str>>) {
        let state = Arc::new(AppState::new(Config::default()));
        let (tx, rx) = mpsc::channel(16);
        let addr = "127.0.0.1:9000".parse::<SocketAddr>().unwrap();
        state.registry.add(ClientData::new(Arc::from("A"), addr, None, tx)).await;
        (state, rx)
    }

    fn require_send<T: Send>(_: T) {}

    #[test]
    fn test_producer_futures_are_send() {
        let state = Arc::new(AppState::new(Config::default()));
        require_send(attack_loop(state.clone()));
        require_send(stats_loop(state.clone()));
        require_send(chart_loop(state.clone()));
        require_send(cleanup_loop(state));
    }

    #[test]
    fn test_attack_interval_follows_mode() {
        assert_eq!(attack_interval(true), Duration::from_secs(2));
        assert_eq!(attack_interval(false), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_emit_attack_sends_event_then_location() {
        let (state, mut rx) = state_with_client().await;
        state.mode.set(true);
        let mut rng = StdRand::seed(7);

        assert!(emit_attack(&state, &mut rng).await);

        let first = ServerEvent::from_frame(&rx.recv().await.unwrap()).unwrap();
        let second = ServerEvent::from_frame(&rx.recv().await.unwrap()).unwrap();
        let (entry, attacker) = match first {
            ServerEvent::AttackEvent { event, attacker } => (event, attacker.unwrap()),
            other => panic!("expected attack_event, got {other:?}"),
        };
        match second {
            ServerEvent::MapUpdate { location } => {
                assert_eq!(location.country, attacker.country);
                assert_eq!(location.category, entry.category);
            }
            other => panic!("expected map_update, got {other:?}"),
        }
        assert_eq!(state.attackers.len().await, 1);
    }

    #[tokio::test]
    async fn test_calm_ticks_sometimes_emit_nothing() {
        let (state, _rx) = state_with_client().await;
        let mut rng = StdRand::seed(13);

        let mut emitted = 0;
        for _ in 0..50 {
            if emit_attack(&state, &mut rng).await {
                emitted += 1;
            }
        }
        assert!(emitted > 0 && emitted < 50, "emitted {emitted}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_generator_produces_chart_samples() {
        let (state, mut rx) = state_with_client().await;
        let generator = Generator::spawn(state.clone());

        tokio::time::sleep(CHART_INTERVAL + Duration::from_millis(10)).await;
        let mut kinds = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            kinds.push(ServerEvent::from_frame(&frame).unwrap().kind());
        }
        generator.shutdown();

        assert!(kinds.contains(&"chart_data"), "got {kinds:?}");
        assert!(!kinds.contains(&"stats_update"));
    }
}
