//! Local stand-in for the server once reconnecting has been given up.

use std::time::Duration;
use tinyrand::Rand;

use crate::{generator::draw, models::ServerEvent};

pub const SIMULATED_ATTACK_INTERVAL: Duration = Duration::from_secs(3);
pub const SIMULATED_STATS_INTERVAL: Duration = Duration::from_secs(10);

/// `None` when the tick is skipped.
pub fn attack_event<R: Rand>(rng: &mut R, attack_mode: bool) -> Option<ServerEvent> {
    let draw = draw::draw_attack(rng, &draw::SIMULATED_ATTACKS, attack_mode)?;
    Some(ServerEvent::AttackEvent {
        event: draw.feed_entry(),
        attacker: Some(draw.attacker()),
    })
}

pub fn stats_event<R: Rand>(rng: &mut R, attack_mode: bool) -> ServerEvent {
    ServerEvent::StatsUpdate {
        stats: draw::draw_stats(rng, &draw::SIMULATED_STATS, attack_mode, None),
    }
}
