//! Random draws behind every synthetic event.
//!
//! Functions take the random source as a parameter so callers can pass a
//! seeded [`tinyrand::StdRand`] in tests and a fresh one in production.

use chrono::{DateTime, TimeDelta, Utc};
use tinyrand::{Probability, Rand, RandRange};

use crate::models::{
    AttackCategory, AttackerRecord, ChartSample, Country, FeedEntry, GeoPoint, RiskTier, Stats,
    attack::{COUNTRIES, SOURCE_ADDRESSES},
};

/// Maximum distance, in degrees, a map point is moved from its country's reference point.
pub const GEO_JITTER_DEGREES: f64 = 5.0;

/// `floor + [0, width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub width: u32,
    pub floor: u32,
}

impl Span {
    pub const fn new(width: u32, floor: u32) -> Self {
        Self { width, floor }
    }

    pub fn draw<R: Rand>(&self, rng: &mut R) -> u32 {
        self.floor + rng.next_range(0..self.width.max(1))
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.floor && value < self.floor + self.width.max(1)
    }
}

/// Parameters of the attack producer.
#[derive(Debug, Clone, Copy)]
pub struct AttackProfile {
    /// Chance a tick emits nothing while attack mode is off.
    pub calm_skip: f64,
    /// Chance the risk is forced to high while attack mode is on.
    pub high_risk_boost: f64,
    pub attempts: Span,
}

pub const SERVER_ATTACKS: AttackProfile = AttackProfile {
    calm_skip: 0.3,
    high_risk_boost: 0.7,
    attempts: Span::new(100, 1),
};

pub const SIMULATED_ATTACKS: AttackProfile = AttackProfile {
    calm_skip: 0.4,
    high_risk_boost: 0.6,
    attempts: Span::new(50, 1),
};

#[derive(Debug, Clone, Copy)]
pub struct StatsProfile {
    pub calm_threats: Span,
    pub attack_threats: Span,
    pub calm_blocked: Span,
    pub attack_blocked: Span,
    pub countries: Span,
}

pub const SERVER_STATS: StatsProfile = StatsProfile {
    calm_threats: Span::new(5, 2),
    attack_threats: Span::new(25, 15),
    calm_blocked: Span::new(30, 15),
    attack_blocked: Span::new(150, 75),
    countries: Span::new(20, 8),
};

pub const SIMULATED_STATS: StatsProfile = StatsProfile {
    calm_threats: Span::new(20, 1),
    attack_threats: Span::new(50, 10),
    calm_blocked: Span::new(100, 10),
    attack_blocked: Span::new(200, 50),
    countries: Span::new(25, 5),
};

pub const CALM_CHART: (Span, Span) = (Span::new(10, 5), Span::new(60, 30));
pub const ATTACK_CHART: (Span, Span) = (Span::new(40, 20), Span::new(20, 10));

/// One synthetic attack, viewed either as a feed entry or as a map point.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackDraw {
    pub category: AttackCategory,
    pub country: Country,
    pub ip: &'static str,
    pub risk: RiskTier,
    pub attempts: u32,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

impl AttackDraw {
    pub fn feed_entry(&self) -> FeedEntry {
        FeedEntry {
            title: format!("{} Attack Detected", self.category.label()),
            details: format!("Source: {} ({})", self.ip, self.country.name),
            risk: self.risk,
            category: self.category,
            timestamp: self.timestamp,
        }
    }

    pub fn attacker(&self) -> AttackerRecord {
        AttackerRecord {
            ip: self.ip.to_string(),
            country: self.country.name.to_string(),
            category: self.category,
            attempts: self.attempts,
            risk: self.risk,
            last_seen: None,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
            country: self.country.name.to_string(),
            risk: self.risk,
            category: self.category,
        }
    }
}

fn pick<'a, T, R: Rand>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.next_range(0..items.len())]
}

/// Uniform in `[0, 1)`.
fn unit<R: Rand>(rng: &mut R) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

fn jitter<R: Rand>(rng: &mut R) -> f64 {
    (unit(rng) - 0.5) * 2.0 * GEO_JITTER_DEGREES
}

pub fn draw_risk<R: Rand>(rng: &mut R, profile: &AttackProfile, attack_mode: bool) -> RiskTier {
    let risk = *pick(rng, &RiskTier::ALL);
    if attack_mode && rng.next_bool(Probability::new(profile.high_risk_boost)) {
        RiskTier::High
    } else {
        risk
    }
}

/// `None` when the tick is skipped, which only happens outside attack mode.
pub fn draw_attack<R: Rand>(
    rng: &mut R,
    profile: &AttackProfile,
    attack_mode: bool,
) -> Option<AttackDraw> {
    if !attack_mode && rng.next_bool(Probability::new(profile.calm_skip)) {
        return None;
    }

    let category = *pick(rng, &AttackCategory::ALL);
    let country = *pick(rng, &COUNTRIES);
    let ip = *pick(rng, &SOURCE_ADDRESSES);
    let risk = draw_risk(rng, profile, attack_mode);
    let attempts = profile.attempts.draw(rng);

    Some(AttackDraw {
        category,
        country,
        ip,
        risk,
        attempts,
        lat: country.lat + jitter(rng),
        lng: country.lng + jitter(rng),
        timestamp: Utc::now(),
    })
}

pub fn draw_stats<R: Rand>(
    rng: &mut R,
    profile: &StatsProfile,
    attack_mode: bool,
    uptime: Option<u64>,
) -> Stats {
    let (threats, blocked) = if attack_mode {
        (profile.attack_threats, profile.attack_blocked)
    } else {
        (profile.calm_threats, profile.calm_blocked)
    };

    Stats {
        active_threats: threats.draw(rng),
        blocked_ips: blocked.draw(rng),
        countries: profile.countries.draw(rng),
        uptime,
    }
}

pub fn draw_chart_sample<R: Rand>(rng: &mut R, attack_mode: bool) -> ChartSample {
    let (blocked, allowed) = if attack_mode { ATTACK_CHART } else { CALM_CHART };

    ChartSample {
        blocked: blocked.draw(rng),
        allowed: allowed.draw(rng),
        timestamp: Utc::now(),
    }
}

/// A plausible record seen some time in the hour before `now`, used to pad
/// snapshots while the attacker book is still sparse.
pub fn draw_archived_attacker<R: Rand>(rng: &mut R, now: DateTime<Utc>) -> AttackerRecord {
    let category = *pick(rng, &AttackCategory::ALL[..5]);
    let country = pick(rng, &COUNTRIES[..6]);
    let ip = *pick(rng, &SOURCE_ADDRESSES[..4]);
    let age = TimeDelta::milliseconds(rng.next_range(0..3_600_000u64) as i64);

    AttackerRecord {
        ip: ip.to_string(),
        country: country.name.to_string(),
        category,
        attempts: SERVER_ATTACKS.attempts.draw(rng),
        risk: *pick(rng, &RiskTier::ALL),
        last_seen: Some(now - age),
    }
}
