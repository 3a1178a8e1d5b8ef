use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, VecDeque};

use super::router::DashboardSink;
use crate::models::{AttackerRecord, ChartSample, FeedEntry, GeoPoint, Stats};

pub const FEED_CAPACITY: usize = 50;
pub const CHART_CAPACITY: usize = 50;
pub const MAP_CAPACITY: usize = 100;

/// Bounded in-memory view of the event stream, printed line by line when
/// `echo` is set.
#[derive(Debug, Default)]
pub struct Dashboard {
    feed: VecDeque<FeedEntry>,
    chart: VecDeque<ChartSample>,
    markers: VecDeque<GeoPoint>,
    attackers: HashMap<String, AttackerRecord>,
    countries: BTreeSet<String>,
    stats: Option<Stats>,
    attack_mode: bool,
    echo: bool,
}

fn push_bounded<T>(buffer: &mut VecDeque<T>, item: T, capacity: usize) {
    if buffer.len() == capacity {
        buffer.pop_front();
    }
    buffer.push_back(item);
}

impl Dashboard {
    pub fn new(echo: bool) -> Self {
        Self {
            feed: VecDeque::with_capacity(FEED_CAPACITY),
            chart: VecDeque::with_capacity(CHART_CAPACITY),
            markers: VecDeque::with_capacity(MAP_CAPACITY),
            echo,
            ..Self::default()
        }
    }

    /// Newest first.
    pub fn feed(&self) -> impl Iterator<Item = &FeedEntry> {
        self.feed.iter().rev()
    }

    pub fn chart(&self) -> &VecDeque<ChartSample> {
        &self.chart
    }

    pub fn markers(&self) -> &VecDeque<GeoPoint> {
        &self.markers
    }

    pub fn attacker(&self, ip: &str) -> Option<&AttackerRecord> {
        self.attackers.get(ip)
    }

    pub fn attacker_count(&self) -> usize {
        self.attackers.len()
    }

    pub fn countries(&self) -> &BTreeSet<String> {
        &self.countries
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    pub fn attack_mode(&self) -> bool {
        self.attack_mode
    }

    fn remember(&mut self, mut record: AttackerRecord, seen: DateTime<Utc>) {
        record.last_seen = Some(record.last_seen.unwrap_or(seen).max(seen));
        self.countries.insert(record.country.clone());
        self.attackers.insert(record.ip.clone(), record);
    }

    fn print(&self, line: std::fmt::Arguments<'_>) {
        if self.echo {
            println!("{line}");
        }
    }
}

impl DashboardSink for Dashboard {
    fn on_welcome(&mut self, message: &str) {
        self.print(format_args!("* {message}"));
    }

    fn on_snapshot(&mut self, stats: &Stats, attackers: &[AttackerRecord]) {
        self.stats = Some(stats.clone());
        for record in attackers {
            let seen = record.last_seen.unwrap_or_else(Utc::now);
            self.remember(record.clone(), seen);
        }
        self.print(format_args!(
            "* snapshot: {} threats, {} attackers on record",
            stats.active_threats,
            self.attackers.len()
        ));
    }

    fn on_feed_entry(&mut self, entry: &FeedEntry, attacker: Option<&AttackerRecord>) {
        if let Some(record) = attacker {
            self.remember(record.clone(), entry.timestamp);
        }
        self.print(format_args!(
            "[{}] {:<6} {} - {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.risk,
            entry.title,
            entry.details
        ));
        push_bounded(&mut self.feed, entry.clone(), FEED_CAPACITY);
    }

    fn on_stats(&mut self, stats: &Stats) {
        self.print(format_args!(
            "* stats: {} active threats, {} blocked IPs, {} countries",
            stats.active_threats, stats.blocked_ips, stats.countries
        ));
        self.stats = Some(stats.clone());
    }

    fn on_chart_sample(&mut self, sample: &ChartSample) {
        push_bounded(&mut self.chart, sample.clone(), CHART_CAPACITY);
    }

    fn on_map_point(&mut self, point: &GeoPoint) {
        self.countries.insert(point.country.clone());
        push_bounded(&mut self.markers, point.clone(), MAP_CAPACITY);
    }

    fn on_mode_changed(&mut self, enabled: bool) {
        self.attack_mode = enabled;
        self.print(format_args!("* attack mode {}", if enabled { "ON" } else { "off" }));
    }
}
