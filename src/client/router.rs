use tracing::debug;

use crate::models::{AttackerRecord, ChartSample, FeedEntry, GeoPoint, ServerEvent, Stats};

/// Consumer of routed events. Every method has a no-op default so a consumer
/// implements only what it displays.
pub trait DashboardSink: Send + 'static {
    fn on_welcome(&mut self, message: &str) {
        let _ = message;
    }

    fn on_snapshot(&mut self, stats: &Stats, attackers: &[AttackerRecord]) {
        let _ = (stats, attackers);
    }

    fn on_feed_entry(&mut self, entry: &FeedEntry, attacker: Option<&AttackerRecord>) {
        let _ = (entry, attacker);
    }

    fn on_stats(&mut self, stats: &Stats) {
        let _ = stats;
    }

    fn on_chart_sample(&mut self, sample: &ChartSample) {
        let _ = sample;
    }

    fn on_map_point(&mut self, point: &GeoPoint) {
        let _ = point;
    }

    fn on_mode_changed(&mut self, enabled: bool) {
        let _ = enabled;
    }
}

/// Dispatches events by type, one at a time, in receipt order.
pub struct EventRouter<S> {
    sink: S,
}

impl<S: DashboardSink> EventRouter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Returns `false` for events no consumer handles.
    pub fn route(&mut self, event: &ServerEvent) -> bool {
        match event {
            ServerEvent::ConnectionEstablished { message, .. } => self.sink.on_welcome(message),
            ServerEvent::InitialData { stats, attacks } => self.sink.on_snapshot(stats, attacks),
            ServerEvent::AttackModeChanged { enabled } => self.sink.on_mode_changed(*enabled),
            ServerEvent::AttackEvent { event, attacker } => {
                self.sink.on_feed_entry(event, attacker.as_ref())
            }
            ServerEvent::StatsUpdate { stats } => self.sink.on_stats(stats),
            ServerEvent::ChartData { data } => self.sink.on_chart_sample(data),
            ServerEvent::MapUpdate { location } => self.sink.on_map_point(location),
            ServerEvent::Ping { .. } | ServerEvent::Pong { .. } | ServerEvent::Unknown => {
                debug!(kind = event.kind(), "Event not routed");
                return false;
            }
        }
        true
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
