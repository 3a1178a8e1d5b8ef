use chrono::{DateTime, TimeDelta, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use crate::models::AttackerRecord;

/// Attacker records keyed by source address.
///
/// Records older than the retention window are dropped by
/// [`AttackerBook::evict_expired`]; once `capacity` is reached, inserting a new
/// address evicts the least recently seen one.
#[derive(Clone, Debug)]
pub struct AttackerBook {
    records: Arc<RwLock<HashMap<String, AttackerRecord>>>,
    retention: TimeDelta,
    capacity: usize,
}

impl AttackerBook {
    pub fn new(retention: TimeDelta, capacity: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            retention,
            capacity: capacity.max(1),
        }
    }

    pub async fn upsert(&self, mut record: AttackerRecord, now: DateTime<Utc>) {
        record.last_seen = Some(now);
        let mut records = self.records.write().await;

        if !records.contains_key(&record.ip) && records.len() >= self.capacity {
            let oldest = records
                .values()
                .min_by_key(|r| r.last_seen)
                .map(|r| r.ip.clone());
            if let Some(ip) = oldest {
                records.remove(&ip);
            }
        }

        records.insert(record.ip.clone(), record);
    }

    /// Up to `limit` records, most recently seen first.
    pub async fn recent(&self, limit: usize) -> Vec<AttackerRecord> {
        let records = self.records.read().await;
        let mut recent: Vec<AttackerRecord> = records.values().cloned().collect();
        recent.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        recent.truncate(limit);
        recent
    }

    /// Drops records not seen within the retention window; returns how many went.
    pub async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let Some(cutoff) = now.checked_sub_signed(self.retention) else {
            return 0;
        };
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.last_seen.is_some_and(|seen| seen >= cutoff));
        before - records.len()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}
