use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::evaluation::FlagName;

#[derive(Debug, Clone, Copy)]
pub struct CacheEntry {
    pub enabled: bool,
    pub fetched_at: Instant,
    pub observed_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() <= ttl
    }
}

/// Last known result per flag. Entries are only written on success and live
/// as long as the owning client.
#[derive(Debug, Default)]
pub struct FlagCache {
    entries: DashMap<FlagName, CacheEntry>,
}

impl FlagCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&self, flag: &FlagName, ttl: Duration) -> Option<bool> {
        self.entries
            .get(flag)
            .filter(|entry| entry.is_fresh(ttl))
            .map(|entry| entry.enabled)
    }

    /// Last known value regardless of age.
    pub fn last_known(&self, flag: &FlagName) -> Option<bool> {
        self.entries.get(flag).map(|entry| entry.enabled)
    }

    pub fn get(&self, flag: &FlagName) -> Option<CacheEntry> {
        self.entries.get(flag).map(|entry| *entry)
    }

    /// Record a result stamped with the instant its request was sent. A
    /// result from an older request never replaces one from a newer request.
    pub fn store(&self, flag: &FlagName, enabled: bool, sent_at: Instant) {
        let arrived = CacheEntry {
            enabled,
            fetched_at: sent_at,
            observed_at: Utc::now(),
        };
        self.entries
            .entry(flag.clone())
            .and_modify(|entry| {
                if arrived.fetched_at >= entry.fetched_at {
                    *entry = arrived;
                }
            })
            .or_insert(arrived);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
