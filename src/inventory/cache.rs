//! TTL cache for inventory snapshots.
//!
//! Inventories change on human timescales, so fetches are cached per key
//! (team or scope) and reused inside the TTL. Expired entries are kept as a
//! last-good fallback for when the upstream is down.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Condition of the inventory data behind one analysis input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum InventoryFreshness {
    /// Fetched inside the TTL window.
    Fresh,
    /// Upstream unreachable; serving the last good fetch.
    Stale { fetched_at: DateTime<Utc> },
    /// Upstream unreachable with nothing cached; excluded from the run.
    Unavailable,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    items: Vec<T>,
    fetched_at: DateTime<Utc>,
}

/// Keyed snapshot cache shared across analysis runs.
#[derive(Debug, Clone)]
pub struct InventoryCache<T> {
    entries: Arc<DashMap<String, Entry<T>>>,
    ttl: Duration,
}

impl<T: Clone> InventoryCache<T> {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl: Duration::seconds(ttl_secs.min(i64::MAX as u64) as i64),
        }
    }

    /// The cached items for `key` if fetched within the TTL.
    pub fn fresh(&self, key: &str, now: DateTime<Utc>) -> Option<Vec<T>> {
        self.entries.get(key).and_then(|entry| {
            if now - entry.fetched_at <= self.ttl {
                Some(entry.items.clone())
            } else {
                None
            }
        })
    }

    /// The newest cached items regardless of age, with their fetch time.
    pub fn last_good(&self, key: &str) -> Option<(Vec<T>, DateTime<Utc>)> {
        self.entries
            .get(key)
            .map(|entry| (entry.items.clone(), entry.fetched_at))
    }

    pub fn store(&self, key: &str, items: Vec<T>, fetched_at: DateTime<Utc>) {
        self.entries
            .insert(key.to_string(), Entry { items, fetched_at });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_within_ttl() {
        let cache: InventoryCache<String> = InventoryCache::new(3600);
        let now = Utc::now();
        cache.store("payments", vec!["a".to_string()], now - Duration::minutes(10));

        assert_eq!(cache.fresh("payments", now), Some(vec!["a".to_string()]));
        assert_eq!(cache.fresh("orders", now), None);
    }

    #[test]
    fn test_expired_entry_not_fresh_but_last_good() {
        let cache: InventoryCache<String> = InventoryCache::new(3600);
        let now = Utc::now();
        let fetched_at = now - Duration::hours(2);
        cache.store("payments", vec!["a".to_string()], fetched_at);

        assert_eq!(cache.fresh("payments", now), None);
        let (items, at) = cache.last_good("payments").unwrap();
        assert_eq!(items, vec!["a".to_string()]);
        assert_eq!(at, fetched_at);
    }

    #[test]
    fn test_store_replaces() {
        let cache: InventoryCache<u32> = InventoryCache::new(3600);
        let now = Utc::now();
        cache.store("k", vec![1], now - Duration::hours(5));
        cache.store("k", vec![2], now);

        assert_eq!(cache.fresh("k", now), Some(vec![2]));
        assert_eq!(cache.len(), 1);
    }
}
