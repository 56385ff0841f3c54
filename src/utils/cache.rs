use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::{CoinPrice, PriceHistory};

/// Five minutes, the staleness horizon for fetched price data.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Keyed store whose entries expire logically after a fixed TTL.
///
/// Stale entries are never removed, `get` simply stops returning them until
/// the next `set` for the same key refreshes the timestamp.
#[derive(Debug, Clone)]
pub struct Cache<T> {
    data: HashMap<String, (T, Instant)>,
    ttl: Duration,
}

pub type PriceCache = Cache<CoinPrice>;
pub type HistoryCache = Cache<PriceHistory>;

impl<T: Clone> Default for Cache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<T: Clone> Cache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: HashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<T> {
        if let Some((value, timestamp)) = self.data.get(key) {
            if now.saturating_duration_since(*timestamp) < self.ttl {
                return Some(value.clone());
            }
        }
        None
    }

    pub fn set(&mut self, key: impl Into<String>, value: T) {
        self.set_at(key, value, Instant::now());
    }

    pub fn set_at(&mut self, key: impl Into<String>, value: T, at: Instant) {
        self.data.insert(key.into(), (value, at));
    }

    pub fn needs_update(&self, key: &str) -> bool {
        self.needs_update_at(key, Instant::now())
    }

    pub fn needs_update_at(&self, key: &str, now: Instant) -> bool {
        self.get_at(key, now).is_none()
    }

    /// Keys among `keys` that are missing or stale.
    pub fn stale_keys<'a>(&self, keys: &[&'a str]) -> Vec<&'a str> {
        let now = Instant::now();
        keys.iter()
            .copied()
            .filter(|key| self.needs_update_at(key, now))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_respects_ttl_boundary() {
        let mut cache: Cache<u32> = Cache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        cache.set_at("bitcoin", 1, t0);

        assert_eq!(cache.get_at("bitcoin", t0), Some(1));
        assert_eq!(cache.get_at("bitcoin", t0 + Duration::from_millis(299_999)), Some(1));
        assert_eq!(cache.get_at("bitcoin", t0 + Duration::from_secs(300)), None);
        assert_eq!(cache.get_at("bitcoin", t0 + Duration::from_secs(301)), None);
    }

    #[test]
    fn test_set_overwrites_and_refreshes() {
        let mut cache: Cache<u32> = Cache::new(Duration::from_secs(10));
        let t0 = Instant::now();
        cache.set_at("ethereum", 1, t0);
        cache.set_at("ethereum", 2, t0 + Duration::from_secs(20));

        assert_eq!(cache.get_at("ethereum", t0 + Duration::from_secs(25)), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stale_entry_is_kept_but_hidden() {
        let mut cache: Cache<u32> = Cache::new(Duration::from_secs(10));
        let t0 = Instant::now();
        cache.set_at("cardano", 7, t0);

        let later = t0 + Duration::from_secs(11);
        assert!(cache.needs_update_at("cardano", later));
        assert_eq!(cache.len(), 1);
        assert!(cache.needs_update_at("tether", t0));
    }

    #[test]
    fn test_stale_keys() {
        let mut cache: Cache<u32> = Cache::default();
        cache.set("bitcoin", 1);
        assert_eq!(cache.stale_keys(&["bitcoin", "ethereum"]), vec!["ethereum"]);
    }
}
