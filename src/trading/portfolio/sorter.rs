use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::AssetRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Price,
    Trend,
    Volume,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Name, SortKey::Price, SortKey::Trend, SortKey::Volume];

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Name => "Sort by Coin Name",
            SortKey::Price => "Sort by Last Price",
            SortKey::Trend => "Sort by Trend",
            SortKey::Volume => "Sort by Volume",
        }
    }

    /// Name sorts A to Z; the numeric columns sort highest first.
    pub fn compare(&self, a: &AssetRecord, b: &AssetRecord) -> Ordering {
        match self {
            SortKey::Name => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
            SortKey::Price => b.last_price.total_cmp(&a.last_price),
            SortKey::Trend => b.trend_pct.total_cmp(&a.trend_pct),
            SortKey::Volume => b.volume.total_cmp(&a.volume),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortKey::Name => "name",
            SortKey::Price => "price",
            SortKey::Trend => "trend",
            SortKey::Volume => "volume",
        };
        f.write_str(s)
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "price" => Ok(SortKey::Price),
            "trend" => Ok(SortKey::Trend),
            "volume" => Ok(SortKey::Volume),
            other => Err(Error::ConfigError(format!("Unknown sort key: {}", other))),
        }
    }
}

/// Sort keys in activation order; the first one is the primary comparator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFilterSet {
    keys: Vec<SortKey>,
}

impl ActiveFilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_active(&self, key: SortKey) -> bool {
        self.keys.contains(&key)
    }

    /// Appends `key` unless it is already active. Returns true if it was added.
    pub fn activate(&mut self, key: SortKey) -> bool {
        if self.is_active(key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    pub fn deactivate(&mut self, key: SortKey) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| *k != key);
        self.keys.len() != before
    }

    /// Flips `key`; a re-enabled key goes to the end of the precedence order.
    /// Returns whether the key is active afterwards.
    pub fn toggle(&mut self, key: SortKey) -> bool {
        if self.deactivate(key) {
            false
        } else {
            self.keys.push(key);
            true
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

impl FromIterator<SortKey> for ActiveFilterSet {
    fn from_iter<I: IntoIterator<Item = SortKey>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.activate(key);
        }
        set
    }
}

pub struct AssetSorter;

impl AssetSorter {
    /// Stable multi-key sort. With no active keys the input order is kept.
    pub fn sort(records: &[AssetRecord], active: &ActiveFilterSet) -> Vec<AssetRecord> {
        let mut rows = records.to_vec();
        if active.is_empty() {
            return rows;
        }
        rows.sort_by(|a, b| {
            active
                .keys()
                .iter()
                .map(|key| key.compare(a, b))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetMetadata;

    fn record(id: &str, name: &str, volume: f64, price: f64, trend: f64) -> AssetRecord {
        AssetRecord::from_metadata(
            id,
            volume,
            AssetMetadata {
                name: name.to_string(),
                symbol: id.to_uppercase(),
                last_price: price,
                trend_pct: trend,
            },
        )
    }

    fn ids(rows: &[AssetRecord]) -> Vec<&str> {
        rows.iter().map(|r| r.coin_id.as_str()).collect()
    }

    fn sample() -> Vec<AssetRecord> {
        vec![
            record("c", "Cardano", 5.0, 0.4, 2.0),
            record("b", "bitcoin", 20.0, 50000.0, -1.0),
            record("t", "Tether", 1.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_empty_filters_is_identity() {
        let rows = sample();
        let sorted = AssetSorter::sort(&rows, &ActiveFilterSet::new());
        assert_eq!(sorted, rows);
    }

    #[test]
    fn test_volume_descending() {
        let active: ActiveFilterSet = [SortKey::Volume].into_iter().collect();
        let sorted = AssetSorter::sort(&sample(), &active);
        let volumes: Vec<f64> = sorted.iter().map(|r| r.volume).collect();
        assert_eq!(volumes, vec![20.0, 5.0, 1.0]);
    }

    #[test]
    fn test_name_is_case_insensitive() {
        let active: ActiveFilterSet = [SortKey::Name].into_iter().collect();
        let sorted = AssetSorter::sort(&sample(), &active);
        assert_eq!(ids(&sorted), vec!["b", "c", "t"]);
    }

    #[test]
    fn test_price_and_trend_descending() {
        let by_price: ActiveFilterSet = [SortKey::Price].into_iter().collect();
        assert_eq!(ids(&AssetSorter::sort(&sample(), &by_price)), vec!["b", "t", "c"]);

        let by_trend: ActiveFilterSet = [SortKey::Trend].into_iter().collect();
        assert_eq!(ids(&AssetSorter::sort(&sample(), &by_trend)), vec!["c", "t", "b"]);
    }

    #[test]
    fn test_tie_breaker_only_affects_equal_primary() {
        let rows = vec![
            record("z", "Zcash", 5.0, 1.0, 0.0),
            record("s", "Solana", 20.0, 1.0, 0.0),
            record("a", "Aave", 5.0, 1.0, 0.0),
            record("d", "Dai", 1.0, 1.0, 0.0),
        ];
        let volume_only: ActiveFilterSet = [SortKey::Volume].into_iter().collect();
        assert_eq!(ids(&AssetSorter::sort(&rows, &volume_only)), vec!["s", "z", "a", "d"]);

        let with_name: ActiveFilterSet = [SortKey::Volume, SortKey::Name].into_iter().collect();
        assert_eq!(ids(&AssetSorter::sort(&rows, &with_name)), vec!["s", "a", "z", "d"]);
    }

    #[test]
    fn test_full_ties_keep_original_order() {
        let rows = vec![
            record("x", "Same", 1.0, 1.0, 0.0),
            record("y", "Same", 1.0, 1.0, 0.0),
            record("w", "Same", 1.0, 1.0, 0.0),
        ];
        let active: ActiveFilterSet = SortKey::ALL.into_iter().collect();
        assert_eq!(ids(&AssetSorter::sort(&rows, &active)), vec!["x", "y", "w"]);
    }

    #[test]
    fn test_toggle_precedence() {
        let mut active = ActiveFilterSet::new();
        assert!(active.toggle(SortKey::Price));
        assert!(active.toggle(SortKey::Name));
        assert!(active.toggle(SortKey::Volume));
        assert_eq!(active.keys(), &[SortKey::Price, SortKey::Name, SortKey::Volume]);

        assert!(!active.toggle(SortKey::Price));
        assert_eq!(active.keys(), &[SortKey::Name, SortKey::Volume]);

        assert!(active.toggle(SortKey::Price));
        assert_eq!(active.keys(), &[SortKey::Name, SortKey::Volume, SortKey::Price]);
    }

    #[test]
    fn test_activate_is_idempotent() {
        let mut active = ActiveFilterSet::new();
        assert!(active.activate(SortKey::Trend));
        assert!(!active.activate(SortKey::Trend));
        assert_eq!(active.keys(), &[SortKey::Trend]);
        assert!(active.deactivate(SortKey::Trend));
        assert!(!active.deactivate(SortKey::Trend));
    }

    #[test]
    fn test_parse_sort_key() {
        assert_eq!("Volume".parse::<SortKey>().unwrap(), SortKey::Volume);
        assert_eq!(" name ".parse::<SortKey>().unwrap(), SortKey::Name);
        assert!("market_cap".parse::<SortKey>().is_err());
        assert_eq!(SortKey::Trend.to_string(), "trend");
    }
}
