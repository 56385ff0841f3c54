use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{AssetMetadata, AssetRecord, CoinPrice, SwapResult};
use crate::trading::rate::RateCalculator;
use crate::utils::PriceCache;
use crate::validation::{validate_amount, validate_pair};

pub mod sorter;

pub use sorter::{ActiveFilterSet, AssetSorter, SortKey};

/// What a single volume change did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaOutcome {
    Created,
    Updated,
    Removed,
}

/// Snapshot of one record taken before a two-sided mutation.
#[derive(Debug)]
struct Checkpoint {
    index: usize,
    record: AssetRecord,
}

/// Held assets keyed by coin id, kept in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetLedger {
    records: Vec<AssetRecord>,
}

impl AssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from seed records. Duplicate coin ids are merged and
    /// non-positive volumes are dropped, so the ledger invariants hold.
    pub fn from_records(records: impl IntoIterator<Item = AssetRecord>) -> Self {
        let mut ledger = Self::new();
        for record in records {
            let metadata = AssetMetadata {
                name: record.name.clone(),
                symbol: record.symbol.clone(),
                last_price: record.last_price,
                trend_pct: record.trend_pct,
            };
            if let Err(e) = ledger.apply_delta(&record.coin_id, record.volume, Some(metadata)) {
                warn!("Skipping seed holding {}: {}", record.coin_id, e);
            }
        }
        ledger
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, coin_id: &str) -> bool {
        self.position(coin_id).is_some()
    }

    pub fn get(&self, coin_id: &str) -> Option<&AssetRecord> {
        self.records.iter().find(|r| r.coin_id == coin_id)
    }

    pub fn volume_of(&self, coin_id: &str) -> f64 {
        self.get(coin_id).map(|r| r.volume).unwrap_or_default()
    }

    /// Current rows in insertion order.
    pub fn list_visible(&self) -> &[AssetRecord] {
        &self.records
    }

    pub fn total_value_usd(&self) -> f64 {
        self.records.iter().map(AssetRecord::value_usd).sum()
    }

    fn position(&self, coin_id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.coin_id == coin_id)
    }

    pub fn apply_delta(
        &mut self,
        coin_id: &str,
        volume_delta: f64,
        metadata_if_new: Option<AssetMetadata>,
    ) -> Result<DeltaOutcome> {
        if !volume_delta.is_finite() {
            return Err(Error::InvalidAmount(format!(
                "Volume change for {} is not a number: {}",
                coin_id, volume_delta
            )));
        }

        match self.position(coin_id) {
            Some(index) => {
                let new_volume = self.records[index].volume + volume_delta;
                if new_volume <= 0.0 {
                    self.records.remove(index);
                    debug!("Removed {} from ledger", coin_id);
                    Ok(DeltaOutcome::Removed)
                } else {
                    self.records[index].volume = new_volume;
                    debug!("Updated {} volume to {}", coin_id, new_volume);
                    Ok(DeltaOutcome::Updated)
                }
            }
            None if volume_delta > 0.0 => {
                let metadata = metadata_if_new.unwrap_or_else(|| AssetMetadata::placeholder(coin_id));
                self.records
                    .push(AssetRecord::from_metadata(coin_id, volume_delta, metadata));
                debug!("Added {} to ledger with volume {}", coin_id, volume_delta);
                Ok(DeltaOutcome::Created)
            }
            None => Err(Error::RecordNotFound(coin_id.to_string())),
        }
    }

    /// Moves `from_amount` of `from_coin` into `to_coin` at the cached rate.
    /// Either both sides are applied or the ledger is left as it was.
    pub fn execute_swap(
        &mut self,
        cache: &PriceCache,
        from_coin: &str,
        to_coin: &str,
        from_amount: f64,
        to_metadata: Option<AssetMetadata>,
    ) -> Result<SwapResult> {
        validate_pair(from_coin, to_coin)?;
        validate_amount(from_amount)?;

        let index = self
            .position(from_coin)
            .ok_or_else(|| Error::RecordNotFound(from_coin.to_string()))?;
        let held = self.records[index].volume;
        if held < from_amount {
            return Err(Error::InsufficientBalance {
                coin_id: from_coin.to_string(),
                held,
                requested: from_amount,
            });
        }

        let swap = RateCalculator::calculate_swap(cache, from_coin, to_coin, from_amount)?;

        let checkpoint = Checkpoint {
            index,
            record: self.records[index].clone(),
        };
        self.apply_delta(from_coin, -swap.from_amount, None)?;
        if let Err(e) = self.apply_delta(to_coin, swap.to_amount, to_metadata) {
            warn!("Rolling back swap {} -> {}: {}", from_coin, to_coin, e);
            self.restore(checkpoint);
            return Err(e);
        }

        info!(
            "Swapped {} {} for {} {} (rate {})",
            swap.from_amount, from_coin, swap.to_amount, to_coin, swap.rate
        );
        Ok(swap)
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        match self.position(&checkpoint.record.coin_id) {
            Some(index) => self.records[index] = checkpoint.record,
            None => {
                let index = checkpoint.index.min(self.records.len());
                self.records.insert(index, checkpoint.record);
            }
        }
    }

    /// Drops a row regardless of its volume.
    pub fn remove(&mut self, coin_id: &str) -> Result<AssetRecord> {
        let index = self
            .position(coin_id)
            .ok_or_else(|| Error::RecordNotFound(coin_id.to_string()))?;
        Ok(self.records.remove(index))
    }

    /// Refreshes the price and trend columns of a held coin. Returns false
    /// when the coin is not held or the quote has no USD price.
    pub fn update_market(&mut self, price: &CoinPrice) -> bool {
        let Some(index) = self.position(&price.coin_id) else {
            return false;
        };
        let Some(usd) = price.usd_price() else {
            return false;
        };
        let record = &mut self.records[index];
        record.last_price = usd;
        if let Some(change) = price.change_24h {
            record.trend_pct = change;
        }
        true
    }
}
