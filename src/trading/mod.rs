use serde::{Deserialize, Serialize};
use log::debug;

use crate::error::Result;
use crate::validation::{validate_coin_id, validate_pair};

pub mod portfolio;
pub mod rate;

pub use portfolio::{ActiveFilterSet, AssetLedger, AssetSorter, DeltaOutcome, SortKey};
pub use rate::RateCalculator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinPair {
    pub from: String,
    pub to: String,
}

impl CoinPair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Result<Self> {
        let pair = Self {
            from: from.into(),
            to: to.into(),
        };
        validate_coin_id(&pair.from)?;
        validate_coin_id(&pair.to)?;
        validate_pair(&pair.from, &pair.to)?;
        Ok(pair)
    }

    pub fn ids(&self) -> [&str; 2] {
        [self.from.as_str(), self.to.as_str()]
    }
}

/// Identifies the pair a background fetch was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    pub pair: CoinPair,
    epoch: u64,
}

/// The coins currently chosen in the exchange widget.
///
/// Every change bumps an epoch so results of fetches started for an earlier
/// selection can be recognised and dropped.
#[derive(Debug, Clone, Default)]
pub struct PairSelection {
    current: Option<CoinPair>,
    epoch: u64,
}

impl PairSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&CoinPair> {
        self.current.as_ref()
    }

    pub fn select(&mut self, pair: CoinPair) {
        self.epoch += 1;
        debug!("Selected pair {} -> {} (epoch {})", pair.from, pair.to, self.epoch);
        self.current = Some(pair);
    }

    pub fn clear(&mut self) {
        self.epoch += 1;
        self.current = None;
    }

    pub fn ticket(&self) -> Option<RefreshTicket> {
        self.current.clone().map(|pair| RefreshTicket {
            pair,
            epoch: self.epoch,
        })
    }

    pub fn is_current(&self, ticket: &RefreshTicket) -> bool {
        ticket.epoch == self.epoch && self.current.as_ref() == Some(&ticket.pair)
    }
}
