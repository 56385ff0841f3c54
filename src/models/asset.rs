use serde::{Deserialize, Serialize};

use super::market::CoinPrice;

/// One row of the portfolio table. `coin_id` is unique within a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub coin_id: String,
    pub name: String,
    pub symbol: String,
    pub volume: f64,
    pub last_price: f64,
    pub trend_pct: f64,
}

impl AssetRecord {
    pub fn from_metadata(coin_id: impl Into<String>, volume: f64, metadata: AssetMetadata) -> Self {
        Self {
            coin_id: coin_id.into(),
            name: metadata.name,
            symbol: metadata.symbol,
            volume,
            last_price: metadata.last_price,
            trend_pct: metadata.trend_pct,
        }
    }

    pub fn value_usd(&self) -> f64 {
        self.volume * self.last_price
    }
}

/// Descriptive fields used when a coin enters the ledger for the first time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub name: String,
    pub symbol: String,
    pub last_price: f64,
    pub trend_pct: f64,
}

impl AssetMetadata {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            last_price: 0.0,
            trend_pct: 0.0,
        }
    }

    /// Used when nothing is known about a coin but its id.
    pub fn placeholder(coin_id: &str) -> Self {
        Self::new(coin_id, coin_id.to_uppercase())
    }

    pub fn with_price(mut self, price: &CoinPrice) -> Self {
        self.last_price = price.usd_price().unwrap_or_default();
        self.trend_pct = price.change_24h.unwrap_or_default();
        self
    }
}

/// Outcome of a conversion between two coins. Full precision; rounding is
/// left to the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwapResult {
    pub from_amount: f64,
    pub to_amount: f64,
    pub rate: f64,
    pub usd_value: f64,
}
