use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Quote currency every swap is priced through.
pub const USD: &str = "usd";

/// Spot price snapshot for one coin, as returned by a price source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinPrice {
    pub coin_id: String,
    pub prices: HashMap<String, f64>,
    pub change_24h: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

impl CoinPrice {
    pub fn new(coin_id: impl Into<String>, prices: HashMap<String, f64>, change_24h: Option<f64>) -> Self {
        Self {
            coin_id: coin_id.into(),
            prices,
            change_24h,
            fetched_at: Utc::now(),
        }
    }

    /// Convenience constructor for a USD-only quote.
    pub fn usd(coin_id: impl Into<String>, price: f64, change_24h: Option<f64>) -> Self {
        let mut prices = HashMap::new();
        prices.insert(USD.to_string(), price);
        Self::new(coin_id, prices, change_24h)
    }

    pub fn price_in(&self, currency: &str) -> Option<f64> {
        self.prices.get(&currency.to_lowercase()).copied()
    }

    pub fn usd_price(&self) -> Option<f64> {
        self.price_in(USD)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Ordered historical series for one coin, oldest point first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub coin_id: String,
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    pub fn first_price(&self) -> Option<f64> {
        self.points.first().map(|p| p.price)
    }

    pub fn last_price(&self) -> Option<f64> {
        self.points.last().map(|p| p.price)
    }

    /// Percentage move from the first to the last point of the series.
    pub fn trend_pct(&self) -> Option<f64> {
        let first = self.first_price()?;
        let last = self.last_price()?;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }

    pub fn min_price(&self) -> Option<f64> {
        self.points.iter().map(|p| p.price).reduce(f64::min)
    }

    pub fn max_price(&self) -> Option<f64> {
        self.points.iter().map(|p| p.price).reduce(f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSearchHit {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub icon_ref: Option<String>,
}
