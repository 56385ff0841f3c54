#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use coin_dashboard::api::PriceSource;
use coin_dashboard::config::{Config, HoldingConfig};
use coin_dashboard::dashboard::Dashboard;
use coin_dashboard::error::{Error, Result};
use coin_dashboard::models::{CoinPrice, CoinSearchHit, PriceHistory, PricePoint};

pub const TTL: Duration = Duration::from_secs(300);

/// In-memory price source with a fixed USD price table.
pub struct FakePriceSource {
    prices: Mutex<HashMap<String, f64>>,
    directory: Vec<CoinSearchHit>,
    spot_calls: AtomicUsize,
    failing: AtomicBool,
}

impl FakePriceSource {
    pub fn new() -> Self {
        let prices = [
            ("bitcoin", 50000.0),
            ("ethereum", 2500.0),
            ("tether", 1.0),
            ("cardano", 0.5),
        ]
        .into_iter()
        .map(|(id, price)| (id.to_string(), price))
        .collect();
        Self {
            prices: Mutex::new(prices),
            directory: vec![
                hit("cardano", "Cardano", "ADA"),
                hit("bitcoin", "Bitcoin", "BTC"),
                hit("bitcoin-cash", "Bitcoin Cash", "BCH"),
            ],
            spot_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn spot_calls(&self) -> usize {
        self.spot_calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_price(&self, coin_id: &str, price: f64) {
        self.prices
            .lock()
            .unwrap()
            .insert(coin_id.to_string(), price);
    }
}

fn hit(id: &str, name: &str, symbol: &str) -> CoinSearchHit {
    CoinSearchHit {
        id: id.to_string(),
        name: name.to_string(),
        symbol: symbol.to_string(),
        icon_ref: None,
    }
}

#[async_trait]
impl PriceSource for FakePriceSource {
    async fn get_spot_prices(
        &self,
        coin_ids: &[String],
        currencies: &[String],
    ) -> Result<HashMap<String, CoinPrice>> {
        self.spot_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::SourceUnavailable("fake source offline".to_string()));
        }
        let table = self.prices.lock().unwrap();
        coin_ids
            .iter()
            .map(|id| -> Result<(String, CoinPrice)> {
                let usd = *table
                    .get(id)
                    .ok_or_else(|| Error::InvalidResponseShape(format!("unknown coin {}", id)))?;
                let prices = currencies
                    .iter()
                    .filter(|c| c.as_str() == "usd")
                    .map(|c| (c.clone(), usd))
                    .collect();
                Ok((id.clone(), CoinPrice::new(id.clone(), prices, Some(1.5))))
            })
            .collect()
    }

    async fn get_historical_series(&self, coin_id: &str, days: u32) -> Result<PriceHistory> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::SourceUnavailable("fake source offline".to_string()));
        }
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = (0..=days)
            .map(|day| PricePoint {
                timestamp: start + ChronoDuration::days(day as i64),
                price: 100.0 + day as f64,
            })
            .collect();
        Ok(PriceHistory {
            coin_id: coin_id.to_string(),
            points,
        })
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<CoinSearchHit>> {
        let query = query.to_lowercase();
        Ok(self
            .directory
            .iter()
            .filter(|h| h.name.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.portfolio.holdings = vec![
        HoldingConfig::new("bitcoin", "Bitcoin", "BTC", 1.0),
        HoldingConfig::new("ethereum", "Ethereum", "ETH", 5.0),
        HoldingConfig::new("tether", "Tether", "USDT", 1000.0),
    ];
    config
}

pub fn seeded_dashboard() -> (Arc<FakePriceSource>, Dashboard) {
    let source = Arc::new(FakePriceSource::new());
    let dashboard = Dashboard::from_config(source.clone(), &test_config());
    (source, dashboard)
}
