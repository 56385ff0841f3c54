use std::collections::HashMap;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::Result;
use crate::models::{CoinPrice, CoinSearchHit, PriceHistory};

pub mod coingecko;
pub mod rate_limit;
pub mod types;

pub use coingecko::CoinGeckoClient;
pub use rate_limit::RateLimiter;

/// Market data backend the dashboard pulls prices from.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Spot prices keyed by coin id. Each quote carries one price per
    /// requested currency and, when available, the 24h change.
    async fn get_spot_prices(
        &self,
        coin_ids: &[String],
        currencies: &[String],
    ) -> Result<HashMap<String, CoinPrice>>;

    /// USD price series over the last `days` days, oldest first.
    async fn get_historical_series(&self, coin_id: &str, days: u32) -> Result<PriceHistory>;

    /// Coins matching `query`, best match first. No match is an empty list.
    async fn search_by_name(&self, query: &str) -> Result<Vec<CoinSearchHit>>;
}
