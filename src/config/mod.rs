use serde::{Deserialize, Serialize};
use std::path::Path;
use std::fs;
use std::time::Duration;
use anyhow::Result;

use crate::error::Error;
use crate::models::AssetMetadata;
use crate::validation::{validate_amount, validate_api_key, validate_coin_id};

pub const API_KEY_ENV: &str = "COINGECKO_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub refresh: RefreshConfig,
    pub portfolio: PortfolioConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub min_request_interval_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            api_key: None,
            timeout_secs: 10,
            max_retries: 3,
            min_request_interval_ms: 1200,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    pub from_coin: String,
    pub to_coin: String,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            from_coin: "bitcoin".to_string(),
            to_coin: "ethereum".to_string(),
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PortfolioConfig {
    pub holdings: Vec<HoldingConfig>,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            holdings: vec![
                HoldingConfig::new("bitcoin", "Bitcoin", "BTC", 1.0),
                HoldingConfig::new("ethereum", "Ethereum", "ETH", 5.0),
                HoldingConfig::new("tether", "Tether", "USDT", 1000.0),
            ],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HoldingConfig {
    pub coin_id: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub volume: f64,
}

impl HoldingConfig {
    pub fn new(coin_id: &str, name: &str, symbol: &str, volume: f64) -> Self {
        Self {
            coin_id: coin_id.to_string(),
            name: Some(name.to_string()),
            symbol: Some(symbol.to_string()),
            volume,
        }
    }

    pub fn metadata(&self) -> AssetMetadata {
        let fallback = AssetMetadata::placeholder(&self.coin_id);
        AssetMetadata::new(
            self.name.clone().unwrap_or(fallback.name),
            self.symbol.clone().unwrap_or(fallback.symbol),
        )
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        fs::write(path, config_str)?;
        Ok(())
    }

    /// Lets `COINGECKO_API_KEY` override the key from the file.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api.api_key = Some(key);
            }
        }
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if let Some(key) = &self.api.api_key {
            validate_api_key(key)?;
        }
        if self.cache.ttl_secs == 0 {
            return Err(Error::ConfigError("cache.ttl_secs must be positive".to_string()));
        }
        if self.refresh.interval_secs == 0 {
            return Err(Error::ConfigError("refresh.interval_secs must be positive".to_string()));
        }
        for holding in &self.portfolio.holdings {
            validate_coin_id(&holding.coin_id)
                .and_then(|_| validate_amount(holding.volume))
                .map_err(|e| Error::ConfigError(format!("holding {}: {}", holding.coin_id, e)))?;
        }
        Ok(())
    }
}
