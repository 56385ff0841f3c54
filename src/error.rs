use std::result::Result as StdResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid swap: {0}")]
    InvalidSwap(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient balance for {coin_id}: held {held}, requested {requested}")]
    InsufficientBalance {
        coin_id: String,
        held: f64,
        requested: f64,
    },
    #[error("Record not found: {0}")]
    RecordNotFound(String),
    #[error("Price unavailable: {0}")]
    PriceUnavailable(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("Price source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Invalid response shape: {0}")]
    InvalidResponseShape(String),
    #[error("Coin not found: {0}")]
    CoinNotFound(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Errors raised by input checks before any mutation or network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidSwap(_)
                | Error::InvalidAmount(_)
                | Error::InsufficientBalance { .. }
                | Error::RecordNotFound(_)
        )
    }

    /// Errors that originate from the price source.
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            Error::RateLimited(_) | Error::SourceUnavailable(_) | Error::InvalidResponseShape(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidResponseShape(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            return Error::RateLimited(err.to_string());
        }
        if err.is_decode() {
            return Error::InvalidResponseShape(err.to_string());
        }
        Error::SourceUnavailable(err.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

pub type Result<T> = StdResult<T, Error>;
