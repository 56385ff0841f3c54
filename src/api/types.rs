use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use log::debug;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{CoinPrice, CoinSearchHit, PriceHistory, PricePoint};

const CHANGE_SUFFIX: &str = "_24h_change";

/// `/simple/price` body: `{ "bitcoin": { "usd": 50000.0, "usd_24h_change": 1.2 } }`.
type SimplePriceResponse = HashMap<String, HashMap<String, Option<f64>>>;

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<(f64, f64)>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Deserialize)]
struct SearchCoin {
    id: String,
    name: String,
    symbol: String,
    #[serde(default)]
    thumb: Option<String>,
}

/// Parses a `/simple/price` body. Every requested coin must be present with
/// every requested currency; the 24h change is taken for the first currency.
pub fn parse_simple_price(
    body: &str,
    coin_ids: &[String],
    currencies: &[String],
) -> Result<HashMap<String, CoinPrice>> {
    let parsed: SimplePriceResponse = serde_json::from_str(body)?;
    let change_key = currencies
        .first()
        .map(|c| format!("{}{}", c.to_lowercase(), CHANGE_SUFFIX));

    let mut out = HashMap::with_capacity(coin_ids.len());
    for coin_id in coin_ids {
        let entry = parsed.get(coin_id).ok_or_else(|| {
            Error::InvalidResponseShape(format!("Coin {} missing in price response", coin_id))
        })?;

        let mut prices = HashMap::new();
        for (key, value) in entry {
            if key.ends_with(CHANGE_SUFFIX) {
                continue;
            }
            if let Some(price) = value {
                prices.insert(key.to_lowercase(), *price);
            }
        }

        for currency in currencies {
            let currency = currency.to_lowercase();
            match prices.get(&currency) {
                Some(price) if price.is_finite() && *price >= 0.0 => {}
                Some(price) => {
                    return Err(Error::InvalidResponseShape(format!(
                        "Invalid {} price for {}: {}",
                        currency, coin_id, price
                    )))
                }
                None => {
                    return Err(Error::InvalidResponseShape(format!(
                        "Currency {} missing for {}",
                        currency, coin_id
                    )))
                }
            }
        }

        let change_24h = change_key
            .as_ref()
            .and_then(|key| entry.get(key).copied().flatten())
            .filter(|change| change.is_finite());

        out.insert(coin_id.clone(), CoinPrice::new(coin_id.clone(), prices, change_24h));
    }

    debug!("Parsed spot prices for {} coins", out.len());
    Ok(out)
}

/// Parses a `/coins/{id}/market_chart` body; timestamps are epoch milliseconds.
pub fn parse_market_chart(coin_id: &str, body: &str) -> Result<PriceHistory> {
    let parsed: MarketChartResponse = serde_json::from_str(body)?;
    if parsed.prices.is_empty() {
        return Err(Error::InvalidResponseShape(format!(
            "Empty price series for {}",
            coin_id
        )));
    }

    let mut points = Vec::with_capacity(parsed.prices.len());
    for (i, (millis, price)) in parsed.prices.into_iter().enumerate() {
        if !price.is_finite() || price < 0.0 {
            return Err(Error::InvalidResponseShape(format!(
                "Invalid price at index {}: {}",
                i, price
            )));
        }
        let timestamp = Utc
            .timestamp_millis_opt(millis as i64)
            .single()
            .ok_or_else(|| {
                Error::InvalidResponseShape(format!("Invalid timestamp at index {}: {}", i, millis))
            })?;
        if let Some(prev) = points.last().map(|p: &PricePoint| p.timestamp) {
            if timestamp < prev {
                return Err(Error::InvalidResponseShape(
                    "Timestamps not in ascending order".into(),
                ));
            }
        }
        points.push(PricePoint { timestamp, price });
    }

    Ok(PriceHistory {
        coin_id: coin_id.to_string(),
        points,
    })
}

/// Parses a `/search` body into coin hits, best match first.
pub fn parse_search(body: &str) -> Result<Vec<CoinSearchHit>> {
    let parsed: SearchResponse = serde_json::from_str(body)?;
    parsed
        .coins
        .into_iter()
        .map(|coin| {
            if coin.id.trim().is_empty() {
                return Err(Error::InvalidResponseShape("Empty coin id in search result".into()));
            }
            Ok(CoinSearchHit {
                id: coin.id,
                name: coin.name,
                symbol: coin.symbol.to_uppercase(),
                icon_ref: coin.thumb,
            })
        })
        .collect()
}
