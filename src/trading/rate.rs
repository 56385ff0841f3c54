use log::debug;

use crate::error::{Error, Result};
use crate::models::SwapResult;
use crate::utils::PriceCache;
use crate::validation::{validate_amount, validate_pair};

/// Converts amounts between coins using the USD prices currently cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateCalculator;

impl RateCalculator {
    pub fn calculate_swap(
        cache: &PriceCache,
        from_coin: &str,
        to_coin: &str,
        from_amount: f64,
    ) -> Result<SwapResult> {
        validate_pair(from_coin, to_coin)?;
        validate_amount(from_amount)?;

        let from_price = Self::usd_price(cache, from_coin)?;
        let to_price = Self::usd_price(cache, to_coin)?;

        let rate = from_price / to_price;
        let result = SwapResult {
            from_amount,
            to_amount: from_amount * rate,
            rate,
            usd_value: from_amount * from_price,
        };
        debug!("Swap {} {} -> {}: {:?}", from_amount, from_coin, to_coin, result);
        Ok(result)
    }

    /// Rate for one unit of `from_coin`, as shown in the exchange widget.
    pub fn quote_rate(cache: &PriceCache, from_coin: &str, to_coin: &str) -> Result<SwapResult> {
        Self::calculate_swap(cache, from_coin, to_coin, 1.0)
    }

    fn usd_price(cache: &PriceCache, coin_id: &str) -> Result<f64> {
        let data = cache
            .get(coin_id)
            .ok_or_else(|| Error::PriceUnavailable(format!("No fresh price for {}", coin_id)))?;
        match data.usd_price() {
            Some(price) if price.is_finite() && price > 0.0 => Ok(price),
            Some(price) => Err(Error::PriceUnavailable(format!(
                "Unusable USD price for {}: {}",
                coin_id, price
            ))),
            None => Err(Error::PriceUnavailable(format!("No USD price for {}", coin_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CoinPrice;

    fn cache_with(prices: &[(&str, f64)]) -> PriceCache {
        let mut cache = PriceCache::default();
        for (id, price) in prices {
            cache.set(*id, CoinPrice::usd(*id, *price, None));
        }
        cache
    }

    #[test]
    fn test_rate_is_price_ratio() {
        let cache = cache_with(&[("bitcoin", 50000.0), ("ethereum", 2500.0)]);
        let result = RateCalculator::calculate_swap(&cache, "bitcoin", "ethereum", 0.5).unwrap();

        assert_eq!(result.rate, 20.0);
        assert_eq!(result.to_amount, 10.0);
        assert_eq!(result.from_amount, 0.5);
        assert_eq!(result.usd_value, 25000.0);
    }

    #[test]
    fn test_calculation_is_deterministic() {
        let cache = cache_with(&[("bitcoin", 43210.12), ("cardano", 0.37)]);
        let a = RateCalculator::calculate_swap(&cache, "bitcoin", "cardano", 1.25).unwrap();
        let b = RateCalculator::calculate_swap(&cache, "bitcoin", "cardano", 1.25).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_coin_always_invalid() {
        let cache = cache_with(&[("bitcoin", 50000.0)]);
        for amount in [1.0, 0.0, -3.0, f64::NAN] {
            let err = RateCalculator::calculate_swap(&cache, "bitcoin", "bitcoin", amount).unwrap_err();
            assert!(matches!(err, Error::InvalidSwap(_)));
        }
    }

    #[test]
    fn test_invalid_amount() {
        let cache = cache_with(&[("bitcoin", 50000.0), ("ethereum", 2500.0)]);
        for amount in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = RateCalculator::calculate_swap(&cache, "bitcoin", "ethereum", amount).unwrap_err();
            assert!(matches!(err, Error::InvalidAmount(_)));
        }
    }

    #[test]
    fn test_missing_price_is_unavailable() {
        let cache = cache_with(&[("bitcoin", 50000.0)]);
        let err = RateCalculator::calculate_swap(&cache, "bitcoin", "ethereum", 1.0).unwrap_err();
        assert!(matches!(err, Error::PriceUnavailable(_)));

        let zero = cache_with(&[("bitcoin", 50000.0), ("ethereum", 0.0)]);
        let err = RateCalculator::quote_rate(&zero, "bitcoin", "ethereum").unwrap_err();
        assert!(matches!(err, Error::PriceUnavailable(_)));
    }
}
