use crate::error::{Result, Error};

pub fn validate_api_key(api_key: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        return Err(Error::ConfigError("API key cannot be blank".to_string()));
    }
    if api_key.chars().any(char::is_whitespace) {
        return Err(Error::ConfigError("API key must not contain whitespace".to_string()));
    }
    Ok(())
}

/// Coin identifiers are lowercase slugs such as `bitcoin` or `usd-coin`.
pub fn validate_coin_id(coin_id: &str) -> Result<()> {
    if coin_id.is_empty() {
        return Err(Error::InvalidSwap("Coin id cannot be empty".to_string()));
    }
    if !coin_id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err(Error::InvalidSwap(format!(
            "Coin id must be a lowercase slug: {}",
            coin_id
        )));
    }
    Ok(())
}

pub fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() {
        return Err(Error::InvalidAmount(format!("Amount must be a number: {}", amount)));
    }
    if amount <= 0.0 {
        return Err(Error::InvalidAmount(format!("Amount must be positive: {}", amount)));
    }
    Ok(())
}

pub fn validate_pair(from: &str, to: &str) -> Result<()> {
    if from == to {
        return Err(Error::InvalidSwap(format!("Cannot swap {} for itself", from)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0.5).is_ok());
        assert!(matches!(validate_amount(0.0), Err(Error::InvalidAmount(_))));
        assert!(matches!(validate_amount(-1.0), Err(Error::InvalidAmount(_))));
        assert!(matches!(validate_amount(f64::NAN), Err(Error::InvalidAmount(_))));
        assert!(matches!(validate_amount(f64::INFINITY), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn test_validate_coin_id() {
        assert!(validate_coin_id("bitcoin").is_ok());
        assert!(validate_coin_id("usd-coin").is_ok());
        assert!(validate_coin_id("Bitcoin").is_err());
        assert!(validate_coin_id("").is_err());
    }

    #[test]
    fn test_validate_pair() {
        assert!(validate_pair("bitcoin", "ethereum").is_ok());
        assert!(matches!(validate_pair("bitcoin", "bitcoin"), Err(Error::InvalidSwap(_))));
    }
}
