//! Request validation, run before any provider is contacted.

use crate::errors::MarketDataError;
use crate::models::{normalize, CandleInterval, CanonicalAsset};

/// Largest candle count a caller may request.
pub const MAX_CANDLE_LIMIT: usize = 1000;

/// Normalize `raw` and reject it if nothing canonical is left.
pub fn validate_asset(field: &str, raw: &str) -> Result<CanonicalAsset, MarketDataError> {
    let asset = normalize(raw);
    if asset.is_empty() {
        return Err(MarketDataError::validation(format!(
            "{} asset '{}' is empty after normalization",
            field, raw
        )));
    }
    Ok(asset)
}

pub fn validate_interval(raw: &str) -> Result<CandleInterval, MarketDataError> {
    raw.parse()
}

pub fn validate_limit(limit: usize) -> Result<usize, MarketDataError> {
    if limit == 0 || limit > MAX_CANDLE_LIMIT {
        return Err(MarketDataError::validation(format!(
            "limit must be between 1 and {}, got {}",
            MAX_CANDLE_LIMIT, limit
        )));
    }
    Ok(limit)
}

/// A single-market symbol such as `btc-usdt`, normalized to `BTCUSDT`.
pub fn validate_symbol(raw: &str) -> Result<String, MarketDataError> {
    Ok(validate_asset("symbol", raw)?.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_asset() {
        assert_eq!(validate_asset("base", " btc ").unwrap().as_str(), "BTC");
        assert!(matches!(
            validate_asset("base", "--"),
            Err(MarketDataError::Validation { .. })
        ));
    }

    #[test]
    fn test_validate_interval() {
        assert_eq!(validate_interval("4H").unwrap(), CandleInterval::FourHours);
        assert!(validate_interval("2h").is_err());
    }

    #[test]
    fn test_validate_limit_bounds() {
        assert!(validate_limit(0).is_err());
        assert_eq!(validate_limit(1).unwrap(), 1);
        assert_eq!(validate_limit(1000).unwrap(), 1000);
        assert!(validate_limit(1001).is_err());
    }

    #[test]
    fn test_validate_symbol() {
        assert_eq!(validate_symbol("eth/usdt").unwrap(), "ETHUSDT");
        assert!(validate_symbol("  ").is_err());
    }
}
