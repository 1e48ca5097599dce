//! Field parsing shared by the exchange adapters.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::ProviderId;

/// Parse a decimal price string into a finite, non-negative `f64`.
pub fn parse_price(
    provider: ProviderId,
    symbol: &str,
    raw: &str,
) -> Result<f64, MarketDataError> {
    let price = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| MarketDataError::InvalidResponse {
            provider,
            message: format!("{}: price '{}' is not a number", symbol, raw),
        })?;
    validate_price(provider, symbol, price)
}

pub fn validate_price(
    provider: ProviderId,
    symbol: &str,
    price: f64,
) -> Result<f64, MarketDataError> {
    if !price.is_finite() || price < 0.0 {
        return Err(MarketDataError::InvalidResponse {
            provider,
            message: format!("{}: invalid price {}", symbol, price),
        });
    }
    Ok(price)
}

/// Parse a numeric string field, naming it in the error.
pub fn parse_f64(provider: ProviderId, field: &str, raw: &str) -> Result<f64, MarketDataError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| MarketDataError::InvalidResponse {
            provider,
            message: format!("{} '{}' is not a number", field, raw),
        })
}

/// Check a decimal string and return it exactly as received, trimmed.
///
/// The text is never re-rendered: digits beyond `Decimal`'s 28 significant
/// places and scientific notation come back unchanged.
pub fn parse_decimal(
    provider: ProviderId,
    field: &str,
    raw: &str,
) -> Result<String, MarketDataError> {
    let text = raw.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| MarketDataError::InvalidResponse {
            provider,
            message: format!("{} '{}' is not a decimal: {}", field, raw, e),
        })?;
    Ok(text.to_string())
}

/// Millisecond epoch timestamp to UTC.
pub fn from_millis(
    provider: ProviderId,
    field: &str,
    millis: i64,
) -> Result<DateTime<Utc>, MarketDataError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| MarketDataError::InvalidResponse {
        provider,
        message: format!("{} {} is out of range", field, millis),
    })
}

/// Clamp a requested row count into `1..=max`.
pub fn clamp_limit(limit: usize, max: usize) -> usize {
    limit.clamp(1, max.max(1))
}
