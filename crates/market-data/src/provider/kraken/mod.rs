//! Kraken market data provider.
//!
//! Kraken still lists most majors under legacy asset codes (`XXBTZUSD`), so
//! pair lookup probes every alias combination until one is accepted.
//! Errors are reported in-band: HTTP 200 with a non-empty `error` array.
//!
//! API documentation: https://docs.kraken.com/api/docs/rest-api/get-ticker-information

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::candles::{normalize_rows, trim_to_limit, CloseTime, RowLayout, TimeUnit};
use crate::errors::MarketDataError;
use crate::models::{Candle, CandleInterval, CandleRequest, CanonicalAsset, ProviderId, Quote};
use crate::provider::parse::{clamp_limit, parse_price};
use crate::provider::{probe_candidates, MarketDataProvider, ProviderCapabilities};
use crate::transport::Transport;

const BASE_URL: &str = "https://api.kraken.com/0/public";
const PROVIDER: ProviderId = ProviderId::Kraken;
const MAX_CANDLES: usize = 720;

/// `[time, open, high, low, close, vwap, volume, count]`
const OHLC_LAYOUT: RowLayout = RowLayout {
    open_time: 0,
    open: 1,
    high: 2,
    low: 3,
    close: 4,
    volume: 6,
    close_time: CloseTime::Derived,
    time_unit: TimeUnit::Seconds,
};

// ============================================================================
// API Response Structures
// ============================================================================

/// Envelope shared by every public endpoint.
#[derive(Debug, Deserialize)]
struct KrakenResponse<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

/// One pair of `/Ticker`. Only the last trade is used.
#[derive(Debug, Deserialize)]
struct TickerInfo {
    /// Last trade closed: `[price, lot volume]`
    c: Vec<String>,
}

// ============================================================================
// KrakenProvider
// ============================================================================

#[derive(Debug, Default)]
pub struct KrakenProvider;

impl KrakenProvider {
    pub fn new() -> Self {
        Self
    }

    /// Candle interval in minutes. Kraken supports every canonical interval.
    fn interval_minutes(interval: CandleInterval) -> i64 {
        interval.minutes()
    }
}

#[async_trait]
impl MarketDataProvider for KrakenProvider {
    fn id(&self) -> ProviderId {
        PROVIDER
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_candles: true,
            max_candle_limit: MAX_CANDLES,
        }
    }

    async fn fetch_spot_price(
        &self,
        transport: &Transport,
        base: &CanonicalAsset,
        quote: &CanonicalAsset,
    ) -> Result<Quote, MarketDataError> {
        let url = format!("{}/Ticker", BASE_URL);
        let candidates = self.candidates(base, quote);

        probe_candidates(PROVIDER, &candidates, |candidate| {
            let url = url.clone();
            async move {
                debug!("Kraken ticker request: {}", candidate.symbol);
                let response: KrakenResponse<HashMap<String, TickerInfo>> = transport
                    .get_json(&url, &[("pair", candidate.symbol.clone())])
                    .await?;
                let price = last_trade_price(&candidate.symbol, response)?;
                Ok(Quote::new(
                    PROVIDER,
                    base.clone(),
                    quote.clone(),
                    price,
                    Utc::now(),
                ))
            }
        })
        .await
    }

    async fn fetch_candles(
        &self,
        transport: &Transport,
        base: &CanonicalAsset,
        quote: &CanonicalAsset,
        request: &CandleRequest,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let url = format!("{}/OHLC", BASE_URL);
        let minutes = Self::interval_minutes(request.interval);
        let limit = clamp_limit(request.limit, self.capabilities().max_candle_limit);
        let candidates = self.candidates(base, quote);

        probe_candidates(PROVIDER, &candidates, |candidate| {
            let url = url.clone();
            async move {
                let response: KrakenResponse<serde_json::Map<String, Value>> = transport
                    .get_json(
                        &url,
                        &[
                            ("pair", candidate.symbol.clone()),
                            ("interval", minutes.to_string()),
                        ],
                    )
                    .await?;
                let rows = ohlc_rows(&candidate.symbol, response)?;
                let candles = normalize_rows(&rows, &OHLC_LAYOUT, request.interval);
                Ok(trim_to_limit(candles, limit))
            }
        })
        .await
    }
}

// ============================================================================
// Response conversion
// ============================================================================

/// Unwrap the envelope, turning in-band errors into typed ones.
fn into_result<T>(symbol: &str, response: KrakenResponse<T>) -> Result<T, MarketDataError> {
    if let Some(first) = response.error.first() {
        return Err(classify_error(symbol, first));
    }
    response.result.ok_or_else(|| MarketDataError::InvalidResponse {
        provider: PROVIDER,
        message: format!("{}: response has no result", symbol),
    })
}

fn classify_error(symbol: &str, error: &str) -> MarketDataError {
    if error.starts_with("EQuery:Unknown asset pair") {
        MarketDataError::SymbolNotFound {
            provider: PROVIDER,
            symbol: symbol.to_string(),
        }
    } else if error.starts_with("EAPI:Rate limit") {
        MarketDataError::RateLimited { provider: PROVIDER }
    } else {
        warn!("Kraken error for {}: {}", symbol, error);
        MarketDataError::InvalidResponse {
            provider: PROVIDER,
            message: format!("{}: {}", symbol, error),
        }
    }
}

fn last_trade_price(
    symbol: &str,
    response: KrakenResponse<HashMap<String, TickerInfo>>,
) -> Result<f64, MarketDataError> {
    let result = into_result(symbol, response)?;
    // Keyed by Kraken's own pair name, which may differ from the request
    let info = result
        .into_values()
        .next()
        .ok_or_else(|| MarketDataError::SymbolNotFound {
            provider: PROVIDER,
            symbol: symbol.to_string(),
        })?;
    let raw = info
        .c
        .first()
        .ok_or_else(|| MarketDataError::InvalidResponse {
            provider: PROVIDER,
            message: format!("{}: ticker has no last trade", symbol),
        })?;
    parse_price(PROVIDER, symbol, raw)
}

fn ohlc_rows(
    symbol: &str,
    response: KrakenResponse<serde_json::Map<String, Value>>,
) -> Result<Vec<Vec<Value>>, MarketDataError> {
    let result = into_result(symbol, response)?;
    // The result carries a "last" cursor next to the pair's rows
    let rows = result
        .into_iter()
        .find(|(key, _)| key != "last")
        .map(|(_, rows)| rows)
        .ok_or_else(|| MarketDataError::SymbolNotFound {
            provider: PROVIDER,
            symbol: symbol.to_string(),
        })?;

    let Value::Array(rows) = rows else {
        return Err(MarketDataError::InvalidResponse {
            provider: PROVIDER,
            message: format!("{}: OHLC rows are not an array", symbol),
        });
    };

    Ok(rows
        .into_iter()
        .map(|row| match row {
            Value::Array(fields) => fields,
            // Left empty so the normalizer skips it with a warning
            _ => Vec::new(),
        })
        .collect())
}
