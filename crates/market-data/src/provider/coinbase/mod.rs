//! Coinbase Exchange market data provider.
//!
//! Uses the public product endpoints of `api.exchange.coinbase.com`:
//! - `/products/{id}/ticker` for spot prices
//! - `/products/{id}/candles` for candles
//!
//! Product ids are dash-joined (`BTC-USD`). Candle rows are
//! `[time, low, high, open, close, volume]` with times in seconds, newest first.
//! Only six granularities exist, so 30m, 4h and 1w are unsupported.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use urlencoding::encode;

use crate::candles::{normalize_rows, trim_to_limit, CloseTime, RowLayout, TimeUnit};
use crate::errors::MarketDataError;
use crate::models::{Candle, CandleInterval, CandleRequest, CanonicalAsset, ProviderId, Quote};
use crate::provider::parse::{clamp_limit, parse_price};
use crate::provider::{probe_candidates, MarketDataProvider, ProviderCapabilities};
use crate::transport::Transport;

const BASE_URL: &str = "https://api.exchange.coinbase.com";
const PROVIDER: ProviderId = ProviderId::Coinbase;
const MAX_CANDLES: usize = 300;

const CANDLE_LAYOUT: RowLayout = RowLayout {
    open_time: 0,
    low: 1,
    high: 2,
    open: 3,
    close: 4,
    volume: 5,
    close_time: CloseTime::Derived,
    time_unit: TimeUnit::Seconds,
};

/// Response from `/products/{id}/ticker`
#[derive(Debug, Deserialize)]
struct TickerResponse {
    price: String,
    #[serde(default)]
    time: Option<String>,
}

/// Coinbase product endpoints.
#[derive(Debug, Default)]
pub struct CoinbaseProvider;

impl CoinbaseProvider {
    pub fn new() -> Self {
        Self
    }

    /// Candle granularity in seconds.
    fn granularity(interval: CandleInterval) -> Option<u32> {
        match interval {
            CandleInterval::OneMinute => Some(60),
            CandleInterval::FiveMinutes => Some(300),
            CandleInterval::FifteenMinutes => Some(900),
            CandleInterval::OneHour => Some(3_600),
            CandleInterval::OneDay => Some(86_400),
            CandleInterval::ThirtyMinutes
            | CandleInterval::FourHours
            | CandleInterval::OneWeek => None,
        }
    }

    fn product_url(product_id: &str, endpoint: &str) -> String {
        format!("{}/products/{}/{}", BASE_URL, encode(product_id), endpoint)
    }
}

#[async_trait]
impl MarketDataProvider for CoinbaseProvider {
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
        let candidates = self.candidates(base, quote);

        probe_candidates(PROVIDER, &candidates, |candidate| async move {
            let product_id = candidate.joined("-");
            debug!("Coinbase ticker request: {}", product_id);
            let response: TickerResponse = transport
                .get_json(&Self::product_url(&product_id, "ticker"), &[])
                .await
                .map_err(|e| map_not_found(&product_id, e))?;
            quote_from_ticker(&product_id, response, base, quote)
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
        let granularity =
            Self::granularity(request.interval).ok_or(MarketDataError::UnsupportedInterval {
                provider: PROVIDER,
                interval: request.interval,
            })?;
        let limit = clamp_limit(request.limit, self.capabilities().max_candle_limit);
        let candidates = self.candidates(base, quote);

        probe_candidates(PROVIDER, &candidates, |candidate| async move {
            let product_id = candidate.joined("-");
            let rows: Vec<Vec<Value>> = transport
                .get_json(
                    &Self::product_url(&product_id, "candles"),
                    &[("granularity", granularity.to_string())],
                )
                .await
                .map_err(|e| map_not_found(&product_id, e))?;
            let candles = normalize_rows(&rows, &CANDLE_LAYOUT, request.interval);
            Ok(trim_to_limit(candles, limit))
        })
        .await
    }
}

fn map_not_found(product_id: &str, error: MarketDataError) -> MarketDataError {
    match error {
        MarketDataError::Http { status: 404, .. } => MarketDataError::SymbolNotFound {
            provider: PROVIDER,
            symbol: product_id.to_string(),
        },
        other => other,
    }
}

fn quote_from_ticker(
    product_id: &str,
    response: TickerResponse,
    base: &CanonicalAsset,
    quote: &CanonicalAsset,
) -> Result<Quote, MarketDataError> {
    let price = parse_price(PROVIDER, product_id, &response.price)?;
    let timestamp = response
        .time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Ok(Quote::new(
        PROVIDER,
        base.clone(),
        quote.clone(),
        price,
        timestamp,
    ))
}
