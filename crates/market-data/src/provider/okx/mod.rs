//! OKX market data provider.
//!
//! Public v5 market endpoints. Instrument ids are dash-joined (`BTC-USDT`).
//! Every response is wrapped in `{"code": "0", "msg": "", "data": [...]}`; a
//! non-zero code is an error even on HTTP 200.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::candles::{normalize_rows, trim_to_limit, CloseTime, RowLayout, TimeUnit};
use crate::errors::MarketDataError;
use crate::models::{Candle, CandleInterval, CandleRequest, CanonicalAsset, ProviderId, Quote};
use crate::provider::parse::{clamp_limit, parse_price};
use crate::provider::{probe_candidates, MarketDataProvider, ProviderCapabilities};
use crate::transport::Transport;

const BASE_URL: &str = "https://www.okx.com/api/v5/market";
const PROVIDER: ProviderId = ProviderId::Okx;
const MAX_CANDLES: usize = 300;

/// OKX code for an unknown instrument id.
const INSTRUMENT_NOT_FOUND: &str = "51001";

/// `[ts, o, h, l, c, vol, volCcy, volCcyQuote, confirm]`, newest first
const CANDLE_LAYOUT: RowLayout = RowLayout {
    open_time: 0,
    open: 1,
    high: 2,
    low: 3,
    close: 4,
    volume: 5,
    close_time: CloseTime::Derived,
    time_unit: TimeUnit::Milliseconds,
};

#[derive(Debug, Deserialize)]
struct OkxResponse<T> {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerData {
    last: String,
    #[serde(default)]
    ts: Option<String>,
}

#[derive(Debug, Default)]
pub struct OkxProvider;

impl OkxProvider {
    pub fn new() -> Self {
        Self
    }

    fn bar(interval: CandleInterval) -> &'static str {
        match interval {
            CandleInterval::OneMinute => "1m",
            CandleInterval::FiveMinutes => "5m",
            CandleInterval::FifteenMinutes => "15m",
            CandleInterval::ThirtyMinutes => "30m",
            CandleInterval::OneHour => "1H",
            CandleInterval::FourHours => "4H",
            CandleInterval::OneDay => "1D",
            CandleInterval::OneWeek => "1W",
        }
    }
}

#[async_trait]
impl MarketDataProvider for OkxProvider {
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
        let url = format!("{}/ticker", BASE_URL);
        let candidates = self.candidates(base, quote);

        probe_candidates(PROVIDER, &candidates, |candidate| {
            let url = url.clone();
            async move {
                let inst_id = candidate.joined("-");
                debug!("OKX ticker request: {}", inst_id);
                let response: OkxResponse<TickerData> = transport
                    .get_json(&url, &[("instId", inst_id.clone())])
                    .await
                    .map_err(|e| map_http_error(&inst_id, e))?;
                let ticker = first_row(&inst_id, response)?;
                let price = parse_price(PROVIDER, &inst_id, &ticker.last)?;
                let timestamp = ticker
                    .ts
                    .as_deref()
                    .and_then(|ts| ts.parse::<i64>().ok())
                    .and_then(chrono::DateTime::from_timestamp_millis)
                    .unwrap_or_else(Utc::now);
                Ok(Quote::new(
                    PROVIDER,
                    base.clone(),
                    quote.clone(),
                    price,
                    timestamp,
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
        let url = format!("{}/candles", BASE_URL);
        let bar = Self::bar(request.interval);
        let limit = clamp_limit(request.limit, self.capabilities().max_candle_limit);
        let candidates = self.candidates(base, quote);

        probe_candidates(PROVIDER, &candidates, |candidate| {
            let url = url.clone();
            async move {
                let inst_id = candidate.joined("-");
                let response: OkxResponse<Vec<Value>> = transport
                    .get_json(
                        &url,
                        &[
                            ("instId", inst_id.clone()),
                            ("bar", bar.to_string()),
                            ("limit", limit.to_string()),
                        ],
                    )
                    .await
                    .map_err(|e| map_http_error(&inst_id, e))?;
                let rows = data_rows(&inst_id, response)?;
                let candles = normalize_rows(&rows, &CANDLE_LAYOUT, request.interval);
                Ok(trim_to_limit(candles, limit))
            }
        })
        .await
    }
}

/// OKX answers unknown instruments with HTTP 400 and code 51001.
fn map_http_error(inst_id: &str, error: MarketDataError) -> MarketDataError {
    if let MarketDataError::Http {
        status: 400,
        message,
        ..
    } = &error
    {
        if let Ok(body) = serde_json::from_str::<OkxResponse<Value>>(message) {
            return classify_code(inst_id, &body.code, &body.msg);
        }
    }
    error
}

fn classify_code(inst_id: &str, code: &str, msg: &str) -> MarketDataError {
    if code == INSTRUMENT_NOT_FOUND {
        MarketDataError::SymbolNotFound {
            provider: PROVIDER,
            symbol: inst_id.to_string(),
        }
    } else {
        MarketDataError::InvalidResponse {
            provider: PROVIDER,
            message: format!("{}: code {} {}", inst_id, code, msg),
        }
    }
}

fn data_rows<T>(inst_id: &str, response: OkxResponse<T>) -> Result<Vec<T>, MarketDataError> {
    if response.code != "0" {
        return Err(classify_code(inst_id, &response.code, &response.msg));
    }
    Ok(response.data)
}

fn first_row<T>(inst_id: &str, response: OkxResponse<T>) -> Result<T, MarketDataError> {
    data_rows(inst_id, response)?
        .into_iter()
        .next()
        .ok_or_else(|| MarketDataError::SymbolNotFound {
            provider: PROVIDER,
            symbol: inst_id.to_string(),
        })
}
