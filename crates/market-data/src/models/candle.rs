use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::provider_id::ProviderId;
use super::quote::ProviderAttempt;
use crate::errors::MarketDataError;

/// Canonical candle interval tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
}

impl CandleInterval {
    pub const ALL: [CandleInterval; 8] = [
        CandleInterval::OneMinute,
        CandleInterval::FiveMinutes,
        CandleInterval::FifteenMinutes,
        CandleInterval::ThirtyMinutes,
        CandleInterval::OneHour,
        CandleInterval::FourHours,
        CandleInterval::OneDay,
        CandleInterval::OneWeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
            Self::OneWeek => "1w",
        }
    }

    pub fn minutes(&self) -> i64 {
        match self {
            Self::OneMinute => 1,
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::OneHour => 60,
            Self::FourHours => 240,
            Self::OneDay => 1_440,
            Self::OneWeek => 10_080,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }

    /// Close time of the candle opening at `open_time`: the last millisecond
    /// inside the interval.
    pub fn close_time_for(&self, open_time: DateTime<Utc>) -> DateTime<Utc> {
        open_time + self.duration() - Duration::milliseconds(1)
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|interval| interval.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| {
                MarketDataError::validation(format!(
                    "unsupported interval '{}' (expected one of 1m, 5m, 15m, 30m, 1h, 4h, 1d, 1w)",
                    token
                ))
            })
    }
}

/// One OHLCV interval in canonical units.
///
/// Times serialize as ISO-8601 strings.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    /// Last instant of the interval, inclusive: open time plus the interval
    /// minus one millisecond. Binance reports this directly; the other
    /// providers get it derived the same way.
    pub close_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candle fetch parameters handed to a provider adapter.
#[derive(Clone, Debug)]
pub struct CandleRequest {
    pub interval: CandleInterval,
    /// Requested row count; adapters clamp it to their own maximum.
    pub limit: usize,
}

/// Candles resolved through the provider preference list.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleSeries {
    pub provider: ProviderId,
    pub interval: CandleInterval,
    /// Oldest first.
    pub candles: Vec<Candle>,
    pub attempts: Vec<ProviderAttempt>,
}
