//! Conversion of provider kline rows into canonical [`Candle`]s.
//!
//! Every supported exchange returns candles as JSON arrays of loosely typed
//! values. A [`RowLayout`] says where each field lives and how time is
//! encoded; [`normalize_rows`] does the rest.

use chrono::{DateTime, Utc};
use log::warn;
use serde_json::Value;

use crate::models::{Candle, CandleInterval};

/// Unit of the raw open/close timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

/// Where a row's close time comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseTime {
    /// Read from this column, in the layout's time unit.
    Explicit(usize),
    /// Last millisecond of the interval, see [`CandleInterval::close_time_for`].
    Derived,
}

/// Column positions of one provider's kline rows.
#[derive(Clone, Copy, Debug)]
pub struct RowLayout {
    pub open_time: usize,
    pub open: usize,
    pub high: usize,
    pub low: usize,
    pub close: usize,
    pub volume: usize,
    pub close_time: CloseTime,
    pub time_unit: TimeUnit,
}

/// Parse raw rows into candles sorted oldest first.
///
/// Malformed rows are skipped with a warning. Rows sharing an open time keep
/// the first occurrence after sorting.
pub fn normalize_rows(
    rows: &[Vec<Value>],
    layout: &RowLayout,
    interval: CandleInterval,
) -> Vec<Candle> {
    let mut candles: Vec<Candle> = rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| match parse_row(row, layout, interval) {
            Ok(candle) => Some(candle),
            Err(reason) => {
                warn!("Skipping malformed candle row {}: {}", idx, reason);
                None
            }
        })
        .collect();

    candles.sort_by_key(|c| c.open_time);
    candles.dedup_by_key(|c| c.open_time);
    candles
}

/// Keep the `limit` most recent candles of an ascending series.
pub fn trim_to_limit(mut candles: Vec<Candle>, limit: usize) -> Vec<Candle> {
    if candles.len() > limit {
        candles.drain(..candles.len() - limit);
    }
    candles
}

fn parse_row(
    row: &[Value],
    layout: &RowLayout,
    interval: CandleInterval,
) -> Result<Candle, String> {
    let open_time = timestamp(row, layout.open_time, "open time", layout.time_unit)?;
    let close_time = match layout.close_time {
        CloseTime::Explicit(idx) => timestamp(row, idx, "close time", layout.time_unit)?,
        CloseTime::Derived => interval.close_time_for(open_time),
    };

    Ok(Candle {
        open_time,
        close_time,
        open: number(row, layout.open, "open")?,
        high: number(row, layout.high, "high")?,
        low: number(row, layout.low, "low")?,
        close: number(row, layout.close, "close")?,
        volume: number(row, layout.volume, "volume")?,
    })
}

fn column<'a>(row: &'a [Value], idx: usize, name: &str) -> Result<&'a Value, String> {
    row.get(idx)
        .ok_or_else(|| format!("missing {} (column {})", name, idx))
}

fn number(row: &[Value], idx: usize, name: &str) -> Result<f64, String> {
    let value = column(row, idx, name)?;
    value_to_f64(value).ok_or_else(|| format!("{} is not numeric: {}", name, value))
}

fn timestamp(
    row: &[Value],
    idx: usize,
    name: &str,
    unit: TimeUnit,
) -> Result<DateTime<Utc>, String> {
    let value = column(row, idx, name)?;
    value_to_i64(value)
        .and_then(|raw| to_datetime(raw, unit))
        .ok_or_else(|| format!("{} is not a valid timestamp: {}", name, value))
}

fn to_datetime(raw: i64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    match unit {
        TimeUnit::Seconds => DateTime::from_timestamp(raw, 0),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(raw),
    }
}

/// A finite number from a JSON number or a decimal string.
pub fn value_to_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// An integer from a JSON number or an integer string.
pub fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}
