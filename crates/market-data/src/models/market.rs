//! Single-market detail types: 24h statistics, depth, trades, exchange metadata.
//!
//! Order-book and trade amounts are the provider's decimal strings, checked
//! to be numbers but otherwise kept verbatim, so the original precision
//! (including trailing zeros) survives serialization unchanged.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::provider_id::ProviderId;

/// Rolling 24 hour statistics for one market.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub provider: ProviderId,
    pub symbol: String,
    pub last_price: f64,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub weighted_avg_price: f64,
    pub bid_price: Option<f64>,
    pub ask_price: Option<f64>,
    pub volume: f64,
    pub quote_volume: f64,
    pub trade_count: u64,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
}

/// One price level of an order book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BookLevel {
    pub price: String,
    pub quantity: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    pub provider: ProviderId,
    pub symbol: String,
    pub last_update_id: u64,
    /// Best bid first.
    pub bids: Vec<BookLevel>,
    /// Best ask first.
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: u64,
    pub price: String,
    pub quantity: String,
    pub quote_quantity: String,
    pub time: DateTime<Utc>,
    pub is_buyer_maker: bool,
}

/// Exchange metadata for one market.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub provider: ProviderId,
    pub symbol: String,
    pub status: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub base_asset_precision: u32,
    pub quote_asset_precision: u32,
    pub order_types: Vec<String>,
    /// Raw filter objects, values left as the exchange sent them.
    pub filters: Vec<serde_json::Value>,
}
