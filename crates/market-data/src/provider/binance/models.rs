//! Binance public REST response payloads.
//!
//! Numeric fields arrive as decimal strings and are kept as `String` here;
//! the adapter decides which become `f64` and which stay verbatim.

use serde::Deserialize;

/// `GET /api/v3/ticker/price`
#[derive(Debug, Deserialize)]
pub struct PriceResponse {
    pub symbol: String,
    pub price: String,
}

/// Error body returned with 4xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub code: i64,
    pub msg: String,
}

/// `GET /api/v3/ticker/24hr`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24hResponse {
    pub symbol: String,
    pub price_change: String,
    pub price_change_percent: String,
    pub weighted_avg_price: String,
    pub last_price: String,
    #[serde(default)]
    pub bid_price: Option<String>,
    #[serde(default)]
    pub ask_price: Option<String>,
    pub open_price: String,
    pub high_price: String,
    pub low_price: String,
    pub volume: String,
    pub quote_volume: String,
    pub open_time: i64,
    pub close_time: i64,
    pub count: u64,
}

/// `GET /api/v3/depth`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthResponse {
    pub last_update_id: u64,
    /// `[price, quantity]` pairs, best first.
    pub bids: Vec<(String, String)>,
    pub asks: Vec<(String, String)>,
}

/// One element of `GET /api/v3/trades`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeResponse {
    pub id: u64,
    pub price: String,
    pub qty: String,
    pub quote_qty: String,
    pub time: i64,
    pub is_buyer_maker: bool,
}

/// `GET /api/v3/exchangeInfo`
#[derive(Debug, Deserialize)]
pub struct ExchangeInfoResponse {
    #[serde(default)]
    pub symbols: Vec<SymbolResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolResponse {
    pub symbol: String,
    pub status: String,
    pub base_asset: String,
    pub base_asset_precision: u32,
    pub quote_asset: String,
    pub quote_asset_precision: u32,
    #[serde(default)]
    pub order_types: Vec<String>,
    #[serde(default)]
    pub filters: Vec<serde_json::Value>,
}
