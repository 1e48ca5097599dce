//! Binance spot market data provider.
//!
//! Public, keyless endpoints of `api.binance.com`:
//! - `/ticker/price` for spot prices
//! - `/klines` for candles (millisecond times, explicit close time)
//! - `/ticker/24hr`, `/depth`, `/trades`, `/exchangeInfo` for single-market detail
//!
//! Symbols are the canonical base and quote concatenated (`BTCUSDT`).
//! API documentation: https://developers.binance.com/docs/binance-spot-api-docs/rest-api

mod models;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use crate::candles::{normalize_rows, trim_to_limit, CloseTime, RowLayout, TimeUnit};
use crate::errors::MarketDataError;
use crate::models::{
    BookLevel, Candle, CandleInterval, CandleRequest, CanonicalAsset, OrderBook, ProviderId, Quote,
    SymbolInfo, Ticker24h, Trade,
};
use crate::provider::parse::{clamp_limit, from_millis, parse_decimal, parse_f64, parse_price};
use crate::provider::{probe_candidates, MarketDataProvider, ProviderCapabilities};
use crate::transport::Transport;

use models::{
    DepthResponse, ErrorResponse, ExchangeInfoResponse, PriceResponse, SymbolResponse,
    Ticker24hResponse, TradeResponse,
};

const BASE_URL: &str = "https://api.binance.com/api/v3";
const PROVIDER: ProviderId = ProviderId::Binance;

const MAX_KLINES: usize = 1000;
/// Largest order book depth the API serves.
pub const MAX_DEPTH: usize = 5000;
/// Largest recent trade window the API serves.
pub const MAX_TRADES: usize = 1000;

/// Binance error code for an unknown symbol.
const INVALID_SYMBOL: i64 = -1121;

/// `[openTime, open, high, low, close, volume, closeTime, ...]`
const KLINE_LAYOUT: RowLayout = RowLayout {
    open_time: 0,
    open: 1,
    high: 2,
    low: 3,
    close: 4,
    volume: 5,
    close_time: CloseTime::Explicit(6),
    time_unit: TimeUnit::Milliseconds,
};

// ============================================================================
// BinanceProvider
// ============================================================================

/// Binance spot market data provider.
///
/// Also serves the single-market detail calls (24h ticker, depth, trades,
/// exchange metadata), which are only offered for Binance.
#[derive(Debug, Default)]
pub struct BinanceProvider;

impl BinanceProvider {
    pub fn new() -> Self {
        Self
    }

    fn interval(interval: CandleInterval) -> &'static str {
        // Binance accepts every canonical token verbatim
        interval.as_str()
    }

    /// Rolling 24 hour statistics for `symbol`.
    pub async fn ticker_24h(
        &self,
        transport: &Transport,
        symbol: &str,
    ) -> Result<Ticker24h, MarketDataError> {
        let url = format!("{}/ticker/24hr", BASE_URL);
        let response: Ticker24hResponse = transport
            .get_json(&url, &[("symbol", symbol.to_string())])
            .await
            .map_err(|e| map_symbol_error(symbol, e))?;
        ticker_from_response(response)
    }

    /// Order book snapshot, `limit` clamped to `1..=5000` levels per side.
    pub async fn order_book(
        &self,
        transport: &Transport,
        symbol: &str,
        limit: usize,
    ) -> Result<OrderBook, MarketDataError> {
        let url = format!("{}/depth", BASE_URL);
        let limit = clamp_limit(limit, MAX_DEPTH);
        let response: DepthResponse = transport
            .get_json(
                &url,
                &[("symbol", symbol.to_string()), ("limit", limit.to_string())],
            )
            .await
            .map_err(|e| map_symbol_error(symbol, e))?;
        book_from_response(symbol, response)
    }

    /// Most recent trades, oldest first, `limit` clamped to `1..=1000`.
    pub async fn recent_trades(
        &self,
        transport: &Transport,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<Trade>, MarketDataError> {
        let url = format!("{}/trades", BASE_URL);
        let limit = clamp_limit(limit, MAX_TRADES);
        let response: Vec<TradeResponse> = transport
            .get_json(
                &url,
                &[("symbol", symbol.to_string()), ("limit", limit.to_string())],
            )
            .await
            .map_err(|e| map_symbol_error(symbol, e))?;
        response.into_iter().map(trade_from_response).collect()
    }

    /// Exchange metadata for `symbol`.
    pub async fn exchange_info(
        &self,
        transport: &Transport,
        symbol: &str,
    ) -> Result<SymbolInfo, MarketDataError> {
        let url = format!("{}/exchangeInfo", BASE_URL);
        let response: ExchangeInfoResponse = transport
            .get_json(&url, &[("symbol", symbol.to_string())])
            .await
            .map_err(|e| map_symbol_error(symbol, e))?;
        symbol_info_from_response(symbol, response)
    }
}

#[async_trait]
impl MarketDataProvider for BinanceProvider {
    fn id(&self) -> ProviderId {
        PROVIDER
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_candles: true,
            max_candle_limit: MAX_KLINES,
        }
    }

    async fn fetch_spot_price(
        &self,
        transport: &Transport,
        base: &CanonicalAsset,
        quote: &CanonicalAsset,
    ) -> Result<Quote, MarketDataError> {
        let url = format!("{}/ticker/price", BASE_URL);
        let candidates = self.candidates(base, quote);

        probe_candidates(PROVIDER, &candidates, |candidate| {
            let url = url.clone();
            async move {
                debug!("Binance price request: {}", candidate.symbol);
                let response: PriceResponse = transport
                    .get_json(&url, &[("symbol", candidate.symbol.clone())])
                    .await
                    .map_err(|e| map_symbol_error(&candidate.symbol, e))?;
                let price = parse_price(PROVIDER, &response.symbol, &response.price)?;
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
        let url = format!("{}/klines", BASE_URL);
        let interval = Self::interval(request.interval);
        let limit = clamp_limit(request.limit, self.capabilities().max_candle_limit);
        let candidates = self.candidates(base, quote);

        probe_candidates(PROVIDER, &candidates, |candidate| {
            let url = url.clone();
            async move {
                let rows: Vec<Vec<Value>> = transport
                    .get_json(
                        &url,
                        &[
                            ("symbol", candidate.symbol.clone()),
                            ("interval", interval.to_string()),
                            ("limit", limit.to_string()),
                        ],
                    )
                    .await
                    .map_err(|e| map_symbol_error(&candidate.symbol, e))?;
                let candles = normalize_rows(&rows, &KLINE_LAYOUT, request.interval);
                Ok(trim_to_limit(candles, limit))
            }
        })
        .await
    }
}

// ============================================================================
// Response conversion
// ============================================================================

/// Turn Binance's "Invalid symbol" 400 into a typed not-found error.
fn map_symbol_error(symbol: &str, error: MarketDataError) -> MarketDataError {
    if let MarketDataError::Http {
        status: 400,
        message,
        ..
    } = &error
    {
        if let Ok(body) = serde_json::from_str::<ErrorResponse>(message) {
            if body.code == INVALID_SYMBOL {
                return MarketDataError::SymbolNotFound {
                    provider: PROVIDER,
                    symbol: symbol.to_string(),
                };
            }
            warn!("Binance rejected {}: {} ({})", symbol, body.msg, body.code);
        }
    }
    error
}

fn ticker_from_response(r: Ticker24hResponse) -> Result<Ticker24h, MarketDataError> {
    let num = |field: &str, raw: &str| parse_f64(PROVIDER, field, raw);
    let optional = |field: &str, raw: &Option<String>| -> Result<Option<f64>, MarketDataError> {
        raw.as_deref().map(|v| num(field, v)).transpose()
    };

    Ok(Ticker24h {
        provider: PROVIDER,
        last_price: parse_price(PROVIDER, &r.symbol, &r.last_price)?,
        open_price: num("openPrice", &r.open_price)?,
        high_price: num("highPrice", &r.high_price)?,
        low_price: num("lowPrice", &r.low_price)?,
        price_change: num("priceChange", &r.price_change)?,
        price_change_percent: num("priceChangePercent", &r.price_change_percent)?,
        weighted_avg_price: num("weightedAvgPrice", &r.weighted_avg_price)?,
        bid_price: optional("bidPrice", &r.bid_price)?,
        ask_price: optional("askPrice", &r.ask_price)?,
        volume: num("volume", &r.volume)?,
        quote_volume: num("quoteVolume", &r.quote_volume)?,
        trade_count: r.count,
        open_time: from_millis(PROVIDER, "openTime", r.open_time)?,
        close_time: from_millis(PROVIDER, "closeTime", r.close_time)?,
        symbol: r.symbol,
    })
}

fn book_from_response(symbol: &str, r: DepthResponse) -> Result<OrderBook, MarketDataError> {
    let levels = |side: Vec<(String, String)>| -> Result<Vec<BookLevel>, MarketDataError> {
        side.into_iter()
            .map(|(price, quantity)| -> Result<BookLevel, MarketDataError> {
                Ok(BookLevel {
                    price: parse_decimal(PROVIDER, "price", &price)?,
                    quantity: parse_decimal(PROVIDER, "quantity", &quantity)?,
                })
            })
            .collect()
    };

    Ok(OrderBook {
        provider: PROVIDER,
        symbol: symbol.to_string(),
        last_update_id: r.last_update_id,
        bids: levels(r.bids)?,
        asks: levels(r.asks)?,
    })
}

fn trade_from_response(r: TradeResponse) -> Result<Trade, MarketDataError> {
    Ok(Trade {
        id: r.id,
        price: parse_decimal(PROVIDER, "price", &r.price)?,
        quantity: parse_decimal(PROVIDER, "qty", &r.qty)?,
        quote_quantity: parse_decimal(PROVIDER, "quoteQty", &r.quote_qty)?,
        time: from_millis(PROVIDER, "time", r.time)?,
        is_buyer_maker: r.is_buyer_maker,
    })
}

fn symbol_info_from_response(
    symbol: &str,
    r: ExchangeInfoResponse,
) -> Result<SymbolInfo, MarketDataError> {
    let found: Option<SymbolResponse> = r.symbols.into_iter().find(|s| s.symbol == symbol);
    let s = found.ok_or_else(|| MarketDataError::SymbolNotFound {
        provider: PROVIDER,
        symbol: symbol.to_string(),
    })?;

    Ok(SymbolInfo {
        provider: PROVIDER,
        symbol: s.symbol,
        status: s.status,
        base_asset: s.base_asset,
        quote_asset: s.quote_asset,
        base_asset_precision: s.base_asset_precision,
        quote_asset_precision: s.quote_asset_precision,
        order_types: s.order_types,
        filters: s.filters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_payload() {
        let response: PriceResponse =
            serde_json::from_str(r#"{"symbol":"BTCUSDT","price":"64123.45000000"}"#).unwrap();
        let price = parse_price(PROVIDER, &response.symbol, &response.price).unwrap();
        assert_eq!(price, 64123.45);
    }

    #[test]
    fn test_invalid_symbol_maps_to_not_found() {
        let error = MarketDataError::Http {
            provider: PROVIDER,
            status: 400,
            message: r#"{"code":-1121,"msg":"Invalid symbol."}"#.to_string(),
        };
        match map_symbol_error("FOOBAR", error) {
            MarketDataError::SymbolNotFound { symbol, .. } => assert_eq!(symbol, "FOOBAR"),
            other => panic!("Expected SymbolNotFound, got {:?}", other),
        }

        let other = MarketDataError::Http {
            provider: PROVIDER,
            status: 400,
            message: r#"{"code":-1100,"msg":"Illegal characters"}"#.to_string(),
        };
        assert!(matches!(
            map_symbol_error("FOOBAR", other),
            MarketDataError::Http { status: 400, .. }
        ));
    }

    #[test]
    fn test_klines_payload() {
        let payload = r#"[
            [1499040000000,"0.01634790","0.80000000","0.01575800","0.01577100","148976.11427815",1499644799999,"2434.19055334",308,"1756.87402397","28.46694368","0"],
            [1499644800000,"0.01577100","0.01600000","0.01500000","0.01590000","1000.00000000",1500249599999,"15.9",12,"500","8","0"]
        ]"#;
        let rows: Vec<Vec<Value>> = serde_json::from_str(payload).unwrap();
        let candles = normalize_rows(&rows, &KLINE_LAYOUT, CandleInterval::OneWeek);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 0.0163479);
        assert_eq!(candles[0].close_time.timestamp_millis(), 1499644799999);
        assert_eq!(candles[1].volume, 1000.0);
    }

    #[test]
    fn test_ticker_24h_payload() {
        let payload = r#"{
            "symbol":"BNBBTC","priceChange":"-94.99999800","priceChangePercent":"-95.960",
            "weightedAvgPrice":"0.29628482","prevClosePrice":"0.10002000","lastPrice":"4.00000200",
            "lastQty":"200.00000000","bidPrice":"4.00000000","bidQty":"100.00000000",
            "askPrice":"4.00000200","askQty":"100.00000000","openPrice":"99.00000000",
            "highPrice":"100.00000000","lowPrice":"0.10000000","volume":"8913.30000000",
            "quoteVolume":"15.30000000","openTime":1499783499040,"closeTime":1499869899040,
            "firstId":28385,"lastId":28460,"count":76
        }"#;
        let response: Ticker24hResponse = serde_json::from_str(payload).unwrap();
        let ticker = ticker_from_response(response).unwrap();
        assert_eq!(ticker.symbol, "BNBBTC");
        assert_eq!(ticker.last_price, 4.000002);
        assert_eq!(ticker.price_change_percent, -95.96);
        assert_eq!(ticker.bid_price, Some(4.0));
        assert_eq!(ticker.trade_count, 76);
        assert_eq!(ticker.open_time.timestamp_millis(), 1499783499040);
    }

    #[test]
    fn test_depth_keeps_exact_strings() {
        let payload = r#"{
            "lastUpdateId":1027024,
            "bids":[["4.00000000","431.00000000"],["3.99000000","12.50000000"]],
            "asks":[["4.00000200","12.00000000"]]
        }"#;
        let response: DepthResponse = serde_json::from_str(payload).unwrap();
        let book = book_from_response("BNBBTC", response).unwrap();
        assert_eq!(book.last_update_id, 1027024);
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.best_bid().unwrap().price, "4.00000000");
        assert_eq!(book.best_ask().unwrap().quantity, "12.00000000");
    }

    #[test]
    fn test_depth_serializes_long_decimals_verbatim() {
        let payload = r#"{
            "lastUpdateId":7,
            "bids":[["0.123456789012345678901234567891","12345678901234567890123456789.5"]],
            "asks":[["1e-8","3.10"]]
        }"#;
        let response: DepthResponse = serde_json::from_str(payload).unwrap();
        let book = book_from_response("BNBBTC", response).unwrap();
        let value = serde_json::to_value(&book).unwrap();

        assert_eq!(value["bids"][0]["price"], "0.123456789012345678901234567891");
        assert_eq!(value["bids"][0]["quantity"], "12345678901234567890123456789.5");
        assert_eq!(value["asks"][0]["price"], "1e-8");
        assert_eq!(value["asks"][0]["quantity"], "3.10");
    }

    #[test]
    fn test_depth_rejects_garbage_level() {
        let payload = r#"{"lastUpdateId":1,"bids":[["abc","1"]],"asks":[]}"#;
        let response: DepthResponse = serde_json::from_str(payload).unwrap();
        assert!(matches!(
            book_from_response("BNBBTC", response),
            Err(MarketDataError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_trades_payload() {
        let payload = r#"[{"id":28457,"price":"4.00000100","qty":"12.00000000","quoteQty":"48.000012","time":1499865549590,"isBuyerMaker":true,"isBestMatch":true}]"#;
        let response: Vec<TradeResponse> = serde_json::from_str(payload).unwrap();
        let trades: Vec<Trade> = response
            .into_iter()
            .map(trade_from_response)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(trades[0].id, 28457);
        assert_eq!(trades[0].price, "4.00000100");
        assert_eq!(trades[0].quote_quantity, "48.000012");
        assert!(trades[0].is_buyer_maker);
    }

    #[test]
    fn test_exchange_info_payload() {
        let payload = r#"{"timezone":"UTC","symbols":[{
            "symbol":"ETHBTC","status":"TRADING","baseAsset":"ETH","baseAssetPrecision":8,
            "quoteAsset":"BTC","quotePrecision":8,"quoteAssetPrecision":8,
            "orderTypes":["LIMIT","MARKET"],
            "filters":[{"filterType":"PRICE_FILTER","minPrice":"0.00000100","maxPrice":"100000.00000000","tickSize":"0.00000100"}]
        }]}"#;
        let response: ExchangeInfoResponse = serde_json::from_str(payload).unwrap();
        let info = symbol_info_from_response("ETHBTC", response).unwrap();
        assert_eq!(info.status, "TRADING");
        assert_eq!(info.base_asset, "ETH");
        assert_eq!(info.order_types, vec!["LIMIT", "MARKET"]);
        assert_eq!(info.filters[0]["tickSize"], "0.00000100");

        let empty: ExchangeInfoResponse = serde_json::from_str(r#"{"symbols":[]}"#).unwrap();
        assert!(matches!(
            symbol_info_from_response("ETHBTC", empty),
            Err(MarketDataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn test_capabilities() {
        let provider = BinanceProvider::new();
        assert_eq!(provider.id(), ProviderId::Binance);
        assert_eq!(provider.capabilities().max_candle_limit, 1000);
        assert!(provider.capabilities().supports_candles);
    }
}
