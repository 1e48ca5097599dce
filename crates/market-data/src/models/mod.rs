//! Market data models
//!
//! This module contains the core data types for market data operations:
//! - `asset` - Canonical asset tickers and the normalizer
//! - `provider_id` - The fixed set of supported providers
//! - `quote` - Quotes, attempt records, spot and consensus results
//! - `candle` - Candle intervals, candles and candle series
//! - `market` - Single-market detail (24h ticker, order book, trades, metadata)

mod asset;
mod candle;
mod market;
mod provider_id;
mod quote;

pub use asset::{normalize, CanonicalAsset};
pub use candle::{Candle, CandleInterval, CandleRequest, CandleSeries};
pub use market::{BookLevel, OrderBook, SymbolInfo, Ticker24h, Trade};
pub use provider_id::ProviderId;
pub use quote::{
    ConsensusResult, ConsensusSummary, ProviderAttempt, Quote, QuoteContext, SpotResolution,
};
