//! Spotline Market Data Crate
//!
//! This crate resolves crypto spot prices and candle series from several
//! independent public exchange APIs.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Multiple providers: Binance, Coinbase, Kraken, OKX
//! - Per-provider symbol aliasing (`BTC` is `XBT`/`XXBT` on Kraken)
//! - Ordered fallback across providers with a full attempt log
//! - Concurrent multi-provider consensus (median, min, max, spread)
//! - Conditional retry with a fixed delay and cooperative cancellation
//! - Candle normalization across provider row layouts
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |  Caller request  | --> | MarketDataEngine |  (validation, defaults)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          | ProviderRegistry |  (fallback / consensus)
//!                          +------------------+
//!                                  |
//!                                  v
//!                         +-------------------+
//!                         |  PairCandidates   |  (alias table, per provider)
//!                         +-------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |    Provider      |  (over a per-call Transport)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |  Quote / Candle  |  (market data)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`CanonicalAsset`] - Provider-agnostic ticker, built by [`normalize`]
//! - [`QuoteContext`] - Validated request context handed to the registry
//! - [`SpotResolution`] - Fallback result with its attempt log
//! - [`ConsensusResult`] - Consensus result with order statistics
//! - [`CandleSeries`] - Candles oldest to newest with their attempt log
//! - [`RequestPolicy`] - Timeout, retry budget, and retry delay per call

pub mod candles;
pub mod consensus;
pub mod engine;
pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod transport;

// Re-export all public types from models
pub use models::{
    normalize, BookLevel, Candle, CandleInterval, CandleRequest, CandleSeries, CanonicalAsset,
    ConsensusResult, ConsensusSummary, OrderBook, ProviderAttempt, ProviderId, Quote,
    QuoteContext, SpotResolution, SymbolInfo, Ticker24h, Trade,
};

// Re-export engine types
pub use engine::{CandlesRequest, EngineConfig, MarketDataEngine, MarketRequest, PriceRequest};

// Re-export error types
pub use errors::{MarketDataError, RetryClass};

// Re-export resolver types
pub use resolver::{aliases_for, candidates, PairCandidate};

// Re-export provider types
pub use provider::binance::BinanceProvider;
pub use provider::coinbase::CoinbaseProvider;
pub use provider::kraken::KrakenProvider;
pub use provider::okx::OkxProvider;
pub use provider::{MarketDataProvider, ProviderCapabilities};

// Re-export registry and transport types
pub use consensus::consensus;
pub use registry::{AttemptLog, ProviderRegistry};
pub use transport::{CancelSignal, RequestPolicy, Transport};
