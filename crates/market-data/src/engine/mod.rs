//! Market Data Engine - caller-facing facade over the provider registry.
//!
//! The engine validates raw caller input, turns it into a [`QuoteContext`],
//! and hands it to the [`ProviderRegistry`]. Single-market detail calls go
//! straight to the Binance adapter.
//!
//! ```text
//! PriceRequest ─▶ validate ─▶ QuoteContext ─▶ ProviderRegistry ─▶ SpotResolution
//!                                                     │            ConsensusResult
//!                                                     │            CandleSeries
//! MarketRequest ─▶ validate ─▶ Transport ─▶ BinanceProvider ─▶ Ticker24h / OrderBook / ...
//! ```

mod requests;
mod validation;

pub use requests::{CandlesRequest, MarketRequest, PriceRequest};
pub use validation::{
    validate_asset, validate_interval, validate_limit, validate_symbol, MAX_CANDLE_LIMIT,
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;
use crate::models::{
    CandleRequest, CandleSeries, ConsensusResult, OrderBook, ProviderId, QuoteContext,
    SpotResolution, SymbolInfo, Ticker24h, Trade,
};
use crate::provider::binance::BinanceProvider;
use crate::provider::MarketDataProvider;
use crate::registry::ProviderRegistry;
use crate::transport::{RequestPolicy, Transport};

/// Order book depth used when the caller gives none.
pub const DEFAULT_DEPTH_LIMIT: usize = 100;

/// Trade count used when the caller gives none.
pub const DEFAULT_TRADES_LIMIT: usize = 500;

/// Engine-wide defaults, overridable per request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub policy: RequestPolicy,
    /// Provider order for requests that name none. Empty means the
    /// registry's own default order.
    pub default_providers: Vec<ProviderId>,
}

/// Market data engine - entry point for every resolution.
pub struct MarketDataEngine {
    registry: ProviderRegistry,
    binance: BinanceProvider,
    config: EngineConfig,
}

impl MarketDataEngine {
    /// Engine over every built-in provider.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(ProviderRegistry::builtin(), config)
    }

    /// Engine over a caller-supplied registry.
    pub fn with_registry(registry: ProviderRegistry, config: EngineConfig) -> Self {
        debug!(
            "Market data engine initialized with providers: {:?}",
            registry.default_order()
        );
        Self {
            registry,
            binance: BinanceProvider::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Resolve a spot price with ordered provider fallback.
    pub async fn spot_price(
        &self,
        request: &PriceRequest,
    ) -> Result<SpotResolution, MarketDataError> {
        let context = self.build_context(request)?;
        self.registry.resolve_spot(&context).await
    }

    /// Query every provider concurrently and summarize the prices.
    pub async fn consensus_price(
        &self,
        request: &PriceRequest,
    ) -> Result<ConsensusResult, MarketDataError> {
        let context = self.build_context(request)?;
        self.registry.resolve_consensus(&context).await
    }

    /// Fetch a candle series, oldest first, at most `limit` rows.
    pub async fn candles(
        &self,
        request: &CandlesRequest,
    ) -> Result<CandleSeries, MarketDataError> {
        let interval = validate_interval(&request.interval)?;
        let limit = validate_limit(request.limit)?;
        let context = self.build_context(&request.price)?;
        self.registry
            .fetch_candles(&context, CandleRequest { interval, limit })
            .await
    }

    pub async fn ticker_24h(&self, request: &MarketRequest) -> Result<Ticker24h, MarketDataError> {
        let symbol = validate_symbol(&request.symbol)?;
        let transport = self.market_transport(request)?;
        self.binance.ticker_24h(&transport, &symbol).await
    }

    /// Order book snapshot; depth defaults to [`DEFAULT_DEPTH_LIMIT`].
    pub async fn order_book(&self, request: &MarketRequest) -> Result<OrderBook, MarketDataError> {
        let symbol = validate_symbol(&request.symbol)?;
        let limit = request.limit.unwrap_or(DEFAULT_DEPTH_LIMIT);
        let transport = self.market_transport(request)?;
        self.binance.order_book(&transport, &symbol, limit).await
    }

    /// Most recent trades; count defaults to [`DEFAULT_TRADES_LIMIT`].
    pub async fn recent_trades(
        &self,
        request: &MarketRequest,
    ) -> Result<Vec<Trade>, MarketDataError> {
        let symbol = validate_symbol(&request.symbol)?;
        let limit = request.limit.unwrap_or(DEFAULT_TRADES_LIMIT);
        let transport = self.market_transport(request)?;
        self.binance.recent_trades(&transport, &symbol, limit).await
    }

    pub async fn exchange_info(
        &self,
        request: &MarketRequest,
    ) -> Result<SymbolInfo, MarketDataError> {
        let symbol = validate_symbol(&request.symbol)?;
        let transport = self.market_transport(request)?;
        self.binance.exchange_info(&transport, &symbol).await
    }

    /// Validate a price request and apply the engine defaults.
    fn build_context(&self, request: &PriceRequest) -> Result<QuoteContext, MarketDataError> {
        let base = validate_asset("base", &request.base)?;
        let quote = validate_asset("quote", &request.quote)?;

        let providers = match &request.providers {
            Some(providers) if !providers.is_empty() => providers.clone(),
            _ => self.config.default_providers.clone(),
        };

        let policy = request
            .policy
            .clone()
            .unwrap_or_else(|| self.config.policy.clone());

        Ok(QuoteContext::new(base, quote)
            .with_providers(providers)
            .with_policy(policy)
            .with_signal(request.signal.clone()))
    }

    fn market_transport(&self, request: &MarketRequest) -> Result<Transport, MarketDataError> {
        if request.signal.is_cancelled() {
            return Err(MarketDataError::Cancelled);
        }
        let policy = request.policy.as_ref().unwrap_or(&self.config.policy);
        Transport::new(self.binance.id(), policy, &request.signal)
    }
}
