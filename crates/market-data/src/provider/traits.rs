//! Market data provider trait definitions.
//!
//! This module defines the core `MarketDataProvider` trait that all
//! market data providers must implement.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{Candle, CandleRequest, CanonicalAsset, ProviderId, Quote};
use crate::resolver::{candidates, PairCandidate};
use crate::transport::Transport;

use super::capabilities::ProviderCapabilities;

/// Trait for market data providers.
///
/// Adapters are stateless: every network call goes through the [`Transport`]
/// the registry builds for that invocation, which carries the caller's
/// timeout, retry budget and cancel signal.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use spotline_market_data::provider::{MarketDataProvider, ProviderCapabilities};
///
/// struct MyExchange;
///
/// #[async_trait]
/// impl MarketDataProvider for MyExchange {
///     fn id(&self) -> ProviderId {
///         ProviderId::Binance
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities {
///             supports_candles: false,
///             max_candle_limit: 0,
///         }
///     }
///
///     // ... implement fetch_spot_price
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider.
    fn id(&self) -> ProviderId;

    /// Describes what this provider can do.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Market identifiers to probe for a pair, in order.
    fn candidates(&self, base: &CanonicalAsset, quote: &CanonicalAsset) -> Vec<PairCandidate> {
        candidates(self.id(), base, quote)
    }

    /// Fetch the latest traded price for a pair.
    async fn fetch_spot_price(
        &self,
        transport: &Transport,
        base: &CanonicalAsset,
        quote: &CanonicalAsset,
    ) -> Result<Quote, MarketDataError>;

    /// Fetch OHLCV candles for a pair, oldest first, at most `request.limit`.
    ///
    /// Default implementation reports every interval as unsupported.
    async fn fetch_candles(
        &self,
        transport: &Transport,
        base: &CanonicalAsset,
        quote: &CanonicalAsset,
        request: &CandleRequest,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let _ = (transport, base, quote);
        Err(MarketDataError::UnsupportedInterval {
            provider: self.id(),
            interval: request.interval,
        })
    }
}
