//! Static description of what a provider adapter can do.

/// Describes the capabilities of a market data provider.
///
/// Used by the registry to skip providers that cannot serve a request. The
/// registry and the adapters both clamp candle limits to `max_candle_limit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderCapabilities {
    /// Whether the provider serves OHLCV candles at all.
    pub supports_candles: bool,

    /// Most candles a single request may return.
    pub max_candle_limit: usize,
}
