use crate::models::ProviderId;
use crate::transport::{CancelSignal, RequestPolicy};

/// Caller input for a spot or consensus price.
///
/// Tickers are taken raw and normalized by the engine. Unset options fall
/// back to the engine configuration.
#[derive(Clone, Debug, Default)]
pub struct PriceRequest {
    pub base: String,
    pub quote: String,
    pub providers: Option<Vec<ProviderId>>,
    pub policy: Option<RequestPolicy>,
    pub signal: CancelSignal,
}

impl PriceRequest {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
            ..Self::default()
        }
    }

    pub fn with_providers(mut self, providers: Vec<ProviderId>) -> Self {
        self.providers = Some(providers);
        self
    }

    pub fn with_policy(mut self, policy: RequestPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_signal(mut self, signal: CancelSignal) -> Self {
        self.signal = signal;
        self
    }
}

/// Caller input for a candle series.
#[derive(Clone, Debug)]
pub struct CandlesRequest {
    pub price: PriceRequest,
    /// Interval token, e.g. `1h`.
    pub interval: String,
    pub limit: usize,
}

impl CandlesRequest {
    pub fn new(price: PriceRequest, interval: impl Into<String>, limit: usize) -> Self {
        Self {
            price,
            interval: interval.into(),
            limit,
        }
    }
}

/// Caller input for single-market detail calls.
#[derive(Clone, Debug, Default)]
pub struct MarketRequest {
    /// Raw market symbol, e.g. `btc-usdt`.
    pub symbol: String,
    /// Depth levels or trade count; ignored by calls without a limit.
    pub limit: Option<usize>,
    pub policy: Option<RequestPolicy>,
    pub signal: CancelSignal,
}

impl MarketRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_policy(mut self, policy: RequestPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_signal(mut self, signal: CancelSignal) -> Self {
        self.signal = signal;
        self
    }
}
