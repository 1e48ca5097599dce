use chrono::{DateTime, Utc};
use serde::Serialize;

use super::asset::CanonicalAsset;
use super::provider_id::ProviderId;
use crate::errors::MarketDataError;
use crate::transport::{CancelSignal, RequestPolicy};

/// Request context for a resolution call.
///
/// Built by the engine after validation, so `base` and `quote` are canonical
/// and non-empty. An empty `providers` list means "use the registry default".
#[derive(Clone, Debug)]
pub struct QuoteContext {
    pub base: CanonicalAsset,
    pub quote: CanonicalAsset,
    pub providers: Vec<ProviderId>,
    pub policy: RequestPolicy,
    pub signal: CancelSignal,
}

impl QuoteContext {
    pub fn new(base: CanonicalAsset, quote: CanonicalAsset) -> Self {
        Self {
            base,
            quote,
            providers: Vec::new(),
            policy: RequestPolicy::default(),
            signal: CancelSignal::new(),
        }
    }

    pub fn with_providers(mut self, providers: Vec<ProviderId>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_policy(mut self, policy: RequestPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_signal(mut self, signal: CancelSignal) -> Self {
        self.signal = signal;
        self
    }
}

/// A single provider's price observation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub provider: ProviderId,
    pub base: CanonicalAsset,
    pub quote: CanonicalAsset,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn new(
        provider: ProviderId,
        base: CanonicalAsset,
        quote: CanonicalAsset,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            provider,
            base,
            quote,
            price,
            timestamp,
        }
    }
}

/// Record of one provider invocation during a resolution.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAttempt {
    pub provider: ProviderId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderAttempt {
    pub fn succeeded(provider: ProviderId, price: f64) -> Self {
        Self {
            provider,
            success: true,
            price: Some(price),
            error: None,
        }
    }

    pub fn failed(provider: ProviderId, error: &MarketDataError) -> Self {
        Self {
            provider,
            success: false,
            price: None,
            error: Some(error.to_string()),
        }
    }
}

/// Outcome of a fallback-mode spot resolution.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotResolution {
    pub selected_provider: ProviderId,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub quote: Quote,
    /// Every provider contacted, in order, ending with the winner.
    pub attempts: Vec<ProviderAttempt>,
}

/// Order statistics over a set of prices.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusSummary {
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub spread_percent: f64,
}

/// Outcome of a consensus-mode resolution.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusResult {
    pub quotes: Vec<Quote>,
    pub summary: ConsensusSummary,
    /// Providers that did not contribute a quote.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ProviderAttempt>,
    pub timestamp: DateTime<Utc>,
}
