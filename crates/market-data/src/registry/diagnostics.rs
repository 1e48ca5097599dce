//! Attempt tracking for provider resolution diagnostics.

use crate::errors::MarketDataError;
use crate::models::{ProviderAttempt, ProviderId};

/// Ordered record of every provider contacted during one resolution.
#[derive(Clone, Debug, Default)]
pub struct AttemptLog {
    attempts: Vec<ProviderAttempt>,
}

impl AttemptLog {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record_success(&mut self, provider: ProviderId, price: Option<f64>) {
        self.attempts.push(ProviderAttempt {
            provider,
            success: true,
            price,
            error: None,
        });
    }

    pub fn record_error(&mut self, provider: ProviderId, error: &MarketDataError) {
        self.attempts.push(ProviderAttempt::failed(provider, error));
    }

    /// Record a failure that has no typed error, such as a panicked task.
    pub fn record_message(&mut self, provider: ProviderId, message: String) {
        self.attempts.push(ProviderAttempt {
            provider,
            success: false,
            price: None,
            error: Some(message),
        });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| match (&a.error, a.success) {
                (_, true) => format!("{}: SUCCESS", a.provider),
                (Some(err), false) => format!("{}: ERROR ({})", a.provider, err),
                (None, false) => format!("{}: UNKNOWN", a.provider),
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn into_attempts(self) -> Vec<ProviderAttempt> {
        self.attempts
    }
}
