//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

use crate::models::{CandleInterval, ProviderAttempt, ProviderId};

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which determines how the transport and the registry react to it.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Caller input violates a declared constraint (empty ticker,
    /// unsupported interval token, out-of-range limit).
    /// Raised before any network call.
    #[error("Invalid request: {message}")]
    Validation {
        /// What was wrong with the request
        message: String,
    },

    /// The provider has no native representation for this interval.
    #[error("Unsupported interval for {provider}: {interval}")]
    UnsupportedInterval {
        provider: ProviderId,
        interval: CandleInterval,
    },

    /// The caller's cancel signal fired.
    #[error("Request cancelled")]
    Cancelled,

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: ProviderId,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: ProviderId,
    },

    /// Connection or transfer failure below the HTTP layer.
    #[error("Network error: {provider} - {message}")]
    Network {
        provider: ProviderId,
        message: String,
    },

    /// Non-success HTTP status other than 429.
    #[error("HTTP {status}: {provider} - {message}")]
    Http {
        provider: ProviderId,
        status: u16,
        message: String,
    },

    /// The provider answered but the payload was malformed, empty, or
    /// carried an in-band error.
    #[error("Invalid response: {provider} - {message}")]
    InvalidResponse {
        provider: ProviderId,
        message: String,
    },

    /// The provider does not list this market.
    #[error("Symbol not found: {provider} - {symbol}")]
    SymbolNotFound {
        provider: ProviderId,
        symbol: String,
    },

    /// Every pair candidate of one provider was tried and none worked.
    #[error("Provider error: {provider} - tried [{}] - {message}", .tried.join(", "))]
    ProviderFailed {
        provider: ProviderId,
        /// Candidate symbols in the order they were tried
        tried: Vec<String>,
        /// The last underlying error message
        message: String,
    },

    /// Every provider in a fallback preference list failed.
    #[error("All providers failed: {}", summarize(.attempts))]
    AllProvidersFailed { attempts: Vec<ProviderAttempt> },

    /// No provider produced a quote in consensus mode.
    #[error("No quotes: {}", summarize(.failures))]
    NoQuotes { failures: Vec<ProviderAttempt> },
}

impl MarketDataError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::Retry`]: transient, the transport may re-issue the request
    /// - [`RetryClass::NextProvider`]: terminal for this provider only
    /// - [`RetryClass::Abort`]: terminal for the whole resolution
    ///
    /// # Examples
    ///
    /// ```
    /// use spotline_market_data::errors::{MarketDataError, RetryClass};
    /// use spotline_market_data::ProviderId;
    ///
    /// let error = MarketDataError::RateLimited { provider: ProviderId::Binance };
    /// assert_eq!(error.retry_class(), RetryClass::Retry);
    ///
    /// let error = MarketDataError::Http {
    ///     provider: ProviderId::Coinbase,
    ///     status: 404,
    ///     message: "NotFound".to_string(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Transient errors - retry within the request policy
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Network { .. } => {
                RetryClass::Retry
            }
            Self::Http { status, .. } if *status >= 500 => RetryClass::Retry,

            // Permanent for this provider - try the next one
            Self::Http { .. }
            | Self::InvalidResponse { .. }
            | Self::SymbolNotFound { .. }
            | Self::ProviderFailed { .. }
            | Self::UnsupportedInterval { .. } => RetryClass::NextProvider,

            // Caller problems and exhausted resolutions
            Self::Validation { .. }
            | Self::Cancelled
            | Self::AllProvidersFailed { .. }
            | Self::NoQuotes { .. } => RetryClass::Abort,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.retry_class() == RetryClass::Retry
    }

    /// Attempt log carried by an aggregate failure, if any.
    pub fn attempts(&self) -> &[ProviderAttempt] {
        match self {
            Self::AllProvidersFailed { attempts } => attempts,
            Self::NoQuotes { failures } => failures,
            _ => &[],
        }
    }
}

fn summarize(attempts: &[ProviderAttempt]) -> String {
    if attempts.is_empty() {
        return "no providers attempted".to_string();
    }
    attempts
        .iter()
        .map(|a| match &a.error {
            Some(err) => format!("{}: {}", a.provider, err),
            None => format!("{}: ok", a.provider),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_aborts() {
        let error = MarketDataError::validation("empty base asset");
        assert_eq!(error.retry_class(), RetryClass::Abort);
    }

    #[test]
    fn test_cancelled_aborts() {
        assert_eq!(MarketDataError::Cancelled.retry_class(), RetryClass::Abort);
    }

    #[test]
    fn test_rate_limited_retries() {
        let error = MarketDataError::RateLimited {
            provider: ProviderId::Binance,
        };
        assert_eq!(error.retry_class(), RetryClass::Retry);
        assert!(error.is_transient());
    }

    #[test]
    fn test_timeout_and_network_retry() {
        let timeout = MarketDataError::Timeout {
            provider: ProviderId::Kraken,
        };
        let network = MarketDataError::Network {
            provider: ProviderId::Kraken,
            message: "connection reset".to_string(),
        };
        assert_eq!(timeout.retry_class(), RetryClass::Retry);
        assert_eq!(network.retry_class(), RetryClass::Retry);
    }

    #[test]
    fn test_server_error_retries() {
        let error = MarketDataError::Http {
            provider: ProviderId::Okx,
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Retry);
    }

    #[test]
    fn test_client_error_moves_to_next_provider() {
        for status in [400, 401, 404, 418] {
            let error = MarketDataError::Http {
                provider: ProviderId::Coinbase,
                status,
                message: String::new(),
            };
            assert_eq!(error.retry_class(), RetryClass::NextProvider);
            assert!(!error.is_transient());
        }
    }

    #[test]
    fn test_provider_failed_moves_to_next_provider() {
        let error = MarketDataError::ProviderFailed {
            provider: ProviderId::Kraken,
            tried: vec!["XBTUSD".to_string(), "XXBTZUSD".to_string()],
            message: "Unknown asset pair".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
        assert_eq!(
            error.to_string(),
            "Provider error: KRAKEN - tried [XBTUSD, XXBTZUSD] - Unknown asset pair"
        );
    }

    #[test]
    fn test_aggregate_errors_list_every_attempt() {
        let attempts = vec![
            ProviderAttempt::failed(
                ProviderId::Binance,
                &MarketDataError::Timeout {
                    provider: ProviderId::Binance,
                },
            ),
            ProviderAttempt::failed(
                ProviderId::Okx,
                &MarketDataError::RateLimited {
                    provider: ProviderId::Okx,
                },
            ),
        ];
        let error = MarketDataError::AllProvidersFailed {
            attempts: attempts.clone(),
        };
        assert_eq!(error.retry_class(), RetryClass::Abort);
        assert_eq!(error.attempts().len(), 2);
        assert_eq!(
            error.to_string(),
            "All providers failed: BINANCE: Timeout: BINANCE; OKX: Rate limited: OKX"
        );

        let error = MarketDataError::NoQuotes { failures: attempts };
        assert!(error.to_string().starts_with("No quotes: BINANCE"));
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::UnsupportedInterval {
            provider: ProviderId::Coinbase,
            interval: CandleInterval::FourHours,
        };
        assert_eq!(error.to_string(), "Unsupported interval for COINBASE: 4h");

        let error = MarketDataError::SymbolNotFound {
            provider: ProviderId::Okx,
            symbol: "FOO-BAR".to_string(),
        };
        assert_eq!(error.to_string(), "Symbol not found: OKX - FOO-BAR");
    }
}
