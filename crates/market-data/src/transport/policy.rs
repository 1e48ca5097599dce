use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default number of additional attempts after the first one.
pub const DEFAULT_RETRIES: u32 = 2;

/// Default fixed wait between attempts.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Per-call network behavior.
///
/// Unspecified fields take their defaults when deserialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestPolicy {
    /// Deadline for a single HTTP attempt.
    pub timeout_ms: u64,
    /// Maximum additional attempts after the first.
    pub retries: u32,
    /// Fixed wait between attempts. Not exponential.
    pub retry_delay_ms: u64,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retries: DEFAULT_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl RequestPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Whether a failed attempt number `attempt` (0-based) may be re-issued.
    ///
    /// Rate limits (429) and server errors (>= 500) are always retryable.
    /// Network failures and timeouts are retryable only for idempotent
    /// methods. Every other error is terminal.
    pub fn should_retry(&self, error: &MarketDataError, method: &Method, attempt: u32) -> bool {
        if attempt >= self.retries {
            return false;
        }
        match error {
            MarketDataError::RateLimited { .. } => true,
            MarketDataError::Http { status, .. } => *status >= 500,
            MarketDataError::Network { .. } | MarketDataError::Timeout { .. } => {
                method.is_idempotent()
            }
            _ => false,
        }
    }
}
