//! Per-call HTTP transport with conditional retry and cancellation.

use std::future::Future;

use log::{debug, warn};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;

use super::cancel::CancelSignal;
use super::policy::RequestPolicy;
use crate::errors::MarketDataError;
use crate::models::ProviderId;

const USER_AGENT: &str = concat!("spotline/", env!("CARGO_PKG_VERSION"));

/// Longest error body excerpt kept in an error message.
const MAX_ERROR_BODY: usize = 200;

/// HTTP transport bound to one provider call.
///
/// Built fresh for every provider invocation from that invocation's
/// [`RequestPolicy`]; nothing is shared between concurrent calls.
pub struct Transport {
    provider: ProviderId,
    client: Client,
    policy: RequestPolicy,
    signal: CancelSignal,
}

impl Transport {
    pub fn new(
        provider: ProviderId,
        policy: &RequestPolicy,
        signal: &CancelSignal,
    ) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(policy.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MarketDataError::Network {
                provider,
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            provider,
            client,
            policy: policy.clone(),
            signal: signal.clone(),
        })
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn policy(&self) -> &RequestPolicy {
        &self.policy
    }

    pub fn signal(&self) -> &CancelSignal {
        &self.signal
    }

    /// GET a JSON document and deserialize it.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, MarketDataError> {
        let text = self.get_text(url, query).await?;
        serde_json::from_str(&text).map_err(|e| MarketDataError::InvalidResponse {
            provider: self.provider,
            message: format!("Failed to parse response: {}", e),
        })
    }

    /// GET a body as text, retrying per the request policy.
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, MarketDataError> {
        let method = Method::GET;
        with_retry(self.provider, &self.policy, &self.signal, &method, |attempt| {
            debug!("{} request: {} (attempt {})", self.provider, url, attempt + 1);
            self.send_once(method.clone(), url, query)
        })
        .await
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, MarketDataError> {
        let response = self
            .client
            .request(method, url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: self.provider,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Http {
                provider: self.provider,
                status: status.as_u16(),
                message: excerpt(&body),
            });
        }

        response.text().await.map_err(|e| self.map_reqwest_error(e))
    }

    fn map_reqwest_error(&self, error: reqwest::Error) -> MarketDataError {
        if error.is_timeout() {
            MarketDataError::Timeout {
                provider: self.provider,
            }
        } else {
            MarketDataError::Network {
                provider: self.provider,
                message: error.to_string(),
            }
        }
    }
}

/// Run `operation` until it succeeds, fails terminally, exhausts the retry
/// budget, or `signal` fires.
///
/// `operation` receives the 0-based attempt number. The wait between attempts
/// is the policy's fixed delay. Cancellation interrupts both an in-flight
/// attempt and the wait, and returns [`MarketDataError::Cancelled`].
pub async fn with_retry<T, F, Fut>(
    provider: ProviderId,
    policy: &RequestPolicy,
    signal: &CancelSignal,
    method: &Method,
    mut operation: F,
) -> Result<T, MarketDataError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, MarketDataError>>,
{
    let mut attempt = 0;

    loop {
        if signal.is_cancelled() {
            return Err(MarketDataError::Cancelled);
        }

        let result = tokio::select! {
            biased;
            _ = signal.cancelled() => return Err(MarketDataError::Cancelled),
            result = operation(attempt) => result,
        };

        let error = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !policy.should_retry(&error, method, attempt) {
            if error.is_transient() {
                warn!(
                    "{} gave up after {} attempt(s): {}",
                    provider,
                    attempt + 1,
                    error
                );
            }
            return Err(error);
        }

        debug!(
            "{} attempt {} failed ({}), retrying in {:?}",
            provider,
            attempt + 1,
            error,
            policy.retry_delay()
        );

        tokio::select! {
            biased;
            _ = signal.cancelled() => return Err(MarketDataError::Cancelled),
            _ = tokio::time::sleep(policy.retry_delay()) => {}
        }

        attempt += 1;
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn fast_policy(retries: u32) -> RequestPolicy {
        RequestPolicy {
            timeout_ms: 1_000,
            retries,
            retry_delay_ms: 1,
        }
    }

    fn http(status: u16) -> MarketDataError {
        MarketDataError::Http {
            provider: ProviderId::Binance,
            status,
            message: String::new(),
        }
    }

    #[tokio::test]
    async fn test_repeated_503_exhausts_retry_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = with_retry(
            ProviderId::Binance,
            &fast_policy(3),
            &CancelSignal::new(),
            &Method::GET,
            |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(http(503))
                }
            },
        )
        .await;

        // One initial attempt plus three retries
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(MarketDataError::Http { status, .. }) => assert_eq!(status, 503),
            other => panic!("Expected HTTP 503, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_404_is_never_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = with_retry(
            ProviderId::Coinbase,
            &fast_policy(3),
            &CancelSignal::new(),
            &Method::GET,
            |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(http(404))
                }
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(MarketDataError::Http { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry(
            ProviderId::Kraken,
            &fast_policy(2),
            &CancelSignal::new(),
            &Method::GET,
            |attempt| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 {
                        Err(MarketDataError::RateLimited {
                            provider: ProviderId::Kraken,
                        })
                    } else {
                        Ok("payload")
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), "payload");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = with_retry(
            ProviderId::Okx,
            &fast_policy(0),
            &CancelSignal::new(),
            &Method::GET,
            |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(http(500))
                }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_during_retry_wait_stops_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let signal = CancelSignal::new();
        let policy = RequestPolicy {
            timeout_ms: 1_000,
            retries: 5,
            retry_delay_ms: 60_000,
        };

        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result: Result<(), _> = tokio::time::timeout(
            Duration::from_secs(5),
            with_retry(ProviderId::Binance, &policy, &signal, &Method::GET, |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(http(502))
                }
            }),
        )
        .await
        .expect("cancel must cut the retry wait short");

        assert!(matches!(result, Err(MarketDataError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_attempt() {
        let signal = CancelSignal::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result: Result<(), _> = tokio::time::timeout(
            Duration::from_secs(5),
            with_retry(
                ProviderId::Okx,
                &fast_policy(2),
                &signal,
                &Method::GET,
                |_| async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                },
            ),
        )
        .await
        .expect("cancel must abort the in-flight attempt");

        assert!(matches!(result, Err(MarketDataError::Cancelled)));
    }

    #[tokio::test]
    async fn test_already_cancelled_never_calls_operation() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let signal = CancelSignal::new();
        signal.cancel();

        let result: Result<(), _> = with_retry(
            ProviderId::Binance,
            &fast_policy(2),
            &signal,
            &Method::GET,
            |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        )
        .await;

        assert!(matches!(result, Err(MarketDataError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_transport_builds_from_policy() {
        let policy = fast_policy(1);
        let transport = Transport::new(ProviderId::Kraken, &policy, &CancelSignal::new()).unwrap();
        assert_eq!(transport.provider(), ProviderId::Kraken);
        assert_eq!(transport.policy(), &policy);
        assert!(!transport.signal().is_cancelled());
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        let short = excerpt(&long);
        assert_eq!(short.len(), MAX_ERROR_BODY + 3);
        assert_eq!(excerpt("  {\"code\":-1121}  "), "{\"code\":-1121}");
    }
}
