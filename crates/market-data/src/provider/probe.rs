//! Shared candidate probing loop used by every adapter.

use std::future::Future;

use tracing::{debug, warn};

use crate::errors::{MarketDataError, RetryClass};
use crate::models::ProviderId;
use crate::resolver::PairCandidate;

/// Try `candidates` in order until one yields a value.
///
/// - `Abort` errors (cancellation, invalid input) return immediately.
/// - `Retry` errors reaching this point already exhausted the transport's
///   budget; probing stops and the error becomes
///   [`MarketDataError::ProviderFailed`] with the symbols tried so far.
/// - `NextProvider` errors move on to the next candidate.
///
/// When every candidate fails with a `NextProvider` error the result is
/// [`MarketDataError::ProviderFailed`] listing each tried symbol and the
/// last error message.
pub async fn probe_candidates<T, F, Fut>(
    provider: ProviderId,
    candidates: &[PairCandidate],
    mut probe: F,
) -> Result<T, MarketDataError>
where
    F: FnMut(PairCandidate) -> Fut,
    Fut: Future<Output = Result<T, MarketDataError>>,
{
    let mut tried = Vec::with_capacity(candidates.len());
    let mut last_message = String::from("no candidates");

    for candidate in candidates {
        tried.push(candidate.symbol.clone());

        let error = match probe(candidate.clone()).await {
            Ok(value) => {
                if candidate.rank > 0 {
                    debug!(
                        "{} resolved {} after {} rejected candidate(s)",
                        provider, candidate.symbol, candidate.rank
                    );
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        match error.retry_class() {
            RetryClass::Abort => return Err(error),
            RetryClass::Retry => {
                warn!(
                    "{} gave up on {} after transient failure: {}",
                    provider, candidate.symbol, error
                );
                return Err(MarketDataError::ProviderFailed {
                    provider,
                    tried,
                    message: error.to_string(),
                });
            }
            RetryClass::NextProvider => {
                debug!("{} rejected {}: {}", provider, candidate.symbol, error);
                last_message = error.to_string();
            }
        }
    }

    Err(MarketDataError::ProviderFailed {
        provider,
        tried,
        message: last_message,
    })
}
