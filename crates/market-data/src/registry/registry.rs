//! Provider registry for orchestrating market data providers.
//!
//! The registry owns the adapters and runs the three resolution strategies:
//! - Fallback spot price: sequential, first success wins
//! - Consensus spot price: every provider concurrently, order statistics
//! - Candles: sequential fallback like spot
//!
//! Each provider invocation gets its own [`Transport`] built from the
//! request's policy and cancel signal, so retry budgets never leak between
//! providers.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use log::{debug, info, warn};

use super::diagnostics::AttemptLog;
use crate::consensus::consensus;
use crate::errors::{MarketDataError, RetryClass};
use crate::models::{
    CandleRequest, CandleSeries, ConsensusResult, ProviderId, Quote, QuoteContext, SpotResolution,
};
use crate::provider::binance::BinanceProvider;
use crate::provider::coinbase::CoinbaseProvider;
use crate::provider::kraken::KrakenProvider;
use crate::provider::okx::OkxProvider;
use crate::provider::MarketDataProvider;
use crate::transport::Transport;

/// Provider registry for orchestrating market data fetching.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn MarketDataProvider>>,
    default_order: Vec<ProviderId>,
}

impl ProviderRegistry {
    /// Create a registry. The default order is the registration order.
    pub fn new(providers: Vec<Arc<dyn MarketDataProvider>>) -> Self {
        let default_order = providers.iter().map(|p| p.id()).collect();
        Self {
            providers,
            default_order,
        }
    }

    /// Registry with every built-in exchange adapter, in the default order
    /// Binance, Coinbase, Kraken, OKX.
    pub fn builtin() -> Self {
        Self::new(vec![
            Arc::new(BinanceProvider::new()),
            Arc::new(CoinbaseProvider::new()),
            Arc::new(KrakenProvider::new()),
            Arc::new(OkxProvider::new()),
        ])
    }

    /// Replace the order used when a request names no providers.
    pub fn with_default_order(mut self, order: Vec<ProviderId>) -> Self {
        self.default_order = order;
        self
    }

    pub fn provider(&self, id: ProviderId) -> Option<&Arc<dyn MarketDataProvider>> {
        self.providers.iter().find(|p| p.id() == id)
    }

    /// Get the list of registered providers.
    pub fn providers(&self) -> &[Arc<dyn MarketDataProvider>] {
        &self.providers
    }

    pub fn default_order(&self) -> &[ProviderId] {
        &self.default_order
    }

    /// Resolve a preference list to adapters.
    ///
    /// An empty list means the default order. Repeated entries keep their
    /// first position. Naming an unregistered provider is a validation error.
    pub fn ordered_providers(
        &self,
        preference: &[ProviderId],
    ) -> Result<Vec<Arc<dyn MarketDataProvider>>, MarketDataError> {
        let order = if preference.is_empty() {
            &self.default_order
        } else {
            preference
        };

        let mut seen = Vec::with_capacity(order.len());
        let mut providers = Vec::with_capacity(order.len());

        for id in order {
            if seen.contains(id) {
                continue;
            }
            seen.push(*id);

            let provider = self.provider(*id).ok_or_else(|| {
                MarketDataError::validation(format!("provider {} is not registered", id))
            })?;
            providers.push(provider.clone());
        }

        if providers.is_empty() {
            return Err(MarketDataError::validation("no providers configured"));
        }

        Ok(providers)
    }

    /// Fetch a spot price, trying providers in preference order.
    ///
    /// The first success ends the walk; later providers are never contacted.
    /// Permanent and exhausted-transient failures are recorded and the next
    /// provider is tried. Validation errors and cancellation abort at once.
    pub async fn resolve_spot(
        &self,
        context: &QuoteContext,
    ) -> Result<SpotResolution, MarketDataError> {
        let providers = self.ordered_providers(&context.providers)?;
        let mut log = AttemptLog::new();

        for provider in providers {
            if context.signal.is_cancelled() {
                return Err(MarketDataError::Cancelled);
            }

            let provider_id = provider.id();
            debug!(
                "Fetching {}/{} from provider '{}'",
                context.base, context.quote, provider_id
            );

            match fetch_spot(provider.as_ref(), context).await {
                Ok(quote) => {
                    log.record_success(provider_id, Some(quote.price));
                    info!(
                        "Resolved {}/{} = {} via '{}' ({})",
                        context.base,
                        context.quote,
                        quote.price,
                        provider_id,
                        log.summary()
                    );
                    return Ok(SpotResolution {
                        selected_provider: provider_id,
                        price: quote.price,
                        timestamp: quote.timestamp,
                        quote,
                        attempts: log.into_attempts(),
                    });
                }
                Err(e) if e.retry_class() == RetryClass::Abort => {
                    info!("Terminal error from '{}': {}, not continuing", provider_id, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Provider '{}' failed: {}, trying next provider", provider_id, e);
                    log.record_error(provider_id, &e);
                }
            }
        }

        warn!(
            "All providers failed for {}/{}: {}",
            context.base,
            context.quote,
            log.summary()
        );
        Err(MarketDataError::AllProvidersFailed {
            attempts: log.into_attempts(),
        })
    }

    /// Query every provider concurrently and summarize the prices.
    ///
    /// All provider tasks are awaited before returning, whatever their
    /// outcome. At least one quote is required.
    pub async fn resolve_consensus(
        &self,
        context: &QuoteContext,
    ) -> Result<ConsensusResult, MarketDataError> {
        let providers = self.ordered_providers(&context.providers)?;
        let ids: Vec<ProviderId> = providers.iter().map(|p| p.id()).collect();

        let handles: Vec<_> = providers
            .into_iter()
            .map(|provider| {
                let context = context.clone();
                tokio::spawn(async move { fetch_spot(provider.as_ref(), &context).await })
            })
            .collect();

        let results = join_all(handles).await;

        let mut quotes: Vec<Quote> = Vec::new();
        let mut failures = AttemptLog::new();
        let mut abort: Option<MarketDataError> = None;

        for (provider_id, joined) in ids.into_iter().zip(results) {
            match joined {
                Ok(Ok(quote)) => quotes.push(quote),
                Ok(Err(e)) if e.retry_class() == RetryClass::Abort => {
                    // Cancellation outranks any other abort reason
                    if abort.is_none() || matches!(e, MarketDataError::Cancelled) {
                        abort = Some(e);
                    }
                }
                Ok(Err(e)) => {
                    warn!("Provider '{}' failed in consensus: {}", provider_id, e);
                    failures.record_error(provider_id, &e);
                }
                Err(join_error) => {
                    warn!("Provider '{}' task failed: {}", provider_id, join_error);
                    failures.record_message(
                        provider_id,
                        format!("Provider task failed: {}", join_error),
                    );
                }
            }
        }

        if context.signal.is_cancelled() {
            return Err(MarketDataError::Cancelled);
        }
        if let Some(e) = abort {
            return Err(e);
        }

        if quotes.is_empty() {
            warn!(
                "No quotes for {}/{}: {}",
                context.base,
                context.quote,
                failures.summary()
            );
            return Err(MarketDataError::NoQuotes {
                failures: failures.into_attempts(),
            });
        }

        let prices: Vec<f64> = quotes.iter().map(|q| q.price).collect();
        let summary = consensus(&prices)?;

        info!(
            "Consensus {}/{} from {} provider(s): median {}, spread {:.4}%",
            context.base,
            context.quote,
            quotes.len(),
            summary.median,
            summary.spread_percent
        );

        Ok(ConsensusResult {
            quotes,
            summary,
            failures: failures.into_attempts(),
            timestamp: Utc::now(),
        })
    }

    /// Fetch candles, trying providers in preference order.
    ///
    /// Providers without candle support or without the requested interval
    /// are recorded as failed attempts without a network call.
    pub async fn fetch_candles(
        &self,
        context: &QuoteContext,
        request: CandleRequest,
    ) -> Result<CandleSeries, MarketDataError> {
        let providers = self.ordered_providers(&context.providers)?;
        let mut log = AttemptLog::new();

        for provider in providers {
            if context.signal.is_cancelled() {
                return Err(MarketDataError::Cancelled);
            }

            let provider_id = provider.id();
            let capabilities = provider.capabilities();

            if !capabilities.supports_candles {
                debug!("Provider '{}' has no candles, skipping", provider_id);
                log.record_error(
                    provider_id,
                    &MarketDataError::UnsupportedInterval {
                        provider: provider_id,
                        interval: request.interval,
                    },
                );
                continue;
            }

            let provider_request = CandleRequest {
                interval: request.interval,
                limit: request.limit.clamp(1, capabilities.max_candle_limit.max(1)),
            };

            let result = match Transport::new(provider_id, &context.policy, &context.signal) {
                Ok(transport) => {
                    provider
                        .fetch_candles(
                            &transport,
                            &context.base,
                            &context.quote,
                            &provider_request,
                        )
                        .await
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(candles) => {
                    log.record_success(provider_id, candles.last().map(|c| c.close));
                    info!(
                        "Fetched {} {} candles for {}/{} from '{}'",
                        candles.len(),
                        request.interval,
                        context.base,
                        context.quote,
                        provider_id
                    );
                    return Ok(CandleSeries {
                        provider: provider_id,
                        interval: request.interval,
                        candles,
                        attempts: log.into_attempts(),
                    });
                }
                Err(e) if e.retry_class() == RetryClass::Abort => return Err(e),
                Err(e) => {
                    warn!("Provider '{}' candles failed: {}, trying next provider", provider_id, e);
                    log.record_error(provider_id, &e);
                }
            }
        }

        Err(MarketDataError::AllProvidersFailed {
            attempts: log.into_attempts(),
        })
    }
}

/// One provider's spot price over a transport built for this call.
async fn fetch_spot(
    provider: &dyn MarketDataProvider,
    context: &QuoteContext,
) -> Result<Quote, MarketDataError> {
    let transport = Transport::new(provider.id(), &context.policy, &context.signal)?;
    provider
        .fetch_spot_price(&transport, &context.base, &context.quote)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{normalize, Candle, CandleInterval, CanonicalAsset};
    use crate::provider::ProviderCapabilities;
    use crate::transport::CancelSignal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone, Copy)]
    enum Behavior {
        Price(f64),
        NotFound,
        Timeout,
        Invalid,
        /// Blocks until the transport's signal fires.
        Hang,
    }

    struct MockProvider {
        id: ProviderId,
        behavior: Behavior,
        supports_candles: bool,
        call_count: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: ProviderId, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                id,
                behavior,
                supports_candles: true,
                call_count: AtomicUsize::new(0),
            })
        }

        fn without_candles(id: ProviderId, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                id,
                behavior,
                supports_candles: false,
                call_count: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        async fn outcome(&self, transport: &Transport) -> Result<f64, MarketDataError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Price(price) => Ok(price),
                Behavior::NotFound => Err(MarketDataError::ProviderFailed {
                    provider: self.id,
                    tried: vec!["BTCUSD".to_string()],
                    message: "Symbol not found".to_string(),
                }),
                Behavior::Timeout => Err(MarketDataError::Timeout { provider: self.id }),
                Behavior::Invalid => Err(MarketDataError::validation("bad input")),
                Behavior::Hang => {
                    transport.signal().cancelled().await;
                    Err(MarketDataError::Cancelled)
                }
            }
        }
    }

    #[async_trait::async_trait]
    impl MarketDataProvider for MockProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                supports_candles: self.supports_candles,
                max_candle_limit: 100,
            }
        }

        async fn fetch_spot_price(
            &self,
            transport: &Transport,
            base: &CanonicalAsset,
            quote: &CanonicalAsset,
        ) -> Result<Quote, MarketDataError> {
            let price = self.outcome(transport).await?;
            Ok(Quote::new(
                self.id,
                base.clone(),
                quote.clone(),
                price,
                Utc::now(),
            ))
        }

        async fn fetch_candles(
            &self,
            transport: &Transport,
            _base: &CanonicalAsset,
            _quote: &CanonicalAsset,
            request: &CandleRequest,
        ) -> Result<Vec<Candle>, MarketDataError> {
            let price = self.outcome(transport).await?;
            let start = Utc::now() - request.interval.duration() * request.limit as i32;
            Ok((0..request.limit)
                .map(|i| {
                    let open_time = start + request.interval.duration() * i as i32;
                    Candle {
                        open_time,
                        close_time: request.interval.close_time_for(open_time),
                        open: price,
                        high: price,
                        low: price,
                        close: price,
                        volume: 1.0,
                    }
                })
                .collect())
        }
    }

    fn registry(providers: &[Arc<MockProvider>]) -> ProviderRegistry {
        ProviderRegistry::new(
            providers
                .iter()
                .map(|p| p.clone() as Arc<dyn MarketDataProvider>)
                .collect(),
        )
    }

    fn context() -> QuoteContext {
        QuoteContext::new(normalize("btc"), normalize("usd"))
    }

    #[tokio::test]
    async fn test_fallback_stops_at_first_success() {
        let binance = MockProvider::new(ProviderId::Binance, Behavior::NotFound);
        let coinbase = MockProvider::new(ProviderId::Coinbase, Behavior::Price(100.0));
        let kraken = MockProvider::new(ProviderId::Kraken, Behavior::Price(200.0));
        let registry = registry(&[binance.clone(), coinbase.clone(), kraken.clone()]);

        let resolution = registry.resolve_spot(&context()).await.unwrap();

        assert_eq!(resolution.selected_provider, ProviderId::Coinbase);
        assert_eq!(resolution.price, 100.0);
        assert_eq!(resolution.attempts.len(), 2);
        assert!(!resolution.attempts[0].success);
        assert_eq!(resolution.attempts[0].provider, ProviderId::Binance);
        assert!(resolution.attempts[1].success);
        assert_eq!(kraken.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_exhaustion_lists_every_attempt() {
        let binance = MockProvider::new(ProviderId::Binance, Behavior::Timeout);
        let okx = MockProvider::new(ProviderId::Okx, Behavior::NotFound);
        let registry = registry(&[binance, okx]);

        match registry.resolve_spot(&context()).await {
            Err(MarketDataError::AllProvidersFailed { attempts }) => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].provider, ProviderId::Binance);
                assert_eq!(attempts[1].provider, ProviderId::Okx);
                assert!(attempts.iter().all(|a| !a.success && a.error.is_some()));
            }
            other => panic!("Expected AllProvidersFailed, got {:?}", other.map(|r| r.price)),
        }
    }

    #[tokio::test]
    async fn test_preference_order_and_dedup() {
        let binance = MockProvider::new(ProviderId::Binance, Behavior::Price(1.0));
        let okx = MockProvider::new(ProviderId::Okx, Behavior::NotFound);
        let registry = registry(&[binance.clone(), okx.clone()]);

        let ctx = context().with_providers(vec![
            ProviderId::Okx,
            ProviderId::Okx,
            ProviderId::Binance,
        ]);
        let resolution = registry.resolve_spot(&ctx).await.unwrap();

        assert_eq!(resolution.selected_provider, ProviderId::Binance);
        assert_eq!(okx.calls(), 1);
        assert_eq!(resolution.attempts.len(), 2);
    }

    #[tokio::test]
    async fn test_unregistered_provider_is_rejected() {
        let registry = registry(&[MockProvider::new(ProviderId::Binance, Behavior::Price(1.0))]);
        let ctx = context().with_providers(vec![ProviderId::Kraken]);
        assert!(matches!(
            registry.resolve_spot(&ctx).await,
            Err(MarketDataError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_abort_error_stops_fallback() {
        let binance = MockProvider::new(ProviderId::Binance, Behavior::Invalid);
        let coinbase = MockProvider::new(ProviderId::Coinbase, Behavior::Price(1.0));
        let registry = registry(&[binance, coinbase.clone()]);

        assert!(matches!(
            registry.resolve_spot(&context()).await,
            Err(MarketDataError::Validation { .. })
        ));
        assert_eq!(coinbase.calls(), 0);
    }

    #[tokio::test]
    async fn test_consensus_summarizes_all_quotes() {
        let registry = registry(&[
            MockProvider::new(ProviderId::Binance, Behavior::Price(100.0)),
            MockProvider::new(ProviderId::Coinbase, Behavior::Price(110.0)),
            MockProvider::new(ProviderId::Kraken, Behavior::Price(105.0)),
        ]);

        let result = registry.resolve_consensus(&context()).await.unwrap();

        assert_eq!(result.quotes.len(), 3);
        assert_eq!(result.quotes[0].provider, ProviderId::Binance);
        assert_eq!(result.summary.median, 105.0);
        assert_eq!(result.summary.min, 100.0);
        assert_eq!(result.summary.max, 110.0);
        assert!((result.summary.spread_percent - 9.5238).abs() < 1e-3);
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn test_consensus_tolerates_partial_failure() {
        let failing = MockProvider::new(ProviderId::Okx, Behavior::Timeout);
        let registry = registry(&[
            MockProvider::new(ProviderId::Binance, Behavior::Price(50.0)),
            failing.clone(),
        ]);

        let result = registry.resolve_consensus(&context()).await.unwrap();

        assert_eq!(result.quotes.len(), 1);
        assert_eq!(result.summary.spread_percent, 0.0);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].provider, ProviderId::Okx);
        assert_eq!(failing.calls(), 1);
    }

    #[tokio::test]
    async fn test_consensus_without_quotes() {
        let registry = registry(&[
            MockProvider::new(ProviderId::Binance, Behavior::NotFound),
            MockProvider::new(ProviderId::Kraken, Behavior::Timeout),
        ]);

        match registry.resolve_consensus(&context()).await {
            Err(MarketDataError::NoQuotes { failures }) => assert_eq!(failures.len(), 2),
            other => panic!("Expected NoQuotes, got {:?}", other.map(|r| r.quotes.len())),
        }
    }

    #[tokio::test]
    async fn test_cancel_aborts_fallback() {
        let signal = CancelSignal::new();
        let registry = registry(&[
            MockProvider::new(ProviderId::Binance, Behavior::Hang),
            MockProvider::new(ProviderId::Coinbase, Behavior::Price(1.0)),
        ]);
        let ctx = context().with_signal(signal.clone());

        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(5), registry.resolve_spot(&ctx))
            .await
            .expect("cancel must end the resolution");
        assert!(matches!(result, Err(MarketDataError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_aborts_consensus() {
        let signal = CancelSignal::new();
        let registry = registry(&[
            MockProvider::new(ProviderId::Binance, Behavior::Price(1.0)),
            MockProvider::new(ProviderId::Okx, Behavior::Hang),
        ]);
        let ctx = context().with_signal(signal.clone());

        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(5), registry.resolve_consensus(&ctx))
            .await
            .expect("cancel must end the consensus");
        assert!(matches!(result, Err(MarketDataError::Cancelled)));
    }

    #[tokio::test]
    async fn test_candles_skip_providers_without_support() {
        let binance = MockProvider::without_candles(ProviderId::Binance, Behavior::Price(1.0));
        let coinbase = MockProvider::new(ProviderId::Coinbase, Behavior::Price(42.0));
        let registry = registry(&[binance.clone(), coinbase]);

        let request = CandleRequest {
            interval: CandleInterval::OneHour,
            limit: 5,
        };
        let series = registry.fetch_candles(&context(), request).await.unwrap();

        assert_eq!(series.provider, ProviderId::Coinbase);
        assert_eq!(series.candles.len(), 5);
        assert_eq!(series.attempts.len(), 2);
        assert!(!series.attempts[0].success);
        assert_eq!(series.attempts[1].price, Some(42.0));
        assert_eq!(binance.calls(), 0);
    }

    #[tokio::test]
    async fn test_candle_limit_clamped_to_provider_maximum() {
        let okx = MockProvider::new(ProviderId::Okx, Behavior::Price(7.0));
        let registry = registry(&[okx]);

        let request = CandleRequest {
            interval: CandleInterval::FiveMinutes,
            limit: 250,
        };
        let series = registry.fetch_candles(&context(), request).await.unwrap();

        // Mock capabilities cap a request at 100 rows
        assert_eq!(series.candles.len(), 100);
    }

    #[test]
    fn test_builtin_default_order() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(registry.default_order(), &ProviderId::ALL);
        assert!(registry.provider(ProviderId::Kraken).is_some());
    }
}
