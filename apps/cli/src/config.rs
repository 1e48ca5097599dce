use std::str::FromStr;

use spotline_market_data::{EngineConfig, ProviderId, RequestPolicy};
use tracing::warn;

use crate::cli::Cli;

/// Settings from the environment (and `.env`), before flag overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub policy: RequestPolicy,
    pub providers: Vec<ProviderId>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = RequestPolicy::default();
        let policy = RequestPolicy {
            timeout_ms: parse_or_default(
                "SPOTLINE_TIMEOUT_MS",
                lookup("SPOTLINE_TIMEOUT_MS"),
                defaults.timeout_ms,
            ),
            retries: parse_or_default(
                "SPOTLINE_RETRIES",
                lookup("SPOTLINE_RETRIES"),
                defaults.retries,
            ),
            retry_delay_ms: parse_or_default(
                "SPOTLINE_RETRY_DELAY_MS",
                lookup("SPOTLINE_RETRY_DELAY_MS"),
                defaults.retry_delay_ms,
            ),
        };
        let providers = lookup("SPOTLINE_PROVIDERS")
            .map(|raw| parse_providers(&raw))
            .unwrap_or_default();

        Self { policy, providers }
    }

    /// Apply command-line flags on top of the environment.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(timeout_ms) = cli.timeout_ms {
            self.policy.timeout_ms = timeout_ms;
        }
        if let Some(retries) = cli.retries {
            self.policy.retries = retries;
        }
        if let Some(retry_delay_ms) = cli.retry_delay_ms {
            self.policy.retry_delay_ms = retry_delay_ms;
        }
        if !cli.providers.is_empty() {
            self.providers = cli.providers.clone();
        }
        self
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            policy: self.policy.clone(),
            default_providers: self.providers.clone(),
        }
    }
}

fn parse_or_default<T: FromStr + Copy>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {}={:?}, using default", name, raw);
            default
        }),
        None => default,
    }
}

/// Comma-separated provider names. Unknown names are dropped with a warning.
fn parse_providers(raw: &str) -> Vec<ProviderId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|name| match name.parse() {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Ignoring SPOTLINE_PROVIDERS entry: {}", e);
                None
            }
        })
        .collect()
}
