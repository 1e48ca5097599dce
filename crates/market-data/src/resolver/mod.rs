//! Symbol resolution for market data providers.
//!
//! Turns a canonical `(base, quote)` pair into the ordered list of market
//! identifiers a provider should be probed with.
//!
//! ```text
//! CanonicalAsset ──aliases_for──► ["XBT", "XXBT"]   (per provider)
//!                                      │
//!                                      ▼ base outer × quote inner
//!                              [XBTUSD, XBTZUSD, XXBTUSD, XXBTZUSD]
//! ```
//!
//! Most providers spell every asset canonically, so they get exactly one
//! candidate. Kraken keeps legacy codes and gets one candidate per alias
//! combination.

mod aliases;
mod candidates;

pub use aliases::{aliases_for, AliasTable, ALIASES};
pub use candidates::{candidates, PairCandidate};
