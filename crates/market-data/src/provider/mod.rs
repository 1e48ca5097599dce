//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - Provider capabilities
//! - The shared candidate probing loop and field parsers
//! - Concrete exchange adapters (Binance, Coinbase, Kraken, OKX)
//!
//! # Architecture
//!
//! Adapters are stateless and provider-agnostic code never names them: the
//! registry only sees `Arc<dyn MarketDataProvider>`. Each call receives a
//! freshly built [`Transport`](crate::transport::Transport) and asks the
//! resolver for its pair candidates, then walks them with
//! [`probe_candidates`].

mod capabilities;
mod parse;
mod probe;
mod traits;

pub mod binance;
pub mod coinbase;
pub mod kraken;
pub mod okx;

pub use capabilities::ProviderCapabilities;
pub use probe::probe_candidates;
pub use traits::MarketDataProvider;
