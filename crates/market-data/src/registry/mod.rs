//! Provider registry module.
//!
//! This module provides orchestration for market data providers, including:
//! - Provider registration and preference ordering
//! - Sequential fallback for spot prices and candles
//! - Concurrent consensus across providers
//! - Attempt diagnostics for every resolution

mod diagnostics;
mod registry;

pub use diagnostics::AttemptLog;
pub use registry::ProviderRegistry;
