//! HTTP plumbing shared by every provider adapter.
//!
//! A [`Transport`] is built per provider call from that call's
//! [`RequestPolicy`] and [`CancelSignal`]. It owns the retry loop, maps HTTP
//! failures onto [`MarketDataError`](crate::errors::MarketDataError) variants,
//! and stops as soon as the signal fires.

mod cancel;
mod client;
mod policy;

pub use cancel::CancelSignal;
pub use client::{with_retry, Transport};
pub use policy::{RequestPolicy, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_MS};
