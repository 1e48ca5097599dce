use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// Supported market data sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderId {
    Binance,
    Coinbase,
    Kraken,
    Okx,
}

impl ProviderId {
    /// Every provider, in the default fallback order.
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Binance,
        ProviderId::Coinbase,
        ProviderId::Kraken,
        ProviderId::Okx,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "BINANCE",
            Self::Coinbase => "COINBASE",
            Self::Kraken => "KRAKEN",
            Self::Okx => "OKX",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BINANCE" => Ok(Self::Binance),
            "COINBASE" => Ok(Self::Coinbase),
            "KRAKEN" => Ok(Self::Kraken),
            "OKX" => Ok(Self::Okx),
            other => Err(MarketDataError::validation(format!(
                "unknown provider '{}'",
                other
            ))),
        }
    }
}
