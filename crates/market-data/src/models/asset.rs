use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Provider-agnostic ticker symbol.
///
/// Always uppercase ASCII letters and digits. The only way to build one is
/// [`normalize`], so every value in circulation is already canonical.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalAsset(Arc<str>);

impl CanonicalAsset {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CanonicalAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalAsset {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalize a ticker: uppercase, then drop everything outside `[A-Z0-9]`.
///
/// Total and idempotent. An empty result is possible (e.g. `"--"`); callers
/// reject it during request validation.
pub fn normalize(ticker: &str) -> CanonicalAsset {
    let normalized: String = ticker
        .chars()
        .flat_map(char::to_uppercase)
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect();
    CanonicalAsset(Arc::from(normalized))
}
