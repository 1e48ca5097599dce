use std::collections::HashSet;

use serde::Serialize;

use super::aliases::aliases_for;
use crate::models::{CanonicalAsset, ProviderId};

/// One concrete market identifier to try on a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairCandidate {
    pub provider: ProviderId,
    /// Base alias as the provider spells it.
    pub base: String,
    /// Quote alias as the provider spells it.
    pub quote: String,
    /// `base` followed by `quote`, no separator.
    pub symbol: String,
    /// Position in the probe order, 0 first.
    pub rank: usize,
}

impl PairCandidate {
    /// Base and quote joined with a provider-specific separator, e.g. `BTC-USD`.
    pub fn joined(&self, separator: &str) -> String {
        format!("{}{}{}", self.base, separator, self.quote)
    }
}

/// Every alias combination for a pair on `provider`, in probe order.
///
/// Base aliases iterate outer and quote aliases inner. Later duplicates of a
/// symbol are dropped.
pub fn candidates(
    provider: ProviderId,
    base: &CanonicalAsset,
    quote: &CanonicalAsset,
) -> Vec<PairCandidate> {
    cross(
        provider,
        &aliases_for(provider, base),
        &aliases_for(provider, quote),
    )
}

fn cross(
    provider: ProviderId,
    base_aliases: &[String],
    quote_aliases: &[String],
) -> Vec<PairCandidate> {
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(base_aliases.len() * quote_aliases.len());

    for b in base_aliases {
        for q in quote_aliases {
            let symbol = format!("{}{}", b, q);
            if !seen.insert(symbol.clone()) {
                continue;
            }
            result.push(PairCandidate {
                provider,
                base: b.clone(),
                quote: q.clone(),
                symbol,
                rank: result.len(),
            });
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::normalize;

    fn symbols(list: &[PairCandidate]) -> Vec<&str> {
        list.iter().map(|c| c.symbol.as_str()).collect()
    }

    #[test]
    fn test_kraken_btc_usd_order() {
        let list = candidates(ProviderId::Kraken, &normalize("BTC"), &normalize("USD"));
        assert_eq!(
            symbols(&list),
            vec!["XBTUSD", "XBTZUSD", "XXBTUSD", "XXBTZUSD"]
        );
        let ranks: Vec<_> = list.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_direct_symbol_provider_has_one_candidate() {
        let list = candidates(ProviderId::Okx, &normalize("btc"), &normalize("usdt"));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].symbol, "BTCUSDT");
        assert_eq!(list[0].joined("-"), "BTC-USDT");
    }

    #[test]
    fn test_duplicate_symbols_keep_first_occurrence() {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        // "AB"+"C" and "A"+"BC" both spell "ABC"
        let list = cross(
            ProviderId::Kraken,
            &owned(&["AB", "A"]),
            &owned(&["C", "BC"]),
        );
        assert_eq!(symbols(&list), vec!["ABC", "ABBC", "AC"]);
        assert_eq!(list[0].base, "AB");
        assert_eq!(list[2].rank, 2);
    }

    #[test]
    fn test_deterministic() {
        let a = candidates(ProviderId::Kraken, &normalize("eth"), &normalize("eur"));
        let b = candidates(ProviderId::Kraken, &normalize("eth"), &normalize("eur"));
        assert_eq!(a, b);
    }
}
