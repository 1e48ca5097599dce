//! Provider-specific spellings of canonical assets.

use crate::models::{CanonicalAsset, ProviderId};

type AliasEntries = &'static [(&'static str, &'static [&'static str])];

/// Kraken's legacy asset codes. The first alias is tried first.
const KRAKEN_ALIASES: AliasEntries = &[
    ("BTC", &["XBT", "XXBT"]),
    ("DOGE", &["XDG", "XXDG"]),
    ("ETH", &["ETH", "XETH"]),
    ("LTC", &["LTC", "XLTC"]),
    ("XRP", &["XRP", "XXRP"]),
    ("XLM", &["XLM", "XXLM"]),
    ("ETC", &["ETC", "XETC"]),
    ("XMR", &["XMR", "XXMR"]),
    ("ZEC", &["ZEC", "XZEC"]),
    ("MLN", &["MLN", "XMLN"]),
    ("REP", &["REP", "XREP"]),
    ("USD", &["USD", "ZUSD"]),
    ("EUR", &["EUR", "ZEUR"]),
    ("GBP", &["GBP", "ZGBP"]),
    ("JPY", &["JPY", "ZJPY"]),
    ("CAD", &["CAD", "ZCAD"]),
    ("AUD", &["AUD", "ZAUD"]),
];

/// Static alias table keyed by provider.
///
/// Providers without an entry use the canonical ticker unchanged.
pub struct AliasTable {
    tables: &'static [(ProviderId, AliasEntries)],
}

/// The built-in table.
pub static ALIASES: AliasTable = AliasTable {
    tables: &[(ProviderId::Kraken, KRAKEN_ALIASES)],
};

impl AliasTable {
    /// Ordered spellings of `asset` on `provider`. Never empty.
    pub fn aliases_for(&self, provider: ProviderId, asset: &CanonicalAsset) -> Vec<String> {
        self.entries(provider)
            .and_then(|entries| {
                entries
                    .iter()
                    .find(|(canonical, _)| *canonical == asset.as_str())
            })
            .map(|(_, aliases)| aliases.iter().map(|a| a.to_string()).collect())
            .unwrap_or_else(|| vec![asset.to_string()])
    }

    fn entries(&self, provider: ProviderId) -> Option<AliasEntries> {
        self.tables
            .iter()
            .find(|(id, _)| *id == provider)
            .map(|(_, entries)| *entries)
    }
}

/// Ordered spellings of `asset` on `provider`, from the built-in table.
pub fn aliases_for(provider: ProviderId, asset: &CanonicalAsset) -> Vec<String> {
    ALIASES.aliases_for(provider, asset)
}
