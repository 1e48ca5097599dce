//! Order statistics over independently sourced prices.

use crate::errors::MarketDataError;
use crate::models::ConsensusSummary;

/// Median, extremes and relative spread of `prices`.
///
/// The median of an even-sized set is the mean of the two central values.
/// `spread_percent` is `(max - min) / median * 100`, and exactly 0 when the
/// median is 0.
pub fn consensus(prices: &[f64]) -> Result<ConsensusSummary, MarketDataError> {
    if prices.is_empty() {
        return Err(MarketDataError::validation(
            "consensus requires at least one price",
        ));
    }
    if let Some(bad) = prices.iter().find(|p| !p.is_finite()) {
        return Err(MarketDataError::validation(format!(
            "consensus prices must be finite, got {}",
            bad
        )));
    }

    let mut sorted = prices.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    let min = sorted[0];
    let max = sorted[n - 1];

    let spread_percent = if median == 0.0 {
        0.0
    } else {
        (max - min) / median * 100.0
    };

    Ok(ConsensusSummary {
        median,
        min,
        max,
        spread_percent,
    })
}
