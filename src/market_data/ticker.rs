// =============================================================================
// Ticker Snapshot & Bid/Ask Spread
// =============================================================================
//
//   mid            = (bid + ask) / 2
//   spread         = ask - bid
//   spread_percent = spread / mid * 100
//
// Bid and ask are rounded to 8 places before use; the percentage to 2.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::precision::{round_display, round_raw};

/// Point-in-time market ticker supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    #[serde(default)]
    pub last: f64,
    #[serde(default)]
    pub highest_bid: f64,
    #[serde(default)]
    pub lowest_ask: f64,
    #[serde(default)]
    pub base_volume: f64,
    #[serde(default)]
    pub percent_change: f64,
    #[serde(default)]
    pub high_24h: f64,
    #[serde(default)]
    pub low_24h: f64,
}

/// Bid/ask spread figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadResult {
    pub bid: f64,
    pub ask: f64,
    pub mid: f64,
    pub spread: f64,
    pub spread_percent: f64,
}

impl SpreadResult {
    pub fn summary(&self) -> String {
        let mut out = format!("Bid: {:.2}\n", self.bid);
        out += &format!("Ask: {:.2}\n", self.ask);
        out += &format!("Mid: {:.2}\n", self.mid);
        out += &format!("Spread: {:.2} ({:.4}%)", self.spread, self.spread_percent);
        out
    }
}

/// Compute the spread from a best bid / best ask pair.
///
/// # Errors
/// `InvalidParameter` when either side is not a positive number.
pub fn calculate_spread(bid: f64, ask: f64) -> EngineResult<SpreadResult> {
    let bid = round_raw(bid);
    let ask = round_raw(ask);

    if !(bid > 0.0 && ask > 0.0) || !bid.is_finite() || !ask.is_finite() {
        return Err(EngineError::InvalidParameter(
            "invalid bid/ask prices: both must be positive".into(),
        ));
    }

    let mid = round_raw((bid + ask) / 2.0);
    let spread = round_raw(ask - bid);
    let spread_percent = round_display(spread / mid * 100.0);

    Ok(SpreadResult {
        bid,
        ask,
        mid,
        spread,
        spread_percent,
    })
}

impl TickerSnapshot {
    /// Spread of this ticker's best bid / best ask.
    pub fn spread(&self) -> EngineResult<SpreadResult> {
        calculate_spread(self.highest_bid, self.lowest_ask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_basic() {
        let s = calculate_spread(99.0, 101.0).unwrap();
        assert_eq!(s.mid, 100.0);
        assert_eq!(s.spread, 2.0);
        assert_eq!(s.spread_percent, 2.0);
    }

    #[test]
    fn spread_rejects_non_positive() {
        assert_eq!(
            calculate_spread(0.0, 101.0).unwrap_err().kind(),
            "invalid_parameter"
        );
        assert!(calculate_spread(99.0, -1.0).is_err());
        assert!(calculate_spread(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn ticker_spread_uses_best_quotes() {
        let t = TickerSnapshot {
            highest_bid: 1_000_000.0,
            lowest_ask: 1_001_000.0,
            ..Default::default()
        };
        let s = t.spread().unwrap();
        assert_eq!(s.spread, 1000.0);
        assert_eq!(s.spread_percent, 0.1);
    }
}
