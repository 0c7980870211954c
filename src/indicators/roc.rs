// =============================================================================
// Rate of Change (ROC) — Momentum Indicator
// =============================================================================
//
// ROC measures the percentage change in price over a look-back period:
//   ROC = ((close - close_n) / close_n) * 100
//
// Positive ROC indicates upward momentum; negative indicates downward.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_period, EngineError, EngineResult};
use crate::precision::round_display;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocResult {
    pub period: usize,
    pub data_points: usize,
    pub roc: f64,
    pub price_now: f64,
    pub price_then: f64,
}

impl RocResult {
    pub fn summary(&self) -> String {
        format!(
            "ROC({}) calculated from {} data points\nPrice Now: {:.2} | Price {} periods ago: {:.2} | ROC: {:.2}%",
            self.period, self.data_points, self.price_now, self.period, self.price_then, self.roc
        )
    }
}

/// Calculate the most recent Rate of Change for `prices` and `period`.
///
/// # Errors
/// - `InvalidParameter` when `period == 0` or the reference price is zero.
/// - `InsufficientData` when `prices.len() <= period`.
pub fn calculate_roc(prices: &[f64], period: usize) -> EngineResult<f64> {
    ensure_period(period, "period")?;
    if prices.len() <= period {
        return Err(EngineError::insufficient(period + 1, "prices"));
    }

    let last = prices.len() - 1;
    let price_now = prices[last];
    let price_then = prices[last - period];
    if price_then == 0.0 {
        return Err(EngineError::InvalidParameter(format!(
            "price {period} periods ago is zero; rate of change is undefined"
        )));
    }

    Ok((price_now - price_then) / price_then * 100.0)
}

/// ROC together with the two prices it was derived from.
pub fn roc_report(prices: &[f64], period: usize) -> EngineResult<RocResult> {
    let roc = calculate_roc(prices, period)?;
    let last = prices.len() - 1;

    Ok(RocResult {
        period,
        data_points: prices.len(),
        roc: round_display(roc),
        price_now: round_display(prices[last]),
        price_then: round_display(prices[last - period]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roc_basic() {
        let closes: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        // From 1 to 15: ROC = (15-1)/1 * 100 = 1400%
        let roc = calculate_roc(&closes, 14).unwrap();
        assert!((roc - 1400.0).abs() < 1e-10);
    }

    #[test]
    fn roc_uses_last_price() {
        let roc = calculate_roc(&[50.0, 100.0, 80.0, 110.0], 2).unwrap();
        assert!((roc - 10.0).abs() < 1e-10);
    }

    #[test]
    fn roc_insufficient_data() {
        let err = calculate_roc(&[1.0, 2.0, 3.0], 3).unwrap_err();
        assert_eq!(err.kind(), "insufficient_data");
    }

    #[test]
    fn roc_zero_base_is_invalid() {
        let err = calculate_roc(&[0.0, 1.0, 2.0], 2).unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");
    }

    #[test]
    fn report_rounds_to_two_places() {
        let r = roc_report(&[3.0, 4.0, 4.0, 4.0], 3).unwrap();
        assert_eq!(r.roc, 33.33);
        assert_eq!(r.price_then, 3.0);
        assert_eq!(r.data_points, 4);
    }
}
