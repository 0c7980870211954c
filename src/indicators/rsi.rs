// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Seed average gain / average loss with the SMA of the first `period`
//          gains / losses.
// Step 3 — Apply Wilder's smoothing for every remaining delta:
//            avg = (prev_avg * (period - 1) + value) / period
// Step 4 — avg_loss == 0 => RSI = 100
//          otherwise RS = avg_gain / avg_loss, RSI = 100 - 100 / (1 + RS)
//
// Signal bands (checked in order):
//   >= 70 overbought, <= 30 oversold, 40..=50 bounce_zone, else neutral.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ensure_period, EngineError, EngineResult};
use crate::precision::round_display;

/// RSI band label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiSignal {
    Overbought,
    Oversold,
    BounceZone,
    Neutral,
}

impl RsiSignal {
    pub fn from_value(rsi: f64) -> Self {
        if rsi >= 70.0 {
            Self::Overbought
        } else if rsi <= 30.0 {
            Self::Oversold
        } else if (40.0..=50.0).contains(&rsi) {
            Self::BounceZone
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for RsiSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "overbought"),
            Self::Oversold => write!(f, "oversold"),
            Self::BounceZone => write!(f, "bounce_zone"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiResult {
    pub period: usize,
    pub data_points: usize,
    pub rsi: f64,
    pub signal: RsiSignal,
}

impl RsiResult {
    pub fn summary(&self) -> String {
        format!(
            "RSI({}) calculated from {} data points\nRSI: {:.2} | Signal: {}",
            self.period, self.data_points, self.rsi, self.signal
        )
    }
}

/// Compute the final RSI value for `prices` and `period`.
///
/// # Errors
/// - `InvalidParameter` when `period == 0`.
/// - `InsufficientData` when `prices.len() < period + 1`.
pub fn calculate_rsi(prices: &[f64], period: usize) -> EngineResult<f64> {
    ensure_period(period, "period")?;
    if prices.len() < period + 1 {
        return Err(EngineError::insufficient(period + 1, "prices"));
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = prices
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            if change > 0.0 {
                (change, 0.0)
            } else {
                (0.0, -change)
            }
        })
        .unzip();

    let period_f = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / period_f;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period_f;

    for (&gain, &loss) in gains[period..].iter().zip(&losses[period..]) {
        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;
    }

    trace!(avg_gain, avg_loss, "RSI averages");

    Ok(rsi_from_averages(avg_gain, avg_loss))
}

/// RSI value with its band label.
pub fn rsi_report(prices: &[f64], period: usize) -> EngineResult<RsiResult> {
    let rsi = calculate_rsi(prices, period)?;
    Ok(RsiResult {
        period,
        data_points: prices.len(),
        rsi: round_display(rsi),
        signal: RsiSignal::from_value(rsi),
    })
}

// =============================================================================
// Internal helpers
// =============================================================================

/// No losses at all means RSI = 100, never a division by zero.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_period_zero() {
        assert!(calculate_rsi(&[1.0, 2.0, 3.0], 0).is_err());
    }

    #[test]
    fn rsi_insufficient_data() {
        // Need period+1 closes. 14 closes => 13 deltas < 14.
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        let err = calculate_rsi(&closes, 14).unwrap_err();
        assert_eq!(err.kind(), "insufficient_data");
    }

    #[test]
    fn rsi_two_period_walkthrough() {
        // gains=[2,0,2] losses=[0,1,0]; seed 1 / 0.5; then 1.5 / 0.25 => RS 6.
        let rsi = calculate_rsi(&[10.0, 12.0, 11.0, 13.0], 2).unwrap();
        assert!((rsi - (100.0 - 100.0 / 7.0)).abs() < 1e-10);
        let report = rsi_report(&[10.0, 12.0, 11.0, 13.0], 2).unwrap();
        assert_eq!(report.rsi, 85.71);
        assert_eq!(report.signal, RsiSignal::Overbought);
    }

    #[test]
    fn rsi_all_gains() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        assert_eq!(calculate_rsi(&closes, 14).unwrap(), 100.0);
    }

    #[test]
    fn rsi_flat_market_is_100() {
        // No losses at all, so the zero-loss fallback applies.
        let closes = vec![100.0; 30];
        assert_eq!(calculate_rsi(&closes, 14).unwrap(), 100.0);
    }

    #[test]
    fn rsi_all_losses() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let rsi = calculate_rsi(&closes, 14).unwrap();
        assert!(rsi.abs() < 1e-10, "expected 0.0, got {rsi}");
    }

    #[test]
    fn rsi_range_check() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        let v = calculate_rsi(&closes, 14).unwrap();
        assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
    }

    #[test]
    fn signal_bands() {
        assert_eq!(RsiSignal::from_value(70.0), RsiSignal::Overbought);
        assert_eq!(RsiSignal::from_value(30.0), RsiSignal::Oversold);
        assert_eq!(RsiSignal::from_value(40.0), RsiSignal::BounceZone);
        assert_eq!(RsiSignal::from_value(50.0), RsiSignal::BounceZone);
        assert_eq!(RsiSignal::from_value(50.01), RsiSignal::Neutral);
        assert_eq!(RsiSignal::from_value(35.0), RsiSignal::Neutral);
    }

    #[test]
    fn signal_serialises_snake_case() {
        let json = serde_json::to_string(&RsiSignal::BounceZone).unwrap();
        assert_eq!(json, "\"bounce_zone\"");
    }
}
