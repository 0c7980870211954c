// =============================================================================
// Breakout Detector
// =============================================================================
//
// A breakout is the current close clearing the highest high of the N candles
// before it, on volume at least `volume_threshold` times their average.
//
//   prior_high   = max(high)   over candles[len-1-N .. len-1]
//   avg_volume   = mean(volume) over the same window
//   volume_ratio = current_volume / avg_volume   (0 when avg_volume == 0)
//
//   BREAKOUT_BUY  <=>  closes_above_prior_high AND volume_confirms
//
// Suggested entry sits 0.1% above the close; the stop sits ATR(14) times
// `atr_multiplier` below it.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SignalAction;
use crate::error::{EngineError, EngineResult};
use crate::indicators::atr::{calculate_atr, DEFAULT_ATR_PERIOD};
use crate::market_data::Candle;
use crate::precision::round_display;

/// Entry is placed just above the breakout close.
const ENTRY_BUFFER: f64 = 1.001;

/// Tunables for [`detect_breakout`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutParams {
    pub lookback: usize,
    pub volume_threshold: f64,
    pub atr_multiplier: f64,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        Self {
            lookback: 20,
            volume_threshold: 1.5,
            atr_multiplier: 1.5,
        }
    }
}

impl BreakoutParams {
    pub(crate) fn validate(&self) -> EngineResult<()> {
        if self.lookback < 1 {
            return Err(EngineError::InvalidParameter(
                "lookback must be greater than 0".into(),
            ));
        }
        if !self.volume_threshold.is_finite() || self.volume_threshold <= 0.0 {
            return Err(EngineError::InvalidParameter(
                "volume_threshold must be a positive number".into(),
            ));
        }
        if !self.atr_multiplier.is_finite() || self.atr_multiplier < 0.0 {
            return Err(EngineError::InvalidParameter(
                "atr_multiplier must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutResult {
    pub signal: SignalAction,
    pub current_price: f64,
    pub prior_high: f64,
    pub current_volume: f64,
    pub avg_volume: f64,
    pub volume_ratio: f64,
    pub suggested_entry: f64,
    /// Absent when the series is too short for ATR(14).
    pub suggested_stop: Option<f64>,
    pub lookback: usize,
}

impl BreakoutResult {
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Breakout Signal Detection (lookback: {})\nSignal: {}\n\nCurrent Price: {:.2} | High({}): {:.2}\nVolume Ratio: {:.2}x (Current: {:.2} | Avg: {:.2})",
            self.lookback,
            self.signal,
            self.current_price,
            self.lookback,
            self.prior_high,
            self.volume_ratio,
            self.current_volume,
            self.avg_volume
        );

        if self.signal == SignalAction::BreakoutBuy {
            out.push_str("\n\nBREAKOUT CONFIRMED");
            out.push_str(&format!("\nSuggested Entry: {:.2}", self.suggested_entry));
            match self.suggested_stop {
                Some(stop) if self.suggested_entry > 0.0 => out.push_str(&format!(
                    "\nSuggested Stop: {:.2} ({:.2}% below entry)",
                    stop,
                    (self.suggested_entry - stop) / self.suggested_entry * 100.0
                )),
                _ => out.push_str(&format!(
                    "\nSuggested Stop: n/a (needs {} candles for ATR)",
                    DEFAULT_ATR_PERIOD + 1
                )),
            }
        }
        out
    }
}

// =============================================================================
// Predicates
// =============================================================================

/// Current close strictly above the prior window's highest high.
pub fn closes_above_prior_high(close: f64, prior_high: f64) -> bool {
    close > prior_high
}

/// Current volume is at least `threshold` times the window average.
pub fn volume_confirms(volume_ratio: f64, threshold: f64) -> bool {
    volume_ratio >= threshold
}

// =============================================================================
// Detection
// =============================================================================

/// Evaluate the breakout rule on the last candle of `candles`.
///
/// # Errors
/// - `InvalidParameter` for a zero lookback, a non-positive volume threshold
///   or a negative ATR multiplier.
/// - `InsufficientData` with fewer than `lookback + 1` candles.
pub fn detect_breakout(candles: &[Candle], params: &BreakoutParams) -> EngineResult<BreakoutResult> {
    params.validate()?;
    let n = params.lookback;
    if candles.len() < n + 1 {
        return Err(EngineError::insufficient(n + 1, "candles"));
    }

    let last = candles.len() - 1;
    let current = candles[last];
    let window = &candles[last - n..last];

    let prior_high = window.iter().map(|c| c.high).fold(0.0_f64, f64::max);
    let avg_volume = window.iter().map(Candle::volume_or_zero).sum::<f64>() / n as f64;
    let current_volume = current.volume_or_zero();
    let volume_ratio = if avg_volume > 0.0 {
        current_volume / avg_volume
    } else {
        0.0
    };

    let is_breakout = closes_above_prior_high(current.close, prior_high)
        && volume_confirms(volume_ratio, params.volume_threshold);
    let signal = if is_breakout {
        SignalAction::BreakoutBuy
    } else {
        SignalAction::NoSignal
    };

    // The stop is advisory; a short series still gets a signal.
    let suggested_stop = calculate_atr(candles, DEFAULT_ATR_PERIOD)
        .ok()
        .map(|atr| round_display(current.close - atr * params.atr_multiplier));

    debug!(
        %signal,
        close = current.close,
        prior_high,
        volume_ratio,
        "Breakout evaluated"
    );

    Ok(BreakoutResult {
        signal,
        current_price: round_display(current.close),
        prior_high: round_display(prior_high),
        current_volume: round_display(current_volume),
        avg_volume: round_display(avg_volume),
        volume_ratio: round_display(volume_ratio),
        suggested_entry: round_display(current.close * ENTRY_BUFFER),
        suggested_stop,
        lookback: n,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    /// `count` quiet candles around 100 with volume 10, then one final bar.
    fn series(count: usize, last: Candle) -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..count)
            .map(|_| Candle::new(101.0, 99.0, 100.0).with_volume(10.0))
            .collect();
        candles.push(last);
        candles
    }

    #[test]
    fn predicates() {
        assert!(closes_above_prior_high(101.0, 100.0));
        assert!(!closes_above_prior_high(100.0, 100.0));
        assert!(volume_confirms(1.5, 1.5));
        assert!(!volume_confirms(1.49, 1.5));
    }

    #[test]
    fn breakout_on_volume() {
        let candles = series(20, Candle::new(106.0, 100.0, 104.0).with_volume(20.0));
        let r = detect_breakout(&candles, &BreakoutParams::default()).unwrap();
        assert_eq!(r.signal, SignalAction::BreakoutBuy);
        assert_eq!(r.prior_high, 101.0);
        assert_eq!(r.avg_volume, 10.0);
        assert_eq!(r.volume_ratio, 2.0);
        assert_eq!(r.suggested_entry, 104.1);
        // ATR(14): seed 2.0, then one bar with TR 6 => 2 + 4/14.
        let stop = r.suggested_stop.unwrap();
        assert_eq!(stop, round_display(104.0 - (2.0 + 4.0 / 14.0) * 1.5));
    }

    #[test]
    fn new_high_without_volume_is_no_signal() {
        let candles = series(20, Candle::new(106.0, 100.0, 105.0).with_volume(12.0));
        let r = detect_breakout(&candles, &BreakoutParams::default()).unwrap();
        assert_eq!(r.signal, SignalAction::NoSignal);
        assert_eq!(r.volume_ratio, 1.2);
    }

    #[test]
    fn volume_without_new_high_is_no_signal() {
        let candles = series(20, Candle::new(101.0, 99.0, 100.5).with_volume(50.0));
        let r = detect_breakout(&candles, &BreakoutParams::default()).unwrap();
        assert_eq!(r.signal, SignalAction::NoSignal);
    }

    #[test]
    fn window_excludes_current_and_older_candles() {
        // An old spike outside the 3-bar window must not count.
        let mut candles = vec![Candle::new(500.0, 90.0, 100.0).with_volume(10.0)];
        candles.extend(series(3, Candle::new(103.0, 100.0, 102.0).with_volume(30.0)));
        let params = BreakoutParams {
            lookback: 3,
            ..BreakoutParams::default()
        };
        let r = detect_breakout(&candles, &params).unwrap();
        assert_eq!(r.prior_high, 101.0);
        assert_eq!(r.signal, SignalAction::BreakoutBuy);
    }

    #[test]
    fn missing_volume_gives_zero_ratio() {
        let mut candles: Vec<Candle> = (0..20).map(|_| Candle::new(101.0, 99.0, 100.0)).collect();
        candles.push(Candle::new(106.0, 100.0, 105.0));
        let r = detect_breakout(&candles, &BreakoutParams::default()).unwrap();
        assert_eq!(r.volume_ratio, 0.0);
        assert_eq!(r.signal, SignalAction::NoSignal);
    }

    #[test]
    fn short_series_has_no_stop() {
        let candles = series(5, Candle::new(106.0, 100.0, 105.0).with_volume(20.0));
        let params = BreakoutParams {
            lookback: 5,
            ..BreakoutParams::default()
        };
        let r = detect_breakout(&candles, &params).unwrap();
        assert_eq!(r.signal, SignalAction::BreakoutBuy);
        assert!(r.suggested_stop.is_none());
        assert!(r.summary().contains("n/a"));
    }

    #[test]
    fn insufficient_candles() {
        let candles = series(19, Candle::new(106.0, 100.0, 105.0));
        let err = detect_breakout(&candles, &BreakoutParams::default()).unwrap_err();
        assert_eq!(err.kind(), "insufficient_data");
    }

    #[test]
    fn invalid_params() {
        let candles = series(20, Candle::new(106.0, 100.0, 105.0));
        let zero = BreakoutParams {
            lookback: 0,
            ..BreakoutParams::default()
        };
        assert!(detect_breakout(&candles, &zero).is_err());
        let negative = BreakoutParams {
            atr_multiplier: -1.0,
            ..BreakoutParams::default()
        };
        assert!(detect_breakout(&candles, &negative).is_err());
    }
}
