// =============================================================================
// Average True Range (ATR)
// =============================================================================
//
// True Range (TR) for each bar:
//   TR_0 = H - L
//   TR_i = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR seeds from the mean of TR_1 ..= TR_period.  TR_0 has no previous close
// and is left out of the seed window.  Every later bar is folded in with
// multiplier m = 1 / period:
//   ATR_t = ATR_{t-1} * (1 - m) + TR_t * m
//
// Default period: 14
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_period, EngineError, EngineResult};
use crate::market_data::Candle;
use crate::precision::round_display;

/// Period used when a caller needs "the" ATR (breakout stops, defaults).
pub const DEFAULT_ATR_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtrResult {
    pub period: usize,
    pub data_points: usize,
    pub atr: f64,
    pub atr_percent: f64,
    pub current_price: f64,
}

impl AtrResult {
    pub fn summary(&self) -> String {
        format!(
            "ATR({}) calculated from {} candles\nATR: {:.2} | ATR%: {:.2}% | Current Price: {:.2}",
            self.period, self.data_points, self.atr, self.atr_percent, self.current_price
        )
    }
}

/// True range of every candle; index 0 is simply high - low.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let hl = c.high - c.low;
            if i == 0 {
                return hl;
            }
            let prev_close = candles[i - 1].close;
            hl.max((c.high - prev_close).abs())
                .max((c.low - prev_close).abs())
        })
        .collect()
}

/// Smooth a true-range series into a single ATR figure.
///
/// # Errors
/// - `InvalidParameter` when `period == 0`.
/// - `InsufficientData` when there are fewer than `period + 1` true ranges.
pub fn atr_from_true_ranges(true_ranges: &[f64], period: usize) -> EngineResult<f64> {
    ensure_period(period, "period")?;
    if true_ranges.len() < period + 1 {
        return Err(EngineError::insufficient(period + 1, "candles"));
    }

    let seed = true_ranges[1..=period].iter().sum::<f64>() / period as f64;

    let m = 1.0 / period as f64;
    let atr = true_ranges[period + 1..]
        .iter()
        .fold(seed, |atr, &tr| atr * (1.0 - m) + tr * m);

    Ok(atr)
}

/// Compute the most recent ATR value from a slice of candles (oldest first).
pub fn calculate_atr(candles: &[Candle], period: usize) -> EngineResult<f64> {
    atr_from_true_ranges(&true_ranges(candles), period)
}

/// ATR together with its size relative to the last close.
///
/// # Errors
/// As [`calculate_atr`], plus `InvalidParameter` when the last close is zero.
pub fn atr_report(candles: &[Candle], period: usize) -> EngineResult<AtrResult> {
    let atr = calculate_atr(candles, period)?;
    // calculate_atr guarantees at least period + 1 candles.
    let current_price = candles[candles.len() - 1].close;
    if current_price == 0.0 {
        return Err(EngineError::InvalidParameter(
            "last close is zero; ATR percent is undefined".into(),
        ));
    }
    let atr_percent = atr / current_price * 100.0;

    debug!(period, atr, atr_percent, "ATR computed");

    Ok(AtrResult {
        period,
        data_points: candles.len(),
        atr: round_display(atr),
        atr_percent: round_display(atr_percent),
        current_price: round_display(current_price),
    })
}
