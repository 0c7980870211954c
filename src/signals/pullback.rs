// =============================================================================
// Pullback Detector
// =============================================================================
//
// A pullback entry needs three things at once on the last candle:
//
//   near_ema        |close - EMA| / EMA * 100 <= 2.0
//   rsi_bounce      rsi_min <= RSI <= rsi_max
//   reversal_bar    current bar closes in the top 30% of its range AND the
//                   previous bar closed below the midpoint of its range
//
//   PULLBACK_BUY  <=>  near_ema AND rsi_bounce AND reversal_bar
//
// Entry sits 0.1% above the reversal bar's high, the stop 0.1% below the
// lowest low of the last 10 candles.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SignalAction;
use crate::error::{ensure_period, EngineError, EngineResult};
use crate::indicators::{calculate_rsi, ema::current_ema};
use crate::market_data::{candle::closes, Candle};
use crate::precision::round_display;

/// Maximum distance from the EMA, in percent, that still counts as "near".
pub const NEAR_EMA_PERCENT: f64 = 2.0;
/// Candles (including the current one) scanned for the swing low.
pub const SWING_LOW_WINDOW: usize = 10;
/// Extra candles required beyond the longer indicator period.
const WARMUP_MARGIN: usize = 5;

const ENTRY_BUFFER: f64 = 1.001;
const STOP_BUFFER: f64 = 0.999;

/// Tunables for [`detect_pullback`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullbackParams {
    pub ema_period: usize,
    pub rsi_period: usize,
    pub rsi_min: f64,
    pub rsi_max: f64,
}

impl Default for PullbackParams {
    fn default() -> Self {
        Self {
            ema_period: 20,
            rsi_period: 14,
            rsi_min: 40.0,
            rsi_max: 50.0,
        }
    }
}

impl PullbackParams {
    /// Minimum candle count for this configuration.
    pub fn required_candles(&self) -> usize {
        self.ema_period.max(self.rsi_period) + WARMUP_MARGIN
    }

    pub(crate) fn validate(&self) -> EngineResult<()> {
        ensure_period(self.ema_period, "ema_period")?;
        ensure_period(self.rsi_period, "rsi_period")?;
        if !(self.rsi_min.is_finite() && self.rsi_max.is_finite()) || self.rsi_min > self.rsi_max {
            return Err(EngineError::InvalidParameter(format!(
                "rsi band {}..{} is not a valid range",
                self.rsi_min, self.rsi_max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullbackResult {
    pub signal: SignalAction,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub current_price: f64,
    pub ema: f64,
    pub rsi: f64,
    pub price_to_ema_percent: f64,
    pub near_ema: bool,
    pub rsi_in_bounce_zone: bool,
    pub has_reversal_bar: bool,
    pub reversal_bar_close: f64,
    pub reversal_bar_high: f64,
    pub suggested_entry: f64,
    pub suggested_stop: f64,
    pub swing_low: f64,
}

impl PullbackResult {
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Pullback Signal Detection (EMA{}, RSI{})\nSignal: {}\n\nCurrent Price: {:.2} | EMA{}: {:.2} ({:.2}% from EMA)\nRSI: {:.2} | In Bounce Zone: {}\nReversal Bar: {}",
            self.ema_period,
            self.rsi_period,
            self.signal,
            self.current_price,
            self.ema_period,
            self.ema,
            self.price_to_ema_percent,
            self.rsi,
            self.rsi_in_bounce_zone,
            self.has_reversal_bar
        );

        if self.signal == SignalAction::PullbackBuy {
            out.push_str("\n\nPULLBACK CONFIRMED");
            out.push_str(&format!(
                "\nSuggested Entry: {:.2} (above reversal high)\nSuggested Stop: {:.2} (below swing low {:.2})",
                self.suggested_entry, self.suggested_stop, self.swing_low
            ));
            if self.suggested_entry > 0.0 {
                out.push_str(&format!(
                    "\nRisk: {:.2}%",
                    (self.suggested_entry - self.suggested_stop) / self.suggested_entry * 100.0
                ));
            }
        }
        out
    }
}

// =============================================================================
// Predicates
// =============================================================================

/// Close within [`NEAR_EMA_PERCENT`] of the EMA, either side.
pub fn is_near_ema(price_to_ema_percent: f64) -> bool {
    price_to_ema_percent.abs() <= NEAR_EMA_PERCENT
}

/// RSI inside the inclusive bounce band.
pub fn in_bounce_zone(rsi: f64, rsi_min: f64, rsi_max: f64) -> bool {
    (rsi_min..=rsi_max).contains(&rsi)
}

/// Current bar closes strong after a previous bar that closed weak.
pub fn is_reversal_bar(previous: &Candle, current: &Candle) -> bool {
    current.closes_in_upper(0.3) && previous.closes_below(0.5)
}

/// Lowest low of the trailing [`SWING_LOW_WINDOW`] candles.
pub fn swing_low(candles: &[Candle]) -> Option<f64> {
    let start = candles.len().saturating_sub(SWING_LOW_WINDOW);
    candles[start..].iter().map(|c| c.low).reduce(f64::min)
}

// =============================================================================
// Detection
// =============================================================================

/// Evaluate the pullback rule on the last candle of `candles`.
///
/// # Errors
/// - `InvalidParameter` for a zero period, an inverted RSI band, or an EMA
///   of exactly zero.
/// - `InsufficientData` with fewer than `max(ema_period, rsi_period) + 5`
///   candles.
pub fn detect_pullback(candles: &[Candle], params: &PullbackParams) -> EngineResult<PullbackResult> {
    params.validate()?;
    let required = params.required_candles();
    if candles.len() < required {
        return Err(EngineError::insufficient(required, "candles"));
    }

    let prices = closes(candles);
    let ema = current_ema(&prices, params.ema_period)?;
    let rsi = calculate_rsi(&prices, params.rsi_period)?;

    let last = candles.len() - 1;
    let current = candles[last];
    let previous = candles[last - 1];

    if ema == 0.0 {
        return Err(EngineError::InvalidParameter(
            "EMA is zero; distance to EMA is undefined".into(),
        ));
    }
    let price_to_ema_percent = (current.close - ema) / ema * 100.0;

    let near_ema = is_near_ema(price_to_ema_percent);
    let rsi_in_bounce_zone = in_bounce_zone(rsi, params.rsi_min, params.rsi_max);
    let has_reversal_bar = is_reversal_bar(&previous, &current);

    let signal = if near_ema && rsi_in_bounce_zone && has_reversal_bar {
        SignalAction::PullbackBuy
    } else {
        SignalAction::NoSignal
    };

    // required_candles() >= 6, so the window is never empty.
    let swing = swing_low(candles).unwrap_or(current.low);

    debug!(
        %signal,
        near_ema,
        rsi_in_bounce_zone,
        has_reversal_bar,
        rsi,
        "Pullback evaluated"
    );

    Ok(PullbackResult {
        signal,
        ema_period: params.ema_period,
        rsi_period: params.rsi_period,
        current_price: round_display(current.close),
        ema: round_display(ema),
        rsi: round_display(rsi),
        price_to_ema_percent: round_display(price_to_ema_percent),
        near_ema,
        rsi_in_bounce_zone,
        has_reversal_bar,
        reversal_bar_close: round_display(current.close),
        reversal_bar_high: round_display(current.high),
        suggested_entry: round_display(current.high * ENTRY_BUFFER),
        suggested_stop: round_display(swing * STOP_BUFFER),
        swing_low: round_display(swing),
    })
}
