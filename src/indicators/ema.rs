// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   k      = 2 / (period + 1)
//   EMA_t  = (close_t - EMA_{t-1}) * k + EMA_{t-1}
//
// The first EMA value is seeded with the SMA of the first `period` closes and
// sits at price index `period - 1`; earlier indices carry no value.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_period, EngineError, EngineResult};
use crate::precision::{round_display, round_raw};

/// Direction of the last EMA step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

impl Trend {
    /// Classify the move from `previous` to `current`.
    pub fn from_step(previous: f64, current: f64) -> Self {
        if current > previous {
            Self::Bullish
        } else if current < previous {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }
}

/// Outcome of [`ema_report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmaResult {
    pub period: usize,
    pub data_points: usize,
    /// Defined EMA values; element 0 belongs to price index `period - 1`.
    pub ema: Vec<f64>,
    pub current_ema: f64,
    pub previous_ema: Option<f64>,
    pub trend: Trend,
}

impl EmaResult {
    pub fn summary(&self) -> String {
        let previous = self
            .previous_ema
            .map(|p| format!("{p:.2}"))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "EMA({}) calculated from {} data points\nCurrent: {:.2} | Previous: {} | Trend: {}",
            self.period, self.data_points, self.current_ema, previous, self.trend
        )
    }
}

/// Compute the EMA series for `prices` and look-back `period`.
///
/// The returned vector has `prices.len() - period + 1` elements, one for each
/// price starting at index `period - 1`.
///
/// # Errors
/// - `InvalidParameter` when `period == 0`.
/// - `InsufficientData` when `prices.len() < period`.
pub fn calculate_ema(prices: &[f64], period: usize) -> EngineResult<Vec<f64>> {
    ensure_period(period, "period")?;
    if prices.len() < period {
        return Err(EngineError::insufficient(period, "prices"));
    }

    let k = 2.0 / (period + 1) as f64;
    let seed = prices[..period].iter().sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(prices.len() - period + 1);
    result.push(seed);

    let mut prev = seed;
    for &price in &prices[period..] {
        let ema = (price - prev) * k + prev;
        result.push(ema);
        prev = ema;
    }

    Ok(result)
}

/// Most recent EMA value.
pub fn current_ema(prices: &[f64], period: usize) -> EngineResult<f64> {
    let series = calculate_ema(prices, period)?;
    // calculate_ema always yields at least the seed.
    Ok(series[series.len() - 1])
}

/// EMA series plus the current/previous figures and trend label.
pub fn ema_report(prices: &[f64], period: usize) -> EngineResult<EmaResult> {
    let series = calculate_ema(prices, period)?;

    let current = series[series.len() - 1];
    let previous = series.len().checked_sub(2).map(|i| series[i]);
    let trend = previous.map_or(Trend::Neutral, |p| Trend::from_step(p, current));

    debug!(period, current, ?previous, %trend, "EMA computed");

    Ok(EmaResult {
        period,
        data_points: prices.len(),
        ema: series.iter().copied().map(round_raw).collect(),
        current_ema: round_display(current),
        previous_ema: previous.map(round_display),
        trend,
    })
}
