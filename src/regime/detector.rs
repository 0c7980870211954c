// =============================================================================
// Market Regime Detector
// =============================================================================
//
// Classifies a close series into one of four regimes from three readings:
//
//   volatility       population std-dev of simple returns over the lookback
//   trend strength   |up - down| / (up + down) step counts over the lookback
//   ADX(14)          over the full series
//
// Detection hierarchy (evaluated top-to-bottom; first match wins):
//
//   1. STRONG_TRENDING    ADX > 25 AND trend strength > 0.6
//   2. TRENDING           ADX > 20 OR  trend strength > 0.5
//   3. VOLATILE_RANGING   volatility > 0.02
//   4. RANGING            everything else
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::indicators::adx::{calculate_adx, DEFAULT_ADX_PERIOD};
use crate::precision::{round_display, round_to};

/// Smallest lookback window accepted by [`check_market_regime`].
pub const MIN_LOOKBACK: usize = 5;
/// Lookback used when the caller does not supply one.
pub const DEFAULT_LOOKBACK: usize = 20;

// =============================================================================
// Types
// =============================================================================

/// High-level market regime classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    /// Persistent directional move with a clear step majority.
    StrongTrending,
    /// Directional bias present but not dominant.
    Trending,
    /// Sideways with wide swings.
    VolatileRanging,
    /// Sideways chop.
    Ranging,
}

impl std::fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrongTrending => write!(f, "strong_trending"),
            Self::Trending => write!(f, "trending"),
            Self::VolatileRanging => write!(f, "volatile_ranging"),
            Self::Ranging => write!(f, "ranging"),
        }
    }
}

impl MarketRegime {
    /// Fixed advisory text carried by each regime.
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::StrongTrending => "Use trend-following strategies with momentum",
            Self::Trending => "Use trend-following strategies",
            Self::VolatileRanging => "Use caution, high volatility in ranging market",
            Self::Ranging => "Use mean-reversion strategies",
        }
    }
}

/// Classified regime plus all contributing metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeResult {
    pub regime: MarketRegime,
    pub lookback: usize,
    /// Population std-dev of returns (fraction, 4 dp).
    pub volatility: f64,
    pub trend_strength: f64,
    pub adx: f64,
    pub recommendation: String,
}

impl RegimeResult {
    pub fn summary(&self) -> String {
        format!(
            "Market Regime Analysis ({}-period lookback)\nRegime: {} | Volatility: {:.2}% | Trend Strength: {:.2}\nADX: {:.2} | Recommendation: {}",
            self.lookback,
            self.regime,
            self.volatility * 100.0,
            self.trend_strength,
            self.adx,
            self.recommendation
        )
    }
}

// =============================================================================
// Detection
// =============================================================================

/// Run regime detection over `prices` with the given lookback window.
///
/// # Errors
/// - `InvalidParameter` when `lookback < 5`, or a zero price inside the
///   window would make a return undefined.
/// - `InsufficientData` when `prices.len() < lookback`.
pub fn check_market_regime(prices: &[f64], lookback: usize) -> EngineResult<RegimeResult> {
    if lookback < MIN_LOOKBACK {
        return Err(EngineError::InvalidParameter(format!(
            "lookback must be at least {MIN_LOOKBACK}"
        )));
    }
    if prices.len() < lookback {
        return Err(EngineError::insufficient(lookback, "prices"));
    }

    let recent = &prices[prices.len() - lookback..];

    let volatility = return_volatility(recent)?;
    let trend_strength = trend_strength(recent);
    let adx = calculate_adx(prices, DEFAULT_ADX_PERIOD);

    let regime = classify(volatility, trend_strength, adx);

    debug!(
        %regime,
        volatility = format!("{:.4}", volatility),
        trend_strength = format!("{:.2}", trend_strength),
        adx = format!("{:.2}", adx),
        "Regime detected"
    );

    Ok(RegimeResult {
        regime,
        lookback,
        volatility: round_to(volatility, 4),
        trend_strength: round_display(trend_strength),
        adx: round_display(adx),
        recommendation: regime.recommendation().to_string(),
    })
}

/// Determine the regime from the raw readings.  Total over all inputs.
pub fn classify(volatility: f64, trend_strength: f64, adx: f64) -> MarketRegime {
    if adx > 25.0 && trend_strength > 0.6 {
        MarketRegime::StrongTrending
    } else if adx > 20.0 || trend_strength > 0.5 {
        MarketRegime::Trending
    } else if volatility > 0.02 {
        MarketRegime::VolatileRanging
    } else {
        MarketRegime::Ranging
    }
}

/// Population standard deviation of simple returns.  Fewer than two prices
/// have no returns and report 0.
pub fn return_volatility(prices: &[f64]) -> EngineResult<f64> {
    if prices.len() < 2 {
        return Ok(0.0);
    }

    let returns = prices
        .windows(2)
        .map(|w| {
            if w[0] == 0.0 {
                Err(EngineError::InvalidParameter(
                    "zero price inside the lookback window; returns are undefined".into(),
                ))
            } else {
                Ok((w[1] - w[0]) / w[0])
            }
        })
        .collect::<EngineResult<Vec<f64>>>()?;

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    Ok(variance.sqrt())
}

/// `|up - down| / (up + down)` over consecutive steps; 0 without moves.
pub fn trend_strength(prices: &[f64]) -> f64 {
    let (up, down) = prices.windows(2).fold((0u32, 0u32), |(up, down), w| {
        if w[1] > w[0] {
            (up + 1, down)
        } else if w[1] < w[0] {
            (up, down + 1)
        } else {
            (up, down)
        }
    });

    let total = up + down;
    if total == 0 {
        return 0.0;
    }
    (up as f64 - down as f64).abs() / total as f64
}
