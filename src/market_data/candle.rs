use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single HLC candle with optional volume, as supplied by the caller.
///
/// Series of candles are always ordered oldest-first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Candle {
    pub fn new(high: f64, low: f64, close: f64) -> Self {
        Self {
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Volume, treating a missing figure as zero.
    pub fn volume_or_zero(&self) -> f64 {
        self.volume.unwrap_or(0.0)
    }

    /// True when the close sits in the top `fraction` of the bar's range.
    pub fn closes_in_upper(&self, fraction: f64) -> bool {
        self.close > self.high - self.range() * fraction
    }

    /// True when the close sits strictly below the given fraction of the
    /// range measured down from the high (0.5 = below the midpoint).
    pub fn closes_below(&self, fraction: f64) -> bool {
        self.close < self.high - self.range() * fraction
    }
}

/// Extract the close prices of a candle series.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}
