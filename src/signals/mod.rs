// =============================================================================
// Signals Module
// =============================================================================
//
// Composite entry detectors built from the indicator primitives:
// - Breakout: new high over the lookback window with volume confirmation
// - Pullback: touch of the EMA with an RSI bounce and a reversal bar
//
// Each detector exposes its boolean predicates separately so the decision
// table can be tested without the arithmetic that feeds it.

pub mod breakout;
pub mod pullback;

use serde::{Deserialize, Serialize};

pub use breakout::{detect_breakout, BreakoutParams, BreakoutResult};
pub use pullback::{detect_pullback, PullbackParams, PullbackResult};

/// Outcome label shared by the detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalAction {
    BreakoutBuy,
    PullbackBuy,
    NoSignal,
}

impl std::fmt::Display for SignalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BreakoutBuy => write!(f, "BREAKOUT_BUY"),
            Self::PullbackBuy => write!(f, "PULLBACK_BUY"),
            Self::NoSignal => write!(f, "NO_SIGNAL"),
        }
    }
}
