// =============================================================================
// Regime Detection Module
// =============================================================================
//
// Market regime classification from a close series using return volatility,
// step-count trend strength and the close-only ADX.

pub mod detector;

pub use detector::{check_market_regime, classify, MarketRegime, RegimeResult};
