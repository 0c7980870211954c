// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the momentum and volatility
// primitives.  Every public calculator returns `EngineResult<T>` so callers
// are forced to handle insufficient-data and degenerate-denominator cases;
// ADX is the exception and reports a neutral 0.0 on short input.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod roc;
pub mod rsi;

pub use adx::calculate_adx;
pub use atr::{atr_report, calculate_atr, true_ranges, AtrResult};
pub use ema::{calculate_ema, ema_report, EmaResult, Trend};
pub use roc::{calculate_roc, roc_report, RocResult};
pub use rsi::{calculate_rsi, rsi_report, RsiResult, RsiSignal};
