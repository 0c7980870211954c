// =============================================================================
// KUB Signals — technical-analysis and risk tools for THB spot pairs
// =============================================================================
//
// The engine is a set of pure functions over caller-supplied market data:
// indicators, regime classification, entry signals, ranking, position
// sizing, spread/depth, fees and a market screener.  `api` exposes them as
// named tools over HTTP; nothing here fetches data or places orders.
// =============================================================================

pub mod api;
pub mod app_state;
pub mod error;
pub mod fees;
pub mod indicators;
pub mod market_data;
pub mod normalize;
pub mod precision;
pub mod ranking;
pub mod regime;
pub mod risk;
pub mod runtime_config;
pub mod screener;
pub mod signals;
pub mod tool_result;

pub use error::{EngineError, EngineResult};
pub use fees::{FeeSchedule, FeeTable};
pub use ranking::{rank_relative_strength, RankingResult};
pub use regime::{check_market_regime, MarketRegime, RegimeResult};
pub use risk::{calculate_position_size, PositionRequest, PositionSize};
pub use runtime_config::RuntimeConfig;
pub use screener::{screen_markets, MarketSnapshot, ScreenerFilters, ScreenerResult};
pub use signals::{detect_breakout, detect_pullback, SignalAction};
pub use tool_result::ToolResult;
