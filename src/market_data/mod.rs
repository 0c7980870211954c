pub mod candle;
pub mod orderbook;
pub mod ticker;

// Re-export the data types for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::Candle;
pub use orderbook::{liquidity_depth, LiquidityDepth, OrderBook, OrderBookLevel};
pub use ticker::{calculate_spread, SpreadResult, TickerSnapshot};
