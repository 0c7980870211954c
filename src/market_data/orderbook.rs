// =============================================================================
// Order Book — liquidity aggregation within a price band
// =============================================================================
//
// Liquidity is the quote value (price * amount) resting on each side of the
// book within ±range% of the mid price.  Bids count when price >= lower
// bound, asks when price <= upper bound.  Bounds and running totals are
// rounded to 8 places at every step so the figures match what a caller sees
// when it re-adds the reported levels.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::precision::{round_display, round_raw};

/// One resting price level: `(price, amount)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: f64,
    pub amount: f64,
}

impl OrderBookLevel {
    pub fn new(price: f64, amount: f64) -> Self {
        Self { price, amount }
    }

    /// Quote value of the level.
    pub fn notional(&self) -> f64 {
        self.price * self.amount
    }
}

/// Snapshot of a book.  Bids are sorted descending by price, asks ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(default)]
    pub bids: Vec<OrderBookLevel>,
    #[serde(default)]
    pub asks: Vec<OrderBookLevel>,
}

impl OrderBook {
    pub fn new(bids: Vec<OrderBookLevel>, asks: Vec<OrderBookLevel>) -> Self {
        Self { bids, asks }
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    /// Mid of the top of book, if both sides are populated.
    pub fn mid_price(&self) -> Option<f64> {
        Some((self.best_bid()? + self.best_ask()?) / 2.0)
    }
}

/// Aggregated liquidity around the mid price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityDepth {
    pub mid_price: f64,
    pub range_percent: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub bid_liquidity: f64,
    pub bid_orders: usize,
    pub ask_liquidity: f64,
    pub ask_orders: usize,
    pub total_liquidity: f64,
}

impl LiquidityDepth {
    pub fn summary(&self) -> String {
        let mut out = format!("Liquidity (±{:.1}%):\n", self.range_percent);
        out += &format!("Mid Price: {:.2}\n", self.mid_price);
        out += &format!("Range: {:.2} - {:.2}\n", self.lower_bound, self.upper_bound);
        out += "\nBid Side:\n";
        out += &format!("  Liquidity: {:.2}\n", self.bid_liquidity);
        out += &format!("  Orders: {}\n", self.bid_orders);
        out += "\nAsk Side:\n";
        out += &format!("  Liquidity: {:.2}\n", self.ask_liquidity);
        out += &format!("  Orders: {}\n", self.ask_orders);
        out += &format!("\nTotal: {:.2}", self.total_liquidity);
        out
    }
}

/// Sum the quote liquidity within `range_percent` of the mid price.
///
/// `mid` overrides the top-of-book mid (the screener passes the ticker's
/// mid).  Without it, both sides of the book must be non-empty.
///
/// # Errors
/// - `InvalidParameter` when `range_percent` is not a positive finite number
///   or the supplied mid is not positive.
/// - `InsufficientData` when no mid is supplied and a side of the book is
///   empty.
pub fn liquidity_depth(
    book: &OrderBook,
    range_percent: f64,
    mid: Option<f64>,
) -> EngineResult<LiquidityDepth> {
    if !range_percent.is_finite() || range_percent <= 0.0 {
        return Err(EngineError::InvalidParameter(
            "range_percent must be a positive number".into(),
        ));
    }

    let mid = match mid {
        Some(m) => m,
        None => book.mid_price().ok_or_else(|| {
            EngineError::InsufficientData("order book needs at least one bid and one ask".into())
        })?,
    };
    if !mid.is_finite() || mid <= 0.0 {
        return Err(EngineError::InvalidParameter(
            "mid price must be positive".into(),
        ));
    }
    let mid = round_raw(mid);

    let upper_bound = round_raw(mid * (1.0 + range_percent / 100.0));
    let lower_bound = round_raw(mid * (1.0 - range_percent / 100.0));

    let (bid_liquidity, bid_orders) = book
        .bids
        .iter()
        .filter(|l| l.price >= lower_bound)
        .fold((0.0, 0usize), |(sum, n), l| (round_raw(sum + l.notional()), n + 1));

    let (ask_liquidity, ask_orders) = book
        .asks
        .iter()
        .filter(|l| l.price <= upper_bound)
        .fold((0.0, 0usize), |(sum, n), l| (round_raw(sum + l.notional()), n + 1));

    let total_liquidity = round_raw(bid_liquidity + ask_liquidity);

    debug!(
        mid,
        lower_bound,
        upper_bound,
        bid_liquidity,
        ask_liquidity,
        total_liquidity,
        "liquidity depth computed"
    );

    Ok(LiquidityDepth {
        mid_price: mid,
        range_percent: round_display(range_percent),
        lower_bound,
        upper_bound,
        bid_liquidity,
        bid_orders,
        ask_liquidity,
        ask_orders,
        total_liquidity,
    })
}
