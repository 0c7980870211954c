// =============================================================================
// Market Screener
// =============================================================================
//
// Filters and scores THB pairs from pre-fetched ticker + order book snapshots.
//
// Per pair (first failing filter drops it):
//   1. symbol ends in `_thb`, status (when given) is "active"
//   2. 24h base volume >= min_volume_24h
//   3. bid and ask both positive, spread_percent <= max_spread
//   4. liquidity within +/-1% of the ticker mid >= min_depth
//
// Score = volume_score * 0.4 + spread_score * 0.3 + liquidity_score * 0.3
//   volume_score    = volume / 1e7
//   spread_score    = (max_spread - spread_pct) / max_spread * 100
//   liquidity_score = total_liquidity / 1e5
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::market_data::{liquidity_depth, OrderBook, TickerSnapshot};
use crate::precision::{round_display, round_raw};

/// Hard cap on the number of returned pairs.
pub const MAX_LIMIT: usize = 20;
/// Depth band used for the liquidity filter.
const DEPTH_RANGE_PERCENT: f64 = 1.0;
const QUOTE_SUFFIX: &str = "_thb";

/// Pre-fetched market state for one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    #[serde(default)]
    pub status: Option<String>,
    pub ticker: TickerSnapshot,
    #[serde(default)]
    pub book: OrderBook,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerFilters {
    pub min_volume_24h: f64,
    /// Maximum spread, in percent.
    pub max_spread: f64,
    pub min_depth: f64,
    pub limit: usize,
}

impl Default for ScreenerFilters {
    fn default() -> Self {
        Self {
            min_volume_24h: 1_000_000.0,
            max_spread: 0.20,
            min_depth: 50_000.0,
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenedPair {
    pub symbol: String,
    pub last_price: f64,
    pub volume_24h: f64,
    pub spread: f64,
    pub spread_percent: f64,
    pub bid_liquidity: f64,
    pub ask_liquidity: f64,
    pub total_liquidity: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerResult {
    pub filters: ScreenerFilters,
    pub checked: usize,
    pub results_count: usize,
    pub results: Vec<ScreenedPair>,
}

impl ScreenerResult {
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Market Screener Results:\nFilters: Vol>={:.0}K, Spread<={:.2}%, Depth>={:.0}K\n\n",
            self.filters.min_volume_24h / 1000.0,
            self.filters.max_spread,
            self.filters.min_depth / 1000.0
        );

        if self.results.is_empty() {
            out.push_str("No pairs match criteria");
            return out;
        }

        let lines: Vec<String> = self
            .results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                format!(
                    "{}. {} (Score: {:.1})\n   Price: {:.2} | Vol: {:.2}M THB\n   Spread: {:.4}% | Liquidity: {:.0}K THB",
                    i + 1,
                    r.symbol.to_uppercase(),
                    r.score,
                    r.last_price,
                    r.volume_24h / 1_000_000.0,
                    r.spread_percent,
                    r.total_liquidity / 1000.0
                )
            })
            .collect();
        out.push_str(&lines.join("\n\n"));
        out
    }
}

fn is_thb_pair(snapshot: &MarketSnapshot) -> bool {
    let active = snapshot
        .status
        .as_deref()
        .map_or(true, |s| s.eq_ignore_ascii_case("active"));
    active && snapshot.symbol.to_ascii_lowercase().ends_with(QUOTE_SUFFIX)
}

/// Apply the filters to one snapshot; `None` when it is filtered out.
fn screen_pair(snapshot: &MarketSnapshot, filters: &ScreenerFilters) -> Option<ScreenedPair> {
    let ticker = &snapshot.ticker;

    let volume = round_raw(ticker.base_volume);
    if volume < filters.min_volume_24h {
        return None;
    }

    let spread = ticker.spread().ok()?;
    if spread.spread_percent > filters.max_spread {
        return None;
    }

    let depth = liquidity_depth(&snapshot.book, DEPTH_RANGE_PERCENT, Some(spread.mid)).ok()?;
    if depth.total_liquidity < filters.min_depth {
        return None;
    }

    let volume_score = round_raw(volume / 10_000_000.0);
    let spread_score = round_display(
        (filters.max_spread - spread.spread_percent) / filters.max_spread * 100.0,
    );
    let liquidity_score = round_raw(depth.total_liquidity / 100_000.0);
    let score = round_display(volume_score * 0.4 + spread_score * 0.3 + liquidity_score * 0.3);

    debug!(symbol = %snapshot.symbol, score, "Pair passed screening");

    Some(ScreenedPair {
        symbol: snapshot.symbol.to_ascii_lowercase(),
        last_price: round_raw(ticker.last),
        volume_24h: volume,
        spread: spread.spread,
        spread_percent: spread.spread_percent,
        bid_liquidity: depth.bid_liquidity,
        ask_liquidity: depth.ask_liquidity,
        total_liquidity: depth.total_liquidity,
        score,
    })
}

impl ScreenerFilters {
    pub(crate) fn validate(&self) -> EngineResult<()> {
        if self.limit < 1 {
            return Err(EngineError::InvalidParameter(
                "limit must be at least 1".into(),
            ));
        }
        if !self.max_spread.is_finite() || self.max_spread <= 0.0 {
            return Err(EngineError::InvalidParameter(
                "max_spread must be a positive number".into(),
            ));
        }
        if !self.min_volume_24h.is_finite() || !self.min_depth.is_finite() {
            return Err(EngineError::InvalidParameter(
                "min_volume_24h and min_depth must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Screen `snapshots` and return the best pairs by score.
///
/// # Errors
/// `InvalidParameter` when `limit < 1`, `max_spread <= 0`, or a volume /
/// depth floor is not finite.
pub fn screen_markets(
    snapshots: &[MarketSnapshot],
    filters: &ScreenerFilters,
) -> EngineResult<ScreenerResult> {
    filters.validate()?;

    let filters = ScreenerFilters {
        limit: filters.limit.min(MAX_LIMIT),
        ..*filters
    };

    let candidates: Vec<&MarketSnapshot> = snapshots.iter().filter(|s| is_thb_pair(s)).collect();

    let mut results: Vec<ScreenedPair> = candidates
        .iter()
        .filter_map(|s| screen_pair(s, &filters))
        .collect();

    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    results.truncate(filters.limit);

    info!(
        passed = results.len(),
        total_checked = candidates.len(),
        "Market screening completed"
    );

    Ok(ScreenerResult {
        filters,
        checked: candidates.len(),
        results_count: results.len(),
        results,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::OrderBookLevel;

    /// A pair with a tight 100/100.1 market and `depth` THB on each side.
    fn snapshot(symbol: &str, volume: f64, depth: f64) -> MarketSnapshot {
        MarketSnapshot {
            symbol: symbol.to_string(),
            status: None,
            ticker: TickerSnapshot {
                last: 100.05,
                highest_bid: 100.0,
                lowest_ask: 100.1,
                base_volume: volume,
                ..TickerSnapshot::default()
            },
            book: OrderBook::new(
                vec![OrderBookLevel::new(100.0, depth / 100.0)],
                vec![OrderBookLevel::new(100.1, depth / 100.1)],
            ),
        }
    }

    #[test]
    fn only_thb_pairs_are_screened() {
        let snaps = vec![
            snapshot("btc_thb", 5_000_000.0, 100_000.0),
            snapshot("btc_usdt", 5_000_000.0, 100_000.0),
        ];
        let r = screen_markets(&snaps, &ScreenerFilters::default()).unwrap();
        assert_eq!(r.checked, 1);
        assert_eq!(r.results_count, 1);
        assert_eq!(r.results[0].symbol, "btc_thb");
    }

    #[test]
    fn inactive_pairs_are_skipped() {
        let mut snap = snapshot("eth_thb", 5_000_000.0, 100_000.0);
        snap.status = Some("halted".into());
        let r = screen_markets(&[snap], &ScreenerFilters::default()).unwrap();
        assert_eq!(r.checked, 0);
    }

    #[test]
    fn filters_drop_thin_and_wide_pairs() {
        let mut wide = snapshot("wide_thb", 5_000_000.0, 100_000.0);
        wide.ticker.lowest_ask = 101.0; // ~1% spread
        let snaps = vec![
            snapshot("lowvol_thb", 10.0, 100_000.0),
            snapshot("shallow_thb", 5_000_000.0, 10.0),
            wide,
            snapshot("good_thb", 5_000_000.0, 100_000.0),
        ];
        let r = screen_markets(&snaps, &ScreenerFilters::default()).unwrap();
        let names: Vec<&str> = r.results.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(names, vec!["good_thb"]);
    }

    #[test]
    fn score_orders_results() {
        let snaps = vec![
            snapshot("small_thb", 2_000_000.0, 100_000.0),
            snapshot("big_thb", 50_000_000.0, 100_000.0),
        ];
        let r = screen_markets(&snaps, &ScreenerFilters::default()).unwrap();
        assert_eq!(r.results[0].symbol, "big_thb");
        assert!(r.results[0].score > r.results[1].score);
        // spread 0.1 on mid 100.05 => 0.1% => spread score 50
        let big = &r.results[0];
        assert_eq!(big.spread_percent, 0.1);
        let expected = round_display(5.0 * 0.4 + 50.0 * 0.3 + big.total_liquidity / 100_000.0 * 0.3);
        assert_eq!(big.score, expected);
    }

    #[test]
    fn limit_is_capped() {
        let snaps: Vec<MarketSnapshot> = (0..25)
            .map(|i| snapshot(&format!("c{i:02}_thb"), 5_000_000.0, 100_000.0))
            .collect();
        let filters = ScreenerFilters {
            limit: 50,
            ..ScreenerFilters::default()
        };
        let r = screen_markets(&snaps, &filters).unwrap();
        assert_eq!(r.results_count, MAX_LIMIT);
        assert_eq!(r.filters.limit, MAX_LIMIT);
        // Equal scores fall back to symbol order.
        assert_eq!(r.results[0].symbol, "c00_thb");
    }

    #[test]
    fn invalid_filters() {
        let zero_limit = ScreenerFilters {
            limit: 0,
            ..ScreenerFilters::default()
        };
        assert!(screen_markets(&[], &zero_limit).is_err());
        let zero_spread = ScreenerFilters {
            max_spread: 0.0,
            ..ScreenerFilters::default()
        };
        assert!(screen_markets(&[], &zero_spread).is_err());
    }

    #[test]
    fn empty_summary() {
        let r = screen_markets(&[], &ScreenerFilters::default()).unwrap();
        assert!(r.summary().contains("No pairs match criteria"));
    }
}
