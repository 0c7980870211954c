// =============================================================================
// Relative Strength Ranking
// =============================================================================
//
// Ranks symbols by their Rate of Change over a common period.  Symbols whose
// series is too short, or whose reference price is zero, are left out of the
// ranking and reported in `skipped` instead of failing the whole call.
//
// Order: ROC descending, then symbol name ascending for equal ROC, so the
// output never depends on map iteration order.
// =============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_period, EngineResult};
use crate::indicators::calculate_roc;
use crate::precision::round_display;

/// Benchmark label reported when the caller names none.
pub const DEFAULT_BENCHMARK: &str = "btc_thb";

const TOP_N: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRank {
    pub symbol: String,
    pub roc: f64,
    pub rank: usize,
}

/// A symbol left out of the ranking and the reason why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    pub period: usize,
    pub benchmark: String,
    pub rankings: Vec<SymbolRank>,
    pub top3: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedSymbol>,
}

impl RankingResult {
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Relative Strength ranking for {} symbols (ROC {} period)\nBenchmark: {}\n\nTop 3:",
            self.rankings.len(),
            self.period,
            self.benchmark
        );
        for entry in self.rankings.iter().take(TOP_N) {
            out.push_str(&format!("\n{}. {}: {:.2}%", entry.rank, entry.symbol, entry.roc));
        }
        if !self.skipped.is_empty() {
            out.push_str(&format!("\n\nSkipped: {}", self.skipped.len()));
        }
        out
    }
}

/// Rank every symbol in `series` by ROC(`period`).
///
/// # Errors
/// `InvalidParameter` when `period == 0`.  Per-symbol failures never fail
/// the call.
pub fn rank_relative_strength(
    series: &BTreeMap<String, Vec<f64>>,
    period: usize,
    benchmark: &str,
) -> EngineResult<RankingResult> {
    ensure_period(period, "period")?;

    let mut scored: Vec<(String, f64)> = Vec::with_capacity(series.len());
    let mut skipped = Vec::new();

    for (symbol, prices) in series {
        match calculate_roc(prices, period) {
            Ok(roc) => scored.push((symbol.clone(), roc)),
            Err(e) => {
                debug!(%symbol, error = %e, "Symbol skipped from ranking");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    scored.sort_by(|(sym_a, roc_a), (sym_b, roc_b)| {
        roc_b
            .partial_cmp(roc_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| sym_a.cmp(sym_b))
    });

    let rankings: Vec<SymbolRank> = scored
        .into_iter()
        .enumerate()
        .map(|(i, (symbol, roc))| SymbolRank {
            symbol,
            roc: round_display(roc),
            rank: i + 1,
        })
        .collect();

    let top3 = rankings
        .iter()
        .take(TOP_N)
        .map(|r| r.symbol.clone())
        .collect();

    Ok(RankingResult {
        period,
        benchmark: benchmark.to_string(),
        rankings,
        top3,
        skipped,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &[f64])]) -> BTreeMap<String, Vec<f64>> {
        entries
            .iter()
            .map(|(s, p)| (s.to_string(), p.to_vec()))
            .collect()
    }

    #[test]
    fn ranks_by_roc_descending() {
        let series = map(&[
            ("ada_thb", &[10.0, 11.0, 12.0]),  // +20%
            ("btc_thb", &[100.0, 101.0, 105.0]), // +5%
            ("eth_thb", &[50.0, 40.0, 45.0]),  // -10%
            ("xrp_thb", &[1.0, 1.2, 1.5]),     // +50%
        ]);
        let r = rank_relative_strength(&series, 2, DEFAULT_BENCHMARK).unwrap();
        let order: Vec<&str> = r.rankings.iter().map(|x| x.symbol.as_str()).collect();
        assert_eq!(order, vec!["xrp_thb", "ada_thb", "btc_thb", "eth_thb"]);
        assert_eq!(r.top3, vec!["xrp_thb", "ada_thb", "btc_thb"]);
        assert_eq!(r.rankings[0].rank, 1);
        assert_eq!(r.rankings[3].rank, 4);
        assert_eq!(r.rankings[3].roc, -10.0);
        assert_eq!(r.benchmark, "btc_thb");
    }

    #[test]
    fn ties_break_by_symbol() {
        let series = map(&[
            ("zzz_thb", &[1.0, 2.0]),
            ("aaa_thb", &[5.0, 10.0]),
            ("mmm_thb", &[3.0, 6.0]),
        ]);
        let r = rank_relative_strength(&series, 1, "x").unwrap();
        assert_eq!(r.top3, vec!["aaa_thb", "mmm_thb", "zzz_thb"]);
    }

    #[test]
    fn short_and_zero_base_series_are_skipped() {
        let series = map(&[
            ("short", &[1.0]),
            ("zero", &[0.0, 1.0]),
            ("ok", &[1.0, 2.0]),
        ]);
        let r = rank_relative_strength(&series, 1, DEFAULT_BENCHMARK).unwrap();
        assert_eq!(r.rankings.len(), 1);
        assert_eq!(r.top3, vec!["ok"]);
        let skipped: Vec<&str> = r.skipped.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(skipped, vec!["short", "zero"]);
    }

    #[test]
    fn fewer_than_three_symbols() {
        let series = map(&[("a", &[1.0, 2.0])]);
        let r = rank_relative_strength(&series, 1, DEFAULT_BENCHMARK).unwrap();
        assert_eq!(r.top3.len(), 1);
        assert!(r.summary().contains("1. a: 100.00%"));
    }

    #[test]
    fn zero_period_rejected() {
        assert!(rank_relative_strength(&BTreeMap::new(), 0, DEFAULT_BENCHMARK).is_err());
    }
}
