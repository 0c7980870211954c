// =============================================================================
// Position Sizing — fixed-fractional risk for a long entry
// =============================================================================
//
// Given an account balance and the share of it the trader is willing to lose,
// size a long position so that being stopped out costs exactly that amount:
//
//   risk_amount    = balance * risk_percent / 100
//   stop_frac      = (entry - stop) / entry
//   position_value = risk_amount / stop_frac
//   qty            = position_value / entry
//
// The 2R target is `entry + 2 * (entry - stop)`, inflated by the round-trip
// fee fraction so the target still nets 2R after maker + taker fees.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::precision::round_raw;

/// Fee (in percent) assumed for either side when none is supplied.
pub const DEFAULT_FEE_PCT: f64 = 0.25;

/// Inputs to [`calculate_position_size`].  Fees are percentages; a missing
/// or non-positive fee falls back to [`DEFAULT_FEE_PCT`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRequest {
    pub balance: f64,
    pub risk_percent: f64,
    pub entry: f64,
    pub stop: f64,
    #[serde(default)]
    pub maker_fee_pct: Option<f64>,
    #[serde(default)]
    pub taker_fee_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    pub balance: f64,
    pub risk_percent: f64,
    pub entry: f64,
    pub stop: f64,
    /// Effective fees after the default fallback, in percent.
    pub maker_fee_pct: f64,
    pub taker_fee_pct: f64,
    pub risk_amount: f64,
    pub stop_frac: f64,
    pub position_value: f64,
    pub qty: f64,
    pub take_profit_2r: f64,
    /// Maker + taker, in percent.
    pub total_fee_pct: f64,
}

impl PositionSize {
    pub fn summary(&self) -> String {
        format!(
            "Position Size Calculation:\n- Balance: {:.2}\n- Risk: {:.2}% = {:.2}\n- Entry: {:.2} | Stop: {:.2}\n- Stop Distance: {:.2}% ({:.4} fraction)\n- Position Value: {:.2}\n- Quantity: {:.6}\n- Take Profit (2R): {:.2}\n- Fees: Maker {:.2}% + Taker {:.2}% = {:.2}%",
            self.balance,
            self.risk_percent,
            self.risk_amount,
            self.entry,
            self.stop,
            self.stop_frac * 100.0,
            self.stop_frac,
            self.position_value,
            self.qty,
            self.take_profit_2r,
            self.maker_fee_pct,
            self.taker_fee_pct,
            self.total_fee_pct
        )
    }
}

fn effective_fee(fee: Option<f64>) -> f64 {
    match fee {
        Some(f) if f.is_finite() && f > 0.0 => f,
        _ => DEFAULT_FEE_PCT,
    }
}

fn validate(req: &PositionRequest) -> EngineResult<()> {
    let invalid = |msg: &str| Err(EngineError::InvalidParameter(msg.to_string()));

    if !req.balance.is_finite() || req.balance <= 0.0 {
        return invalid("balance must be a positive number");
    }
    if !req.risk_percent.is_finite() || req.risk_percent <= 0.0 || req.risk_percent > 100.0 {
        return invalid("risk_percent must be between 0 and 100");
    }
    if !req.entry.is_finite() || req.entry <= 0.0 {
        return invalid("entry price must be positive");
    }
    if !req.stop.is_finite() || req.stop <= 0.0 {
        return invalid("stop price must be positive");
    }
    if req.stop >= req.entry {
        return invalid("stop price must be lower than entry price (long position)");
    }
    Ok(())
}

/// Size a long position.
///
/// # Errors
/// `InvalidParameter` unless `balance > 0`, `0 < risk_percent <= 100`,
/// `entry > 0`, `stop > 0` and `stop < entry`.
pub fn calculate_position_size(req: &PositionRequest) -> EngineResult<PositionSize> {
    validate(req)?;

    let maker = effective_fee(req.maker_fee_pct);
    let taker = effective_fee(req.taker_fee_pct);
    let total_fee_frac = maker / 100.0 + taker / 100.0;

    let risk_amount = req.balance * req.risk_percent / 100.0;
    let risk_per_unit = req.entry - req.stop;
    let stop_frac = risk_per_unit / req.entry;
    let position_value = risk_amount / stop_frac;
    let qty = position_value / req.entry;
    let take_profit = (req.entry + 2.0 * risk_per_unit) * (1.0 + total_fee_frac);

    debug!(
        balance = req.balance,
        risk_percent = req.risk_percent,
        risk_amount,
        stop_frac,
        position_value,
        qty,
        take_profit,
        "Position sized"
    );

    Ok(PositionSize {
        balance: req.balance,
        risk_percent: req.risk_percent,
        entry: req.entry,
        stop: req.stop,
        maker_fee_pct: maker,
        taker_fee_pct: taker,
        risk_amount: round_raw(risk_amount),
        stop_frac: round_raw(stop_frac),
        position_value: round_raw(position_value),
        qty: round_raw(qty),
        take_profit_2r: round_raw(take_profit),
        total_fee_pct: round_raw(maker + taker),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn req(balance: f64, risk: f64, entry: f64, stop: f64) -> PositionRequest {
        PositionRequest {
            balance,
            risk_percent: risk,
            entry,
            stop,
            maker_fee_pct: None,
            taker_fee_pct: None,
        }
    }

    #[test]
    fn sizes_one_percent_risk() {
        // 1% of 10,000 = 100 at risk; stop 5% away => 2,000 position, 20 units.
        let p = calculate_position_size(&req(10_000.0, 1.0, 100.0, 95.0)).unwrap();
        assert_eq!(p.risk_amount, 100.0);
        assert_eq!(p.stop_frac, 0.05);
        assert_eq!(p.position_value, 2000.0);
        assert_eq!(p.qty, 20.0);
        // (100 + 10) * 1.005
        assert_eq!(p.take_profit_2r, 110.55);
        assert_eq!(p.total_fee_pct, 0.5);
    }

    #[test]
    fn custom_fees() {
        let mut r = req(10_000.0, 1.0, 100.0, 95.0);
        r.maker_fee_pct = Some(0.1);
        r.taker_fee_pct = Some(0.2);
        let p = calculate_position_size(&r).unwrap();
        assert_eq!(p.total_fee_pct, 0.3);
        assert_eq!(p.take_profit_2r, 110.33);
    }

    #[test]
    fn non_positive_fee_falls_back() {
        let mut r = req(10_000.0, 1.0, 100.0, 95.0);
        r.maker_fee_pct = Some(0.0);
        r.taker_fee_pct = Some(-1.0);
        let p = calculate_position_size(&r).unwrap();
        assert_eq!(p.total_fee_pct, 0.5);
    }

    #[test]
    fn qty_times_entry_is_position_value() {
        let p = calculate_position_size(&req(12_345.67, 2.5, 1_234.5, 1_200.1)).unwrap();
        assert!((p.qty * 1_234.5 - p.position_value).abs() < 1e-4);
    }

    #[test]
    fn validation() {
        let cases = [
            req(0.0, 1.0, 100.0, 95.0),
            req(1000.0, 0.0, 100.0, 95.0),
            req(1000.0, 100.5, 100.0, 95.0),
            req(1000.0, 1.0, 0.0, 95.0),
            req(1000.0, 1.0, 100.0, 0.0),
            req(1000.0, 1.0, 100.0, 100.0),
            req(1000.0, 1.0, 100.0, 105.0),
            req(f64::NAN, 1.0, 100.0, 95.0),
        ];
        for case in cases {
            let err = calculate_position_size(&case).unwrap_err();
            assert_eq!(err.kind(), "invalid_parameter", "{case:?}");
        }
        assert!(calculate_position_size(&req(1000.0, 100.0, 100.0, 95.0)).is_ok());
    }

    #[test]
    fn summary_mentions_quantity() {
        let p = calculate_position_size(&req(10_000.0, 1.0, 100.0, 95.0)).unwrap();
        let s = p.summary();
        assert!(s.contains("Quantity: 20.000000"));
        assert!(s.contains("Take Profit (2R): 110.55"));
    }
}
