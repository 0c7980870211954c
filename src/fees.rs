// =============================================================================
// Fee Schedule — trading-credit tiers
// =============================================================================
//
// An ordered, read-only table of credit thresholds.  Lookup scans from the
// highest threshold down and returns the first tier the credits meet or
// exceed; the zero-threshold "Standard" row catches everything else.
//
// Fees are fractions (0.0025 = 0.25%).
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One row of the fee table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTier {
    pub min_credits: f64,
    pub level: String,
    pub maker_fee: f64,
    pub taker_fee: f64,
    pub description: String,
}

impl FeeTier {
    fn new(min_credits: f64, level: &str, maker_fee: f64, taker_fee: f64, description: &str) -> Self {
        Self {
            min_credits,
            level: level.to_string(),
            maker_fee,
            taker_fee,
            description: description.to_string(),
        }
    }
}

/// Result of a fee lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub trading_credits: f64,
    pub level: String,
    pub maker_fee: f64,
    pub taker_fee: f64,
    pub description: String,
}

impl FeeSchedule {
    pub fn summary(&self) -> String {
        format!(
            "Fee Schedule: Trading Credits {:.2} | Level: {} | Maker Fee: {:.2}% | Taker Fee: {:.2}% | {}",
            self.trading_credits,
            self.level,
            self.maker_fee * 100.0,
            self.taker_fee * 100.0,
            self.description
        )
    }
}

/// Immutable tier table, highest threshold first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeTable {
    tiers: Vec<FeeTier>,
}

impl Default for FeeTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl FeeTable {
    /// The exchange's published schedule.
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                FeeTier::new(50_000_000.0, "VIP 4", 0.0000, 0.0010, "Trading Credits ≥ 50M - Highest tier"),
                FeeTier::new(10_000_000.0, "VIP 3", 0.0000, 0.0015, "Trading Credits ≥ 10M"),
                FeeTier::new(5_000_000.0, "VIP 2", 0.0005, 0.0020, "Trading Credits ≥ 5M"),
                FeeTier::new(1_000_000.0, "VIP 1", 0.0010, 0.0023, "Trading Credits ≥ 1M"),
                FeeTier::new(500_000.0, "Level 5", 0.0015, 0.0023, "Trading Credits ≥ 500K"),
                FeeTier::new(100_000.0, "Level 4", 0.0020, 0.0023, "Trading Credits ≥ 100K"),
                FeeTier::new(50_000.0, "Level 3", 0.0023, 0.0023, "Trading Credits ≥ 50K"),
                FeeTier::new(10_000.0, "Level 2", 0.0024, 0.0024, "Trading Credits ≥ 10K"),
                FeeTier::new(1_000.0, "Level 1", 0.0025, 0.0025, "Trading Credits ≥ 1K"),
                FeeTier::new(0.0, "Standard", 0.0025, 0.0025, "Standard tier - No trading credits"),
            ],
        }
    }

    pub fn tiers(&self) -> &[FeeTier] {
        &self.tiers
    }

    /// Resolve the tier for `credits`.  Negative credits land in the lowest
    /// tier.
    ///
    /// # Errors
    /// `InvalidParameter` for NaN or infinite credits.
    pub fn lookup(&self, credits: f64) -> EngineResult<FeeSchedule> {
        if !credits.is_finite() {
            return Err(EngineError::InvalidParameter(
                "trading credits must be a finite number".into(),
            ));
        }

        let tier = self
            .tiers
            .iter()
            .find(|t| credits >= t.min_credits)
            .or_else(|| self.tiers.last())
            .ok_or_else(|| EngineError::InvalidParameter("fee table is empty".into()))?;

        Ok(FeeSchedule {
            trading_credits: credits,
            level: tier.level.clone(),
            maker_fee: tier.maker_fee,
            taker_fee: tier.taker_fee,
            description: tier.description.clone(),
        })
    }

    /// Tier rank for `credits` (0 = Standard); higher is better.
    pub fn tier_rank(&self, credits: f64) -> usize {
        self.tiers
            .iter()
            .position(|t| credits >= t.min_credits)
            .map_or(0, |i| self.tiers.len() - 1 - i)
    }
}
