// =============================================================================
// Runtime Configuration — Tool defaults with atomic save
// =============================================================================
//
// Every default a tool falls back to when the caller omits an argument lives
// here, so the defaults can be changed at runtime without a restart.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ensure_period, EngineError, EngineResult};
use crate::ranking::DEFAULT_BENCHMARK;
use crate::regime::detector::{DEFAULT_LOOKBACK, MIN_LOOKBACK};
use crate::risk::DEFAULT_FEE_PCT;
use crate::screener::ScreenerFilters;
use crate::signals::{BreakoutParams, PullbackParams};

/// Config file used when `KUB_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "kub_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_indicator_period() -> usize {
    14
}

fn default_regime_lookback() -> usize {
    DEFAULT_LOOKBACK
}

fn default_range_percent() -> f64 {
    1.0
}

fn default_benchmark() -> String {
    DEFAULT_BENCHMARK.to_string()
}

fn default_fee_pct() -> f64 {
    DEFAULT_FEE_PCT
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Server -------------------------------------------------------------

    /// Listen address for the HTTP tool surface.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Indicator defaults -------------------------------------------------

    #[serde(default = "default_indicator_period")]
    pub default_rsi_period: usize,

    #[serde(default = "default_indicator_period")]
    pub default_roc_period: usize,

    #[serde(default = "default_indicator_period")]
    pub default_atr_period: usize,

    #[serde(default = "default_regime_lookback")]
    pub default_regime_lookback: usize,

    // --- Signal detectors ---------------------------------------------------

    #[serde(default)]
    pub breakout: BreakoutParams,

    #[serde(default)]
    pub pullback: PullbackParams,

    // --- Market structure ---------------------------------------------------

    /// Band (percent either side of mid) for the liquidity depth tool.
    #[serde(default = "default_range_percent")]
    pub default_range_percent: f64,

    /// Benchmark label attached to relative-strength rankings.
    #[serde(default = "default_benchmark")]
    pub default_benchmark: String,

    #[serde(default)]
    pub screener: ScreenerFilters,

    // --- Fees ---------------------------------------------------------------

    /// Maker fee (percent) assumed by position sizing.
    #[serde(default = "default_fee_pct")]
    pub default_maker_fee_pct: f64,

    /// Taker fee (percent) assumed by position sizing.
    #[serde(default = "default_fee_pct")]
    pub default_taker_fee_pct: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            default_rsi_period: default_indicator_period(),
            default_roc_period: default_indicator_period(),
            default_atr_period: default_indicator_period(),
            default_regime_lookback: default_regime_lookback(),
            breakout: BreakoutParams::default(),
            pullback: PullbackParams::default(),
            default_range_percent: default_range_percent(),
            default_benchmark: default_benchmark(),
            screener: ScreenerFilters::default(),
            default_maker_fee_pct: default_fee_pct(),
            default_taker_fee_pct: default_fee_pct(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid runtime config in {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply a partial JSON update: keys present in `patch` replace the
    /// current values, everything else is kept.
    pub fn merged(&self, patch: &serde_json::Value) -> Result<Self> {
        let mut current = serde_json::to_value(self).context("failed to serialise runtime config")?;
        merge_json(&mut current, patch);
        let updated: Self =
            serde_json::from_value(current).context("invalid runtime config update")?;
        updated.validate().context("invalid runtime config update")?;
        Ok(updated)
    }

    /// Check every default against the domain the tools enforce, so a
    /// stored default can never make an argument-less call fail.
    pub fn validate(&self) -> EngineResult<()> {
        ensure_period(self.default_rsi_period, "default_rsi_period")?;
        ensure_period(self.default_roc_period, "default_roc_period")?;
        ensure_period(self.default_atr_period, "default_atr_period")?;
        if self.default_regime_lookback < MIN_LOOKBACK {
            return Err(EngineError::InvalidParameter(format!(
                "default_regime_lookback must be at least {MIN_LOOKBACK}"
            )));
        }

        self.breakout.validate()?;
        self.pullback.validate()?;
        self.screener.validate()?;

        let positive = [
            ("default_range_percent", self.default_range_percent),
            ("default_maker_fee_pct", self.default_maker_fee_pct),
            ("default_taker_fee_pct", self.default_taker_fee_pct),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::InvalidParameter(format!(
                    "{name} must be a positive number"
                )));
            }
        }
        Ok(())
    }
}

/// Recursive object merge; non-object values in `patch` overwrite.
fn merge_json(target: &mut serde_json::Value, patch: &serde_json::Value) {
    match (target, patch) {
        (serde_json::Value::Object(dst), serde_json::Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        dst.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (dst, src) => *dst = src.clone(),
    }
}
