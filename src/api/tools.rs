// =============================================================================
// Tool Dispatch — JSON arguments in, ToolResult out
// =============================================================================
//
// Each tool reads its arguments from a JSON object, normalises them, fills
// omitted optionals from the runtime config snapshot, runs the engine and
// wraps the result record with its summary.
//
// Numeric arguments may be JSON numbers or numeric strings.  Integer
// arguments (periods, lookbacks, limits) must be whole numbers.
// =============================================================================

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::fees::FeeTable;
use crate::indicators::{atr_report, ema_report, roc_report, rsi_report};
use crate::market_data::{calculate_spread, liquidity_depth, TickerSnapshot};
use crate::normalize::{
    candle_series, market_snapshots, order_book, parse_number, price_series, symbol_series,
};
use crate::ranking::{rank_relative_strength, SkippedSymbol};
use crate::regime::check_market_regime;
use crate::risk::{calculate_position_size, PositionRequest};
use crate::runtime_config::RuntimeConfig;
use crate::screener::{screen_markets, ScreenerFilters};
use crate::signals::{detect_breakout, detect_pullback, BreakoutParams, PullbackParams};
use crate::tool_result::ToolResult;

// =============================================================================
// Catalogue
// =============================================================================

/// Name and one-line description of a tool.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
}

pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "calculate_ema",
        description: "Calculate Exponential Moving Average (EMA) from price data",
    },
    ToolSpec {
        name: "calculate_roc",
        description: "Calculate Rate of Change (ROC) percentage from price data",
    },
    ToolSpec {
        name: "calculate_rsi",
        description: "Calculate Relative Strength Index (RSI) from price data",
    },
    ToolSpec {
        name: "calculate_atr",
        description: "Calculate Average True Range (ATR) and ATR% from OHLC data",
    },
    ToolSpec {
        name: "check_market_regime",
        description: "Analyze market regime (trending vs ranging) using volatility, trend strength and ADX",
    },
    ToolSpec {
        name: "detect_breakout_signal",
        description: "Detect breakout signal when price makes new high with volume confirmation",
    },
    ToolSpec {
        name: "detect_pullback_signal",
        description: "Detect pullback signal when price touches EMA with RSI bounce and reversal candle",
    },
    ToolSpec {
        name: "calculate_relative_strength_rank",
        description: "Rank symbols by Rate of Change over a common period",
    },
    ToolSpec {
        name: "calculate_position_size",
        description: "Size a long position from balance, risk percent, entry and stop",
    },
    ToolSpec {
        name: "calculate_spread",
        description: "Calculate bid-ask spread percentage and mid price",
    },
    ToolSpec {
        name: "calculate_liquidity_depth",
        description: "Calculate total bid/ask liquidity value within a percentage range from mid price",
    },
    ToolSpec {
        name: "get_fee_schedule",
        description: "Get trading fee schedule (maker/taker rates) for a trading-credit balance",
    },
    ToolSpec {
        name: "get_market_screener",
        description: "Screen and rank THB pairs by volume, spread, and liquidity depth",
    },
];

/// Failure of a tool call.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

// =============================================================================
// Argument access
// =============================================================================

/// Borrowed view over a tool's argument object.
struct Args<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    fn from_value(val: &'a Value, empty: &'a Map<String, Value>) -> EngineResult<Self> {
        match val {
            Value::Object(map) => Ok(Self { map }),
            Value::Null => Ok(Self { map: empty }),
            other => Err(EngineError::InputShape(format!(
                "arguments must be a JSON object, got {other}"
            ))),
        }
    }

    /// Present and not `null`.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn required(&self, key: &str) -> EngineResult<&'a Value> {
        self.get(key)
            .ok_or_else(|| EngineError::InputShape(format!("{key} is required")))
    }

    fn number(&self, key: &str) -> EngineResult<Option<f64>> {
        self.get(key)
            .map(|v| {
                parse_number(v).ok_or_else(|| {
                    EngineError::InvalidParameter(format!("{key} must be a number, got {v}"))
                })
            })
            .transpose()
    }

    fn number_or(&self, key: &str, default: f64) -> EngineResult<f64> {
        Ok(self.number(key)?.unwrap_or(default))
    }

    fn required_number(&self, key: &str) -> EngineResult<f64> {
        self.number(key)?
            .ok_or_else(|| EngineError::InputShape(format!("{key} is required")))
    }

    /// Non-negative whole number.
    fn whole(&self, key: &str) -> EngineResult<Option<usize>> {
        match self.number(key)? {
            None => Ok(None),
            Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => Ok(Some(n as usize)),
            Some(n) => Err(EngineError::InvalidParameter(format!(
                "{key} must be a whole number, got {n}"
            ))),
        }
    }

    /// Whole number >= 1, falling back to `default` when absent.
    fn period(&self, key: &str, default: usize) -> EngineResult<usize> {
        let value = self.whole(key)?.unwrap_or(default);
        if value < 1 {
            return Err(EngineError::InvalidParameter(format!(
                "{key} must be greater than 0"
            )));
        }
        Ok(value)
    }

    fn required_period(&self, key: &str) -> EngineResult<usize> {
        let value = self
            .whole(key)?
            .ok_or_else(|| EngineError::InputShape(format!("{key} is required")))?;
        self.period(key, value)
    }

    fn string_or(&self, key: &str, default: &str) -> EngineResult<String> {
        match self.get(key) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(EngineError::InvalidParameter(format!(
                "{key} must be a string, got {other}"
            ))),
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Run the tool `name` with `args`.
///
/// `config` is a snapshot; the caller never holds a lock across the call.
pub fn invoke(
    name: &str,
    args: &Value,
    config: &RuntimeConfig,
    fee_table: &FeeTable,
) -> Result<ToolResult, ToolError> {
    let empty = Map::new();
    let args = Args::from_value(args, &empty)?;

    let result = match name {
        "calculate_ema" => calculate_ema(&args),
        "calculate_roc" => calculate_roc(&args, config),
        "calculate_rsi" => calculate_rsi(&args, config),
        "calculate_atr" => calculate_atr(&args, config),
        "check_market_regime" => market_regime(&args, config),
        "detect_breakout_signal" => breakout_signal(&args, config),
        "detect_pullback_signal" => pullback_signal(&args, config),
        "calculate_relative_strength_rank" => relative_strength(&args, config),
        "calculate_position_size" => position_size(&args, config),
        "calculate_spread" => spread(&args),
        "calculate_liquidity_depth" => depth(&args, config),
        "get_fee_schedule" => fee_schedule(&args, fee_table),
        "get_market_screener" => screener(&args, config),
        other => return Err(ToolError::UnknownTool(other.to_string())),
    }?;

    info!(tool = name, id = %result.id, "Tool call completed");
    Ok(result)
}

fn calculate_ema(args: &Args) -> EngineResult<ToolResult> {
    let prices = price_series(args.required("prices")?, "prices")?;
    let period = args.required_period("period")?;
    let r = ema_report(&prices, period)?;
    Ok(ToolResult::new("calculate_ema", r.summary(), &r))
}

fn calculate_roc(args: &Args, config: &RuntimeConfig) -> EngineResult<ToolResult> {
    let prices = price_series(args.required("prices")?, "prices")?;
    let period = args.period("period", config.default_roc_period)?;
    let r = roc_report(&prices, period)?;
    Ok(ToolResult::new("calculate_roc", r.summary(), &r))
}

fn calculate_rsi(args: &Args, config: &RuntimeConfig) -> EngineResult<ToolResult> {
    let prices = price_series(args.required("prices")?, "prices")?;
    let period = args.period("period", config.default_rsi_period)?;
    let r = rsi_report(&prices, period)?;
    Ok(ToolResult::new("calculate_rsi", r.summary(), &r))
}

fn calculate_atr(args: &Args, config: &RuntimeConfig) -> EngineResult<ToolResult> {
    let candles = candle_series(args.required("candles")?, "candles")?;
    let period = args.period("period", config.default_atr_period)?;
    let r = atr_report(&candles, period)?;
    Ok(ToolResult::new("calculate_atr", r.summary(), &r))
}

fn market_regime(args: &Args, config: &RuntimeConfig) -> EngineResult<ToolResult> {
    let prices = price_series(args.required("prices")?, "prices")?;
    let lookback = args.period("lookback", config.default_regime_lookback)?;
    let r = check_market_regime(&prices, lookback)?;
    Ok(ToolResult::new("check_market_regime", r.summary(), &r))
}

fn breakout_signal(args: &Args, config: &RuntimeConfig) -> EngineResult<ToolResult> {
    let candles = candle_series(args.required("candles")?, "candles")?;
    let defaults = config.breakout;
    let params = BreakoutParams {
        lookback: args.period("lookback", defaults.lookback)?,
        volume_threshold: args.number_or("volume_threshold", defaults.volume_threshold)?,
        atr_multiplier: args.number_or("atr_multiplier", defaults.atr_multiplier)?,
    };
    let r = detect_breakout(&candles, &params)?;
    Ok(ToolResult::new("detect_breakout_signal", r.summary(), &r))
}

fn pullback_signal(args: &Args, config: &RuntimeConfig) -> EngineResult<ToolResult> {
    let candles = candle_series(args.required("candles")?, "candles")?;
    let defaults = config.pullback;
    let params = PullbackParams {
        ema_period: args.period("ema_period", defaults.ema_period)?,
        rsi_period: args.period("rsi_period", defaults.rsi_period)?,
        rsi_min: args.number_or("rsi_min", defaults.rsi_min)?,
        rsi_max: args.number_or("rsi_max", defaults.rsi_max)?,
    };
    let r = detect_pullback(&candles, &params)?;
    Ok(ToolResult::new("detect_pullback_signal", r.summary(), &r))
}

fn relative_strength(args: &Args, config: &RuntimeConfig) -> EngineResult<ToolResult> {
    let (series, malformed) = symbol_series(args.required("symbols")?, "symbols")?;
    let period = args.period("period", config.default_roc_period)?;
    let benchmark = args.string_or("benchmark", &config.default_benchmark)?;

    let mut r = rank_relative_strength(&series, period, &benchmark)?;
    r.skipped.extend(malformed.into_iter().map(|symbol| SkippedSymbol {
        symbol,
        reason: "price series is not an array of numbers".to_string(),
    }));
    r.skipped.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    Ok(ToolResult::new("calculate_relative_strength_rank", r.summary(), &r))
}

fn position_size(args: &Args, config: &RuntimeConfig) -> EngineResult<ToolResult> {
    let req = PositionRequest {
        balance: args.required_number("balance")?,
        risk_percent: args.required_number("risk_percent")?,
        entry: args.required_number("entry")?,
        stop: args.required_number("stop")?,
        maker_fee_pct: Some(args.number_or("maker_fee", config.default_maker_fee_pct)?),
        taker_fee_pct: Some(args.number_or("taker_fee", config.default_taker_fee_pct)?),
    };
    let r = calculate_position_size(&req)?;
    Ok(ToolResult::new("calculate_position_size", r.summary(), &r))
}

fn spread(args: &Args) -> EngineResult<ToolResult> {
    let r = match args.get("ticker") {
        Some(raw) => {
            let ticker: TickerSnapshot = serde_json::from_value(raw.clone())
                .map_err(|e| EngineError::InputShape(format!("ticker: {e}")))?;
            ticker.spread()?
        }
        None => calculate_spread(args.required_number("bid")?, args.required_number("ask")?)?,
    };
    Ok(ToolResult::new("calculate_spread", r.summary(), &r))
}

fn depth(args: &Args, config: &RuntimeConfig) -> EngineResult<ToolResult> {
    let book = order_book(args.required("orderbook")?, "orderbook")?;
    let range_percent = args.number_or("range_percent", config.default_range_percent)?;
    let mid = args.number("mid_price")?;
    let r = liquidity_depth(&book, range_percent, mid)?;
    Ok(ToolResult::new("calculate_liquidity_depth", r.summary(), &r))
}

fn fee_schedule(args: &Args, fee_table: &FeeTable) -> EngineResult<ToolResult> {
    let credits = args.required_number("trading_credits")?;
    let r = fee_table.lookup(credits)?;
    Ok(ToolResult::new("get_fee_schedule", r.summary(), &r))
}

fn screener(args: &Args, config: &RuntimeConfig) -> EngineResult<ToolResult> {
    let markets = market_snapshots(args.required("markets")?, "markets")?;
    let defaults = config.screener;
    let filters = ScreenerFilters {
        min_volume_24h: args.number_or("min_volume_24h", defaults.min_volume_24h)?,
        max_spread: args.number_or("max_spread", defaults.max_spread)?,
        min_depth: args.number_or("min_depth", defaults.min_depth)?,
        limit: args.whole("limit")?.unwrap_or(defaults.limit),
    };
    let r = screen_markets(&markets, &filters)?;
    Ok(ToolResult::new("get_market_screener", r.summary(), &r))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: Value) -> Result<ToolResult, ToolError> {
        invoke(name, &args, &RuntimeConfig::default(), &FeeTable::standard())
    }

    fn engine_kind(err: ToolError) -> &'static str {
        match err {
            ToolError::Engine(e) => e.kind(),
            ToolError::UnknownTool(_) => "unknown_tool",
        }
    }

    #[test]
    fn every_catalogued_tool_dispatches() {
        // With no arguments every tool must fail on input, never as unknown.
        for spec in TOOLS {
            match call(spec.name, Value::Null) {
                Err(ToolError::UnknownTool(_)) => panic!("{} is not dispatched", spec.name),
                _ => {}
            }
        }
    }

    #[test]
    fn unknown_tool() {
        assert!(matches!(
            call("get_wallet_balance", json!({})),
            Err(ToolError::UnknownTool(_))
        ));
    }

    #[test]
    fn ema_tool() {
        let r = call("calculate_ema", json!({"prices": [1, 2, 3, 4, 5], "period": 3})).unwrap();
        assert_eq!(r.tool, "calculate_ema");
        assert_eq!(r.data["ema"], json!([2.0, 3.0, 4.0]));
        assert_eq!(r.data["trend"], "bullish");
    }

    #[test]
    fn ema_requires_period() {
        let err = call("calculate_ema", json!({"prices": [1, 2, 3]})).unwrap_err();
        assert_eq!(engine_kind(err), "input_shape");
    }

    #[test]
    fn fractional_period_rejected() {
        let err = call("calculate_rsi", json!({"prices": [1, 2, 3], "period": 1.5})).unwrap_err();
        assert_eq!(engine_kind(err), "invalid_parameter");
    }

    #[test]
    fn rsi_uses_config_default_period() {
        let prices: Vec<f64> = (1..=15).map(f64::from).collect();
        let r = call("calculate_rsi", json!({ "prices": prices })).unwrap();
        assert_eq!(r.data["period"], 14);
        assert_eq!(r.data["rsi"], 100.0);
    }

    #[test]
    fn position_size_accepts_strings() {
        let r = call(
            "calculate_position_size",
            json!({"balance": "10000", "risk_percent": "1", "entry": 100, "stop": "95"}),
        )
        .unwrap();
        assert_eq!(r.data["qty"], 20.0);
        assert_eq!(r.data["total_fee_pct"], 0.5);
    }

    #[test]
    fn position_size_rejects_garbage_number() {
        let err = call(
            "calculate_position_size",
            json!({"balance": "lots", "risk_percent": 1, "entry": 100, "stop": 95}),
        )
        .unwrap_err();
        assert_eq!(engine_kind(err), "invalid_parameter");
    }

    #[test]
    fn spread_from_bid_ask_or_ticker() {
        let a = call("calculate_spread", json!({"bid": 99, "ask": 101})).unwrap();
        assert_eq!(a.data["spread_percent"], 2.0);
        let b = call(
            "calculate_spread",
            json!({"ticker": {"highest_bid": 99, "lowest_ask": 101}}),
        )
        .unwrap();
        assert_eq!(b.data["mid"], 100.0);
    }

    #[test]
    fn depth_tool() {
        let r = call(
            "calculate_liquidity_depth",
            json!({"orderbook": {"bids": [[100, 1], [99, 2]], "asks": [[101, 1], [102, 2]]}}),
        )
        .unwrap();
        assert_eq!(r.data["total_liquidity"], 201.0);
    }

    #[test]
    fn fee_tool() {
        let r = call("get_fee_schedule", json!({"trading_credits": 75000})).unwrap();
        assert_eq!(r.data["level"], "Level 3");
    }

    #[test]
    fn ranking_reports_malformed_symbols() {
        let r = call(
            "calculate_relative_strength_rank",
            json!({"symbols": {"a_thb": [1, 2], "b_thb": [1, "x"]}, "period": 1}),
        )
        .unwrap();
        assert_eq!(r.data["top3"], json!(["a_thb"]));
        assert_eq!(r.data["benchmark"], "btc_thb");
        assert_eq!(r.data["skipped"][0]["symbol"], "b_thb");
    }

    #[test]
    fn non_object_arguments_rejected() {
        let err = call("calculate_rsi", json!([1, 2, 3])).unwrap_err();
        assert_eq!(engine_kind(err), "input_shape");
    }
}
