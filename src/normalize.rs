// =============================================================================
// Input Normalisation — JSON values to engine inputs
// =============================================================================
//
// Every caller-supplied series passes through here once, before any
// computation, and comes out as plain `f64`s.  The strictness differs by
// shape:
//
//   price arrays    any non-numeric element fails the whole call
//   candle arrays   malformed candle objects are skipped individually
//   symbol maps     a symbol whose series is malformed is skipped
//   order books     malformed [price, amount] levels are skipped
// =============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::market_data::{Candle, OrderBook, OrderBookLevel, TickerSnapshot};
use crate::screener::MarketSnapshot;

/// Read a JSON number, or a string holding one, as `f64`.
pub fn parse_number(val: &Value) -> Option<f64> {
    match val {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Strict price series: a JSON array whose every element is a number.
///
/// # Errors
/// `InputShape` when `val` is not an array or any element is not a number.
pub fn price_series(val: &Value, field: &str) -> EngineResult<Vec<f64>> {
    let items = val
        .as_array()
        .ok_or_else(|| EngineError::InputShape(format!("{field} must be an array of numbers")))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_f64().ok_or_else(|| {
                EngineError::InputShape(format!("{field}[{i}] is not a number: {item}"))
            })
        })
        .collect()
}

/// One candle object; `None` unless high, low and close are positive numbers.
fn candle_from(val: &Value) -> Option<Candle> {
    let obj = val.as_object()?;
    let field = |key: &str| obj.get(key).and_then(Value::as_f64).filter(|v| *v > 0.0);

    let candle = Candle::new(field("high")?, field("low")?, field("close")?);
    Some(match obj.get("volume").and_then(Value::as_f64) {
        Some(v) => candle.with_volume(v),
        None => candle,
    })
}

/// Lenient candle series.  Malformed entries are dropped.
///
/// # Errors
/// `InputShape` when `val` is not an array at all.
pub fn candle_series(val: &Value, field: &str) -> EngineResult<Vec<Candle>> {
    let items = val
        .as_array()
        .ok_or_else(|| EngineError::InputShape(format!("{field} must be an array of candles")))?;

    let candles: Vec<Candle> = items.iter().filter_map(candle_from).collect();
    let dropped = items.len() - candles.len();
    if dropped > 0 {
        warn!(field, dropped, kept = candles.len(), "Skipped malformed candles");
    }
    Ok(candles)
}

/// Symbol -> price series map.  Returns the well-formed series plus the
/// names of symbols that were skipped.
///
/// # Errors
/// `InputShape` when `val` is not a JSON object.
pub fn symbol_series(val: &Value, field: &str) -> EngineResult<(BTreeMap<String, Vec<f64>>, Vec<String>)> {
    let obj = val.as_object().ok_or_else(|| {
        EngineError::InputShape(format!("{field} must be an object of symbol: prices pairs"))
    })?;

    let mut series = BTreeMap::new();
    let mut malformed = Vec::new();
    for (symbol, prices) in obj {
        match price_series(prices, symbol) {
            Ok(p) => {
                series.insert(symbol.clone(), p);
            }
            Err(e) => {
                warn!(%symbol, error = %e, "Skipped malformed symbol series");
                malformed.push(symbol.clone());
            }
        }
    }
    Ok((series, malformed))
}

/// A `[price, amount]` pair or a `{price, amount}` object.
fn level_from(val: &Value) -> Option<OrderBookLevel> {
    let (price, amount) = match val {
        Value::Array(pair) if pair.len() >= 2 => (parse_number(&pair[0])?, parse_number(&pair[1])?),
        Value::Object(obj) => (
            parse_number(obj.get("price")?)?,
            parse_number(obj.get("amount")?)?,
        ),
        _ => return None,
    };
    Some(OrderBookLevel::new(price, amount))
}

fn levels(val: Option<&Value>) -> Vec<OrderBookLevel> {
    val.and_then(Value::as_array)
        .map(|items| items.iter().filter_map(level_from).collect())
        .unwrap_or_default()
}

/// Order book from `{"bids": [[p, a], ...], "asks": [[p, a], ...]}`.
///
/// # Errors
/// `InputShape` when `val` is not an object.
pub fn order_book(val: &Value, field: &str) -> EngineResult<OrderBook> {
    let obj = val
        .as_object()
        .ok_or_else(|| EngineError::InputShape(format!("{field} must be an object with bids and asks")))?;
    Ok(OrderBook::new(levels(obj.get("bids")), levels(obj.get("asks"))))
}

/// Screener snapshots.  Order books go through [`order_book`] so the level
/// format matches the depth tool.
///
/// # Errors
/// `InputShape` when `val` is not an array or an entry lacks a symbol or a
/// ticker object.
pub fn market_snapshots(val: &Value, field: &str) -> EngineResult<Vec<MarketSnapshot>> {
    let items = val
        .as_array()
        .ok_or_else(|| EngineError::InputShape(format!("{field} must be an array of market snapshots")))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let symbol = item
                .get("symbol")
                .and_then(Value::as_str)
                .ok_or_else(|| EngineError::InputShape(format!("{field}[{i}].symbol is required")))?;
            let raw_ticker = item
                .get("ticker")
                .ok_or_else(|| EngineError::InputShape(format!("{field}[{i}].ticker is required")))?;
            let ticker: TickerSnapshot = serde_json::from_value(raw_ticker.clone())
                .map_err(|e| EngineError::InputShape(format!("{field}[{i}].ticker: {e}")))?;
            let book = match item.get("book") {
                Some(b) => order_book(b, "book")?,
                None => OrderBook::default(),
            };
            Ok(MarketSnapshot {
                symbol: symbol.to_string(),
                status: item.get("status").and_then(Value::as_str).map(str::to_string),
                ticker,
                book,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_and_floats_become_f64() {
        let prices = price_series(&json!([1, 2.5, 3]), "prices").unwrap();
        assert_eq!(prices, vec![1.0, 2.5, 3.0]);
    }

    #[test]
    fn any_bad_price_fails_the_call() {
        let err = price_series(&json!([1, "2", 3]), "prices").unwrap_err();
        assert_eq!(err.kind(), "input_shape");
        assert!(err.to_string().contains("prices[1]"));
        assert!(price_series(&json!({"a": 1}), "prices").is_err());
    }

    #[test]
    fn malformed_candles_are_skipped() {
        let raw = json!([
            {"high": 11, "low": 9, "close": 10, "volume": 5},
            {"high": 11, "low": 9},
            {"high": "11", "low": 9, "close": 10},
            {"high": 11, "low": 0, "close": 10},
            "not a candle",
            {"high": 12.5, "low": 10, "close": 12}
        ]);
        let candles = candle_series(&raw, "candles").unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].volume, Some(5.0));
        assert_eq!(candles[1].volume, None);
        assert_eq!(candles[1].high, 12.5);
    }

    #[test]
    fn candles_must_be_an_array() {
        assert_eq!(
            candle_series(&json!("x"), "candles").unwrap_err().kind(),
            "input_shape"
        );
    }

    #[test]
    fn symbol_map_skips_bad_symbols() {
        let raw = json!({"btc_thb": [1, 2, 3], "bad_thb": [1, "x"], "eth_thb": [4.5]});
        let (series, malformed) = symbol_series(&raw, "symbols").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series["eth_thb"], vec![4.5]);
        assert_eq!(malformed, vec!["bad_thb".to_string()]);
    }

    #[test]
    fn order_book_levels() {
        let raw = json!({
            "bids": [[100, 1], ["99.5", "2"], [98], "junk"],
            "asks": [{"price": 101, "amount": 1.5}]
        });
        let book = order_book(&raw, "orderbook").unwrap();
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.bids[1], OrderBookLevel::new(99.5, 2.0));
        assert_eq!(book.asks[0].amount, 1.5);
    }

    #[test]
    fn parse_number_accepts_strings() {
        assert_eq!(parse_number(&json!("1.25")), Some(1.25));
        assert_eq!(parse_number(&json!(3)), Some(3.0));
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!(null)), None);
    }

    #[test]
    fn snapshots() {
        let raw = json!([{
            "symbol": "btc_thb",
            "ticker": {"last": 100, "highest_bid": 99, "lowest_ask": 101, "base_volume": 10},
            "book": {"bids": [[99, 1]], "asks": [[101, 1]]}
        }]);
        let snaps = market_snapshots(&raw, "markets").unwrap();
        assert_eq!(snaps[0].ticker.highest_bid, 99.0);
        assert_eq!(snaps[0].book.asks.len(), 1);
        assert!(market_snapshots(&json!([{"symbol": "x"}]), "markets").is_err());
    }
}
