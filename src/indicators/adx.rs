// =============================================================================
// Average Directional Index (ADX) — close-only variant
// =============================================================================
//
// ADX quantifies trend **strength** regardless of direction.  Only a close
// series is available here, so every bar is treated as high = low = close.
//
// Calculation pipeline:
//   1. Per step: TR = |close - prevClose|, up = close - prevClose,
//      down = prevClose - close.  +DM = up when up > down and up > 0,
//      -DM = down when down > up and down > 0, otherwise 0.
//   2. Smooth TR, +DM and -DM with the EMA recurrence (SMA seed at index
//      period - 1, k = 2 / (period + 1)).  Warm-up slots stay at zero.
//   3. +DI = 100 * sm(+DM) / sm(TR), -DI likewise (0 when sm(TR) == 0).
//   4. DX  = 100 * |+DI - -DI| / (+DI + -DI)          (0 when the sum is 0).
//   5. ADX = last value of the smoothed DX series.
//
// Fewer than 2 * period closes yields 0: a neutral reading, not an error.
// =============================================================================

use tracing::trace;

/// Period used by the regime classifier.
pub const DEFAULT_ADX_PERIOD: usize = 14;

/// Compute the most recent ADX value from a close series.
///
/// Returns 0.0 when `period == 0` or `prices.len() < 2 * period`.
pub fn calculate_adx(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period * 2 {
        return 0.0;
    }

    // ------------------------------------------------------------------
    // Step 1: raw TR, +DM, -DM for each consecutive pair
    // ------------------------------------------------------------------
    let steps = prices.len() - 1;
    let mut tr = Vec::with_capacity(steps);
    let mut plus_dm = Vec::with_capacity(steps);
    let mut minus_dm = Vec::with_capacity(steps);

    for w in prices.windows(2) {
        let (prev_close, price) = (w[0], w[1]);
        let (high, low) = (price, price);

        tr.push(
            (high - low)
                .max((high - prev_close).abs())
                .max((low - prev_close).abs()),
        );

        let up_move = high - prev_close;
        let down_move = prev_close - low;
        plus_dm.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
    }

    // ------------------------------------------------------------------
    // Steps 2-4: smoothed DI lines and DX
    // ------------------------------------------------------------------
    let smooth_tr = ema_smooth(&tr, period);
    let smooth_plus = ema_smooth(&plus_dm, period);
    let smooth_minus = ema_smooth(&minus_dm, period);

    let dx: Vec<f64> = (0..steps)
        .map(|i| {
            let (plus_di, minus_di) = if smooth_tr[i] != 0.0 {
                (
                    100.0 * smooth_plus[i] / smooth_tr[i],
                    100.0 * smooth_minus[i] / smooth_tr[i],
                )
            } else {
                (0.0, 0.0)
            };
            let sum = plus_di + minus_di;
            if sum != 0.0 {
                100.0 * (plus_di - minus_di).abs() / sum
            } else {
                0.0
            }
        })
        .collect();

    // ------------------------------------------------------------------
    // Step 5: ADX = tail of the smoothed DX series
    // ------------------------------------------------------------------
    let adx = ema_smooth(&dx, period).last().copied().unwrap_or(0.0);
    trace!(period, adx, "ADX computed");
    adx
}

// =============================================================================
// Internal helpers
// =============================================================================

/// EMA recurrence over a full-length buffer.  Slots before `period - 1` are
/// zero; a series shorter than `period` is returned untouched.
fn ema_smooth(data: &[f64], period: usize) -> Vec<f64> {
    if data.len() < period {
        return data.to_vec();
    }

    let k = 2.0 / (period + 1) as f64;
    let mut out = vec![0.0; data.len()];
    out[period - 1] = data[..period].iter().sum::<f64>() / period as f64;
    for i in period..data.len() {
        out[i] = (data[i] - out[i - 1]) * k + out[i - 1];
    }
    out
}
