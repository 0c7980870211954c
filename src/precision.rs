// =============================================================================
// Output Rounding
// =============================================================================
//
// Every figure leaves the engine rounded: 8 places for raw monetary and
// quantity values, 2 for percentages and display figures.  `f64::round`
// rounds half away from zero, which is the contract callers rely on.

/// Decimal places for raw monetary / quantity figures.
pub const RAW_DP: u32 = 8;
/// Decimal places for percentages and display figures.
pub const DISPLAY_DP: u32 = 2;

/// Round `value` to `places` decimal places, half away from zero.
///
/// Magnitudes too large to scale are returned as-is; they carry no
/// fractional digits anyway.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Round to [`RAW_DP`] places.
pub fn round_raw(value: f64) -> f64 {
    round_to(value, RAW_DP)
}

/// Round to [`DISPLAY_DP`] places.
pub fn round_display(value: f64) -> f64 {
    round_to(value, DISPLAY_DP)
}
