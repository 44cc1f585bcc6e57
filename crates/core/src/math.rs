//! Fixed-point helpers
//!
//! All prices are unsigned integers carrying a fixed number of fractional
//! digits. Every helper is checked and returns `None` on overflow or
//! division by zero.

use alloy_primitives::U256;

/// Basis points in one whole
pub const BPS: u32 = 10_000;

/// 10^exp
pub fn pow10(exp: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(exp))
}

/// Re-express `value` carrying `from` fractional digits with `to` digits.
/// Scaling down truncates.
pub fn scale(value: U256, from: u8, to: u8) -> Option<U256> {
    if from == to {
        Some(value)
    } else if from < to {
        value.checked_mul(pow10(to - from)?)
    } else {
        value.checked_div(pow10(from - to)?)
    }
}

/// a * b / denominator, truncating
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    a.checked_mul(b).map(|product| product / denominator)
}

/// |value - benchmark| in basis points of `benchmark`
pub fn deviation_bps(value: U256, benchmark: U256) -> Option<U256> {
    let diff = if value > benchmark {
        value - benchmark
    } else {
        benchmark - value
    };
    mul_div(diff, U256::from(BPS), benchmark)
}
