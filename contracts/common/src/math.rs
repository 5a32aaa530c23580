//! Mathematical Utilities for the EXA Pool
//!
//! Checked U256 arithmetic. Nothing here wraps: every helper either
//! returns the exact result or the error naming what went wrong.

use crate::constants::oracle::BPS_DENOMINATOR;
use crate::errors::{ExaError, ExaResult};
use crate::types::U256;

/// `a + b`, failing with `Overflow`
pub fn add(a: U256, b: U256) -> ExaResult<U256> {
    a.checked_add(b).ok_or(ExaError::Overflow)
}

/// `a - b`, failing with `Underflow`
pub fn sub(a: U256, b: U256) -> ExaResult<U256> {
    a.checked_sub(b).ok_or(ExaError::Underflow)
}

/// `a * b`, failing with `Overflow`
pub fn mul(a: U256, b: U256) -> ExaResult<U256> {
    a.checked_mul(b).ok_or(ExaError::Overflow)
}

/// `numerator / denominator` truncating toward zero
///
/// A zero denominator fails with `DivFailed` carrying both operands.
pub fn div(numerator: U256, denominator: U256) -> ExaResult<U256> {
    numerator
        .checked_div(denominator)
        .ok_or(ExaError::DivFailed { numerator, denominator })
}

/// `a * b / c` with an overflow-checked intermediate product
pub fn mul_div(a: U256, b: U256, c: U256) -> ExaResult<U256> {
    div(mul(a, b)?, c)
}

/// Shares outstanding per unit of underlying, truncated
///
/// Zero when the pool holds no underlying.
pub fn units_per_share(total_shares: U256, total_underlying: U256) -> U256 {
    if total_underlying.is_zero() {
        return U256::zero();
    }
    total_shares / total_underlying
}

/// Absolute difference
pub fn abs_diff(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Deviation between two rates in basis points
///
/// Returns 100% when there is no previous rate.
/// 100 bps = 1%, 10000 bps = 100%
pub fn deviation_bps(old_rate: U256, new_rate: U256) -> ExaResult<U256> {
    if old_rate.is_zero() {
        return Ok(U256::from(BPS_DENOMINATOR));
    }
    mul_div(abs_diff(old_rate, new_rate), U256::from(BPS_DENOMINATOR), old_rate)
}
