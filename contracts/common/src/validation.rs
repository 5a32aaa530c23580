//! Validation Helpers for the EXA Pool
//!
//! Reusable precondition checks shared by the pool, token and feed crates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use exa_common::check;
//! use exa_common::validation::{require_positive, require_available};
//!
//! check!(amount <= balance, ExaError::NotEnoughAmount { requested: amount, available: balance });
//!
//! require_positive(amount)?;
//! require_available(amount, balance)?;
//! ```

use crate::errors::{ExaError, ExaResult};
use crate::types::{is_zero_address, Address, U256};

// ============ Validation Macro ============

/// Check a condition and return an error if it fails.
///
/// # Examples
///
/// ```rust,ignore
/// use exa_common::check;
///
/// check!(!amount.is_zero(), ExaError::AmountIsZero);
/// ```
#[macro_export]
macro_rules! check {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error);
        }
    };
}

pub use check;

// ============ Amount Checks ============

/// Fails with `AmountIsZero` on a zero amount
pub fn require_positive(amount: U256) -> ExaResult<()> {
    check!(!amount.is_zero(), ExaError::AmountIsZero);
    Ok(())
}

/// Fails with `NotEnoughAmount(requested, available)` if `requested > available`
pub fn require_available(requested: U256, available: U256) -> ExaResult<()> {
    check!(
        requested <= available,
        ExaError::NotEnoughAmount { requested, available }
    );
    Ok(())
}

// ============ Address Checks ============

/// Fails with `AddressZero` for the null address
pub fn require_address(address: &Address) -> ExaResult<()> {
    check!(!is_zero_address(address), ExaError::AddressZero);
    Ok(())
}

// ============ Conservation ============

/// The share token's supply must mirror the ledger's share total exactly
pub fn require_supply_mirror(ledger_shares: U256, token_supply: U256) -> ExaResult<()> {
    check!(
        ledger_shares == token_supply,
        ExaError::ConservationViolated {
            ledger_shares,
            token_supply,
        }
    );
    Ok(())
}
