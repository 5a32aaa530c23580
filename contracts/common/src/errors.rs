//! Error Types for the EXA Pool
//!
//! Every failure is detected before any state is touched, so an error
//! always means "nothing happened". Variants carry the numeric operands
//! of the failure so callers can decide whether to resubmit.

use thiserror::Error;

use crate::types::{Address, U256};

/// Result type alias for pool operations
pub type ExaResult<T> = Result<T, ExaError>;

/// Main error enum for all pool, token and feed errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExaError {
    // ============ Amount Errors ============
    /// Zero principal amount
    #[error("amount is zero")]
    AmountIsZero,

    /// Requested more than the caller holds or has approved
    #[error("not enough amount: requested {requested}, available {available}")]
    NotEnoughAmount { requested: U256, available: U256 },

    /// `transfer_from` beyond the approved allowance
    #[error("insufficient allowance: requested {requested}, available {available}")]
    InsufficientAllowance { requested: U256, available: U256 },

    // ============ Address Errors ============
    /// Recipient or new team is the null address
    #[error("address is zero")]
    AddressZero,

    // ============ Authorization Errors ============
    /// Team-restricted operation called by someone else
    #[error("sender is not team")]
    SenderIsNotTeam,

    /// Caller is not the expected account
    #[error("unauthorized: expected {}, got {}", short_hex(expected), short_hex(actual))]
    Unauthorized { expected: Address, actual: Address },

    /// Only the admin can perform this action
    #[error("admin only")]
    AdminOnly,

    /// Mint not authorized
    #[error("mint not authorized for {}", short_hex(caller))]
    MintUnauthorized { caller: Address },

    /// Burn not authorized
    #[error("burn not authorized for {}", short_hex(caller))]
    BurnUnauthorized { caller: Address },

    // ============ Ledger Errors ============
    /// Exchange rate truncated to a value that cannot mint or redeem
    #[error("degenerate rate: total shares {total_shares}, total underlying {total_underlying}")]
    DegenerateRate {
        total_shares: U256,
        total_underlying: U256,
    },

    /// Donation while no shares are outstanding
    #[error("pool has no outstanding shares")]
    EmptyPool,

    /// Share token supply no longer mirrors the ledger
    #[error("conservation violated: ledger shares {ledger_shares}, token supply {token_supply}")]
    ConservationViolated {
        ledger_shares: U256,
        token_supply: U256,
    },

    // ============ Oracle Errors ============
    /// Oracle rate is stale
    #[error("oracle stale: updated at {last_update_block}, now {current_block}, max age {max_age}")]
    OracleStale {
        last_update_block: u64,
        current_block: u64,
        max_age: u64,
    },

    /// Rate update moved too far from the previous rate
    #[error("oracle deviation: {old_rate} -> {new_rate} exceeds {max_deviation_bps} bps")]
    OraclePriceDeviation {
        old_rate: U256,
        new_rate: U256,
        max_deviation_bps: u64,
    },

    /// Oracle has never been updated
    #[error("oracle not initialized")]
    OracleNotInitialized,

    /// Pool was deployed without an alternate asset or price feed
    #[error("alternate asset not configured")]
    AlternateAssetNotConfigured,

    // ============ Math Errors ============
    /// Conversion division would divide by zero
    #[error("division failed: {numerator} / {denominator}")]
    DivFailed { numerator: U256, denominator: U256 },

    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow occurred
    #[error("arithmetic underflow")]
    Underflow,

    // ============ Input Validation Errors ============
    /// Invalid input parameter
    #[error("invalid {param}: {reason}")]
    InvalidInput { param: &'static str, reason: &'static str },
}

fn short_hex(address: &Address) -> String {
    address[..4].iter().map(|b| format!("{b:02x}")).collect()
}

impl ExaError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::AmountIsZero => "E001_AMOUNT_IS_ZERO",
            Self::NotEnoughAmount { .. } => "E002_NOT_ENOUGH_AMOUNT",
            Self::InsufficientAllowance { .. } => "E003_INSUFFICIENT_ALLOWANCE",
            Self::AddressZero => "E010_ADDRESS_ZERO",
            Self::SenderIsNotTeam => "E020_SENDER_NOT_TEAM",
            Self::Unauthorized { .. } => "E021_UNAUTHORIZED",
            Self::AdminOnly => "E022_ADMIN_ONLY",
            Self::MintUnauthorized { .. } => "E023_MINT_UNAUTH",
            Self::BurnUnauthorized { .. } => "E024_BURN_UNAUTH",
            Self::DegenerateRate { .. } => "E030_DEGENERATE_RATE",
            Self::EmptyPool => "E031_EMPTY_POOL",
            Self::ConservationViolated { .. } => "E032_CONSERVATION",
            Self::OracleStale { .. } => "E040_ORACLE_STALE",
            Self::OraclePriceDeviation { .. } => "E041_ORACLE_DEVIATION",
            Self::OracleNotInitialized => "E042_ORACLE_NOT_INIT",
            Self::AlternateAssetNotConfigured => "E043_NO_ALTERNATE",
            Self::DivFailed { .. } => "E050_DIV_FAILED",
            Self::Overflow => "E051_OVERFLOW",
            Self::Underflow => "E052_UNDERFLOW",
            Self::InvalidInput { .. } => "E090_INVALID_INPUT",
        }
    }

    /// Returns true if resubmitting with corrected parameters can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::AmountIsZero
                | Self::NotEnoughAmount { .. }
                | Self::InsufficientAllowance { .. }
                | Self::AddressZero
                | Self::OracleStale { .. } // wait for update
                | Self::EmptyPool
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            ExaError::AmountIsZero,
            ExaError::NotEnoughAmount {
                requested: U256::from(2u64),
                available: U256::one(),
            },
            ExaError::AddressZero,
            ExaError::SenderIsNotTeam,
            ExaError::DivFailed {
                numerator: U256::from(1000u64),
                denominator: U256::zero(),
            },
            ExaError::DegenerateRate {
                total_shares: U256::zero(),
                total_underlying: U256::zero(),
            },
            ExaError::EmptyPool,
            ExaError::Overflow,
            ExaError::Underflow,
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_display_carries_operands() {
        let err = ExaError::NotEnoughAmount {
            requested: U256::from(1000u64),
            available: U256::from(10u64),
        };
        assert_eq!(err.to_string(), "not enough amount: requested 1000, available 10");

        let err = ExaError::DivFailed {
            numerator: U256::from(1000u64),
            denominator: U256::zero(),
        };
        assert_eq!(err.to_string(), "division failed: 1000 / 0");
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(ExaError::AmountIsZero.is_recoverable());
        assert!(!ExaError::SenderIsNotTeam.is_recoverable());
        assert!(!ExaError::Overflow.is_recoverable());
    }
}
