//! Oracle Module
//!
//! Converts alternate-asset deposits into base-asset value using an
//! injected rate feed.
//!
//! ## Key Features
//!
//! - **PriceFeed**: narrow interface over whatever provides the rate
//! - **Staleness**: feeds surface stale or missing rates as errors, the
//!   converter never falls back to an old value
//! - **Both Orientations**: alt-per-base (ETH/DAI) and base-per-alt (DAI/ETH)
//!
//! A zero rate is a hard failure (`DivFailed`), not something to retry.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{base, oracle};
use crate::errors::{ExaError, ExaResult};
use crate::math;
use crate::types::{pow10, RateOrientation, U256};
use crate::check;
use crate::validation::{require_available, require_positive};

// ============================================================================
// Feed Interface
// ============================================================================

/// Source of the alternate/base exchange rate
pub trait PriceFeed {
    /// Latest usable rate at `block_height`, fixed-point at `decimals()`
    ///
    /// Implementations return `OracleStale` / `OracleNotInitialized` rather
    /// than an outdated value.
    fn current_rate(&self, block_height: u64) -> ExaResult<U256>;

    /// Fixed-point precision of the rate
    fn decimals(&self) -> u8;
}

// ============================================================================
// Conversion
// ============================================================================

/// Deployment parameters for alternate-asset conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub orientation: RateOrientation,
    pub alt_decimals: u8,
    pub base_decimals: u8,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            orientation: RateOrientation::AltPerBase,
            alt_decimals: oracle::ALT_DECIMALS,
            base_decimals: base::DECIMALS,
        }
    }
}

/// Outcome of converting an alternate-asset amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    pub alt_amount: U256,
    pub rate: U256,
    pub base_amount: U256,
}

/// Converts alternate-asset amounts into base-asset equivalents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceConverter {
    config: ConversionConfig,
}

impl PriceConverter {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Base-asset value of `alt_amount`, pricing it against `feed`
    ///
    /// `available` is what the caller can actually hand over (balance
    /// capped by allowance).
    ///
    /// # Errors
    /// - `AmountIsZero` if `alt_amount` is zero or converts to zero
    /// - `NotEnoughAmount(alt_amount, available)` if the caller is short
    /// - any feed error (`OracleStale`, `OracleNotInitialized`)
    /// - `DivFailed(alt_amount, 0)` if the feed reports a zero rate
    pub fn to_base_equivalent<F: PriceFeed + ?Sized>(
        &self,
        feed: &F,
        alt_amount: U256,
        available: U256,
        block_height: u64,
    ) -> ExaResult<Conversion> {
        // 1. Amount must be positive
        require_positive(alt_amount)?;

        // 2. Caller must be able to cover it
        require_available(alt_amount, available)?;

        // 3. Query the feed
        let rate = feed.current_rate(block_height)?;

        // 4. Convert
        let base_amount = self.convert_at(alt_amount, rate, feed.decimals())?;

        debug!(%alt_amount, %rate, %base_amount, "converted alternate deposit");

        Ok(Conversion {
            alt_amount,
            rate,
            base_amount,
        })
    }

    /// Pure conversion at a known rate
    pub fn convert_at(&self, alt_amount: U256, rate: U256, feed_decimals: u8) -> ExaResult<U256> {
        require_positive(alt_amount)?;
        check!(
            !rate.is_zero(),
            ExaError::DivFailed {
                numerator: alt_amount,
                denominator: rate,
            }
        );

        let ConversionConfig {
            orientation,
            alt_decimals,
            base_decimals,
        } = self.config;

        let base_amount = match orientation {
            // base = alt * 10^(base + feed) / (rate * 10^alt)
            RateOrientation::AltPerBase => {
                let numerator = math::mul(
                    alt_amount,
                    pow10(u32::from(base_decimals) + u32::from(feed_decimals))?,
                )?;
                let denominator = math::mul(rate, pow10(u32::from(alt_decimals))?)?;
                math::div(numerator, denominator)?
            }
            // base = alt * rate * 10^base / 10^(feed + alt)
            RateOrientation::BasePerAlt => {
                let numerator = math::mul(
                    math::mul(alt_amount, rate)?,
                    pow10(u32::from(base_decimals))?,
                )?;
                math::div(
                    numerator,
                    pow10(u32::from(feed_decimals) + u32::from(alt_decimals))?,
                )?
            }
        };

        require_positive(base_amount)?;
        Ok(base_amount)
    }
}
