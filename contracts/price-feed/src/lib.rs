//! Price Feed Contract
//!
//! Provides the alternate/base exchange rate (e.g. ETH/DAI) the pool uses
//! to value alternate-asset deposits.
//!
//! ## Trusted Operator Model
//!
//! - Only the operator can post a new rate
//! - Only the admin can rotate the operator
//! - Each update may move the rate by at most `max_deviation_bps`
//! - Readings older than `max_age_blocks` are refused, never served stale
//!
//! [`FixedRateFeed`] is a deterministic stand-in with none of these guards,
//! for tests and local simulations.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::info;

use exa_common::{
    access_control::{require_admin, require_caller},
    check,
    constants::oracle::{FEED_DECIMALS, MAX_RATE_AGE_BLOCKS, MAX_RATE_DEVIATION_BPS},
    errors::{ExaError, ExaResult},
    events::{EventLog, ExaEvent},
    math::deviation_bps,
    oracle::PriceFeed,
    types::{Address, CallContext, U256},
    validation::{require_address, require_positive},
};

// ============ Feed Parameters ============

/// Tunable guards, deserializable from deployment config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(default)]
pub struct FeedParams {
    /// Fixed-point precision of the rate
    pub decimals: u8,
    /// Blocks after which a reading is stale
    pub max_age_blocks: u64,
    /// Largest move allowed per update
    pub max_deviation_bps: u64,
}

impl Default for FeedParams {
    fn default() -> Self {
        Self {
            decimals: FEED_DECIMALS,
            max_age_blocks: MAX_RATE_AGE_BLOCKS,
            max_deviation_bps: MAX_RATE_DEVIATION_BPS,
        }
    }
}

// ============ Feed State ============

/// Feed contract state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FeedState {
    /// Current rate (zero until the first update)
    pub rate: U256,
    /// Block of the last update
    pub updated_block: u64,
    /// Authorized operator (can update the rate)
    pub operator: Address,
    /// Admin (can change operator)
    pub admin: Address,
    /// Guards
    pub params: FeedParams,
}

impl FeedState {
    /// Create a feed with no rate yet
    pub fn new(admin: Address, operator: Address, params: FeedParams) -> Self {
        Self {
            rate: U256::zero(),
            updated_block: 0,
            operator,
            admin,
            params,
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.rate.is_zero()
    }

    pub fn is_stale(&self, current_block: u64) -> bool {
        current_block.saturating_sub(self.updated_block) > self.params.max_age_blocks
    }
}

// ============ Actions ============

/// Operations the feed accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum FeedAction {
    UpdateRate { rate: U256 },
    SetOperator { operator: Address },
}

/// Operator-updated rate feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateFeed {
    state: FeedState,
    events: EventLog,
}

impl RateFeed {
    pub fn new(state: FeedState) -> Self {
        Self {
            state,
            events: EventLog::new(),
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Main entry point for feed operations
    pub fn execute(&mut self, ctx: &CallContext, action: &FeedAction) -> ExaResult<()> {
        match action {
            FeedAction::UpdateRate { rate } => self.update_rate(ctx, *rate),
            FeedAction::SetOperator { operator } => self.set_operator(ctx, operator),
        }
    }

    /// Post a new rate
    pub fn update_rate(&mut self, ctx: &CallContext, new_rate: U256) -> ExaResult<()> {
        // 1. Only operator can update the rate
        require_caller(&self.state.operator, &ctx.caller)?;

        // 2. Rate must be positive
        require_positive(new_rate)?;

        // 3. Check deviation (the first rate is accepted as-is)
        let old_rate = self.state.rate;
        if self.state.is_initialized() {
            let deviation = deviation_bps(old_rate, new_rate)?;
            check!(
                deviation <= U256::from(self.state.params.max_deviation_bps),
                ExaError::OraclePriceDeviation {
                    old_rate,
                    new_rate,
                    max_deviation_bps: self.state.params.max_deviation_bps,
                }
            );
        }

        // 4. Apply
        self.state.rate = new_rate;
        self.state.updated_block = ctx.block_height;

        info!(%old_rate, %new_rate, block = ctx.block_height, "rate updated");

        // 5. Emit event
        self.events.emit(ExaEvent::RateUpdated {
            old_rate,
            new_rate,
            block_height: ctx.block_height,
        });
        Ok(())
    }

    /// Rotate the operator
    pub fn set_operator(&mut self, ctx: &CallContext, new_operator: &Address) -> ExaResult<()> {
        // 1. Only admin can change operator
        require_admin(&self.state.admin, &ctx.caller)?;

        // 2. New operator must be a real, different address
        require_address(new_operator)?;
        check!(
            *new_operator != self.state.operator,
            ExaError::InvalidInput {
                param: "operator",
                reason: "same as current",
            }
        );

        let old_operator = self.state.operator;
        self.state.operator = *new_operator;

        // 3. Emit event
        self.events.emit(ExaEvent::FeedOperatorChanged {
            old_operator,
            new_operator: *new_operator,
            block_height: ctx.block_height,
        });
        Ok(())
    }
}

// ============ Query Functions ============

/// Get the current rate
///
/// # Errors
/// - `OracleNotInitialized` if no rate has been posted
/// - `OracleStale` if the rate is older than `max_age_blocks`
pub fn get_rate(state: &FeedState, current_block: u64) -> ExaResult<U256> {
    check!(state.is_initialized(), ExaError::OracleNotInitialized);
    check!(
        !state.is_stale(current_block),
        ExaError::OracleStale {
            last_update_block: state.updated_block,
            current_block,
            max_age: state.params.max_age_blocks,
        }
    );
    Ok(state.rate)
}

/// Check if the rate is fresh (posted and not stale)
pub fn is_rate_fresh(state: &FeedState, current_block: u64) -> bool {
    state.is_initialized() && !state.is_stale(current_block)
}

impl PriceFeed for RateFeed {
    fn current_rate(&self, block_height: u64) -> ExaResult<U256> {
        get_rate(&self.state, block_height)
    }

    fn decimals(&self) -> u8 {
        self.state.params.decimals
    }
}

// ============ Fixed Rate Feed ============

/// Deterministic feed returning whatever rate it was last given
///
/// Accepts a zero rate so callers can exercise the broken-oracle path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedRateFeed {
    pub rate: U256,
    pub decimals: u8,
}

impl FixedRateFeed {
    pub fn new(rate: U256, decimals: u8) -> Self {
        Self { rate, decimals }
    }

    pub fn set_rate(&mut self, rate: U256) {
        self.rate = rate;
    }
}

impl PriceFeed for FixedRateFeed {
    fn current_rate(&self, _block_height: u64) -> ExaResult<U256> {
        Ok(self.rate)
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }
}

// ============ Tests ============
