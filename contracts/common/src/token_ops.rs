//! Token Operations Module
//!
//! Capability traits the pool holds its collaborators through.
//!
//! ## Key Features
//!
//! - **ShareToken**: mint/burn restricted to the pool, plus balance queries
//! - **AssetLedger**: ERC20-like custody for the base coin and the alternate asset
//! - **Conservation**: helpers to check that holder balances add up to supply

use crate::errors::ExaResult;
use crate::math;
use crate::types::{Address, CallContext, U256};

// ============================================================================
// Traits
// ============================================================================

/// Fungible share ledger owned by the pool
///
/// Either a separate token whose minter has been handed to the pool, or a
/// ledger the pool created for itself. The pool never cares which.
pub trait ShareToken {
    /// Shares held by `holder` (zero if never minted to)
    fn balance_of(&self, holder: &Address) -> U256;

    /// Sum of all balances
    fn total_supply(&self) -> U256;

    /// Mint `amount` to `to`; `ctx.caller` must be the authorized minter
    fn mint(&mut self, ctx: &CallContext, to: &Address, amount: U256) -> ExaResult<()>;

    /// Burn `amount` from `from`; `ctx.caller` must be the authorized minter
    fn burn(&mut self, ctx: &CallContext, from: &Address, amount: U256) -> ExaResult<()>;

    /// Every non-zero balance, ordered by holder
    fn holders(&self) -> Vec<(Address, U256)>;

    /// The only address allowed to mint and burn
    fn authorized_minter(&self) -> Address;
}

/// Custody ledger for an asset the pool receives and pays out
pub trait AssetLedger {
    fn balance_of(&self, owner: &Address) -> U256;

    fn allowance(&self, owner: &Address, spender: &Address) -> U256;

    /// Move `amount` from `ctx.caller` to `to`
    fn transfer(&mut self, ctx: &CallContext, to: &Address, amount: U256) -> ExaResult<()>;

    /// Move `amount` from `from` to `to`, spending `ctx.caller`'s allowance
    fn transfer_from(
        &mut self,
        ctx: &CallContext,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> ExaResult<()>;

    /// What `spender` can actually pull from `owner` right now
    fn spendable(&self, owner: &Address, spender: &Address) -> U256 {
        self.balance_of(owner).min(self.allowance(owner, spender))
    }
}

// ============================================================================
// Conservation
// ============================================================================

/// Sum of every holder balance
pub fn sum_balances<S: ShareToken + ?Sized>(token: &S) -> ExaResult<U256> {
    token
        .holders()
        .iter()
        .try_fold(U256::zero(), |acc, (_, balance)| math::add(acc, *balance))
}

/// True when holder balances add up to the reported supply
pub fn balances_conserved<S: ShareToken + ?Sized>(token: &S) -> bool {
    sum_balances(token).map_or(false, |sum| sum == token.total_supply())
}
