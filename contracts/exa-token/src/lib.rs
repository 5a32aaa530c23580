//! EXA Token Ledgers
//!
//! Fungible balance ledgers used by the pool.
//!
//! - [`TokenLedger`]: ERC20-like balances and allowances. Stands in for the
//!   native coin and for the alternate asset (DAI).
//! - [`ShareLedger`]: the EXA share token. Transfers are open to anyone,
//!   but only the authorized minter (the pool) can mint or burn.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use tracing::trace;

use exa_common::{
    check,
    errors::{ExaError, ExaResult},
    events::{EventLog, ExaEvent},
    math,
    token_ops::AssetLedger,
    types::{Address, CallContext, U256},
    validation::require_address,
};

mod share;

pub use share::ShareLedger;

// ============ Token Ledger ============

/// Balances and allowances for one fungible asset
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TokenLedger {
    /// Ticker, for logs only
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
    balances: BTreeMap<Address, U256>,
    allowances: BTreeMap<(Address, Address), U256>,
    total_supply: U256,
    #[borsh(skip)]
    events: EventLog,
}

impl TokenLedger {
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            total_supply: U256::zero(),
            events: EventLog::new(),
        }
    }

    /// Create `amount` out of thin air for `owner`
    ///
    /// Genesis allocation for wallets in tests and simulations; the pool
    /// never calls this.
    pub fn credit(&mut self, owner: &Address, amount: U256) -> ExaResult<()> {
        require_address(owner)?;
        let balance = math::add(self.balance_of(owner), amount)?;
        self.total_supply = math::add(self.total_supply, amount)?;
        self.balances.insert(*owner, balance);
        Ok(())
    }

    /// Set the allowance `ctx.caller` grants to `spender`
    pub fn approve(&mut self, ctx: &CallContext, spender: &Address, amount: U256) -> ExaResult<()> {
        require_address(spender)?;
        self.allowances.insert((ctx.caller, *spender), amount);
        self.events.emit(ExaEvent::Approval {
            owner: ctx.caller,
            spender: *spender,
            amount,
            block_height: ctx.block_height,
        });
        Ok(())
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Number of accounts with a non-zero balance
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|b| !b.is_zero()).count()
    }

    /// Every non-zero balance, ordered by owner
    pub fn non_zero_balances(&self) -> Vec<(Address, U256)> {
        self.balances
            .iter()
            .filter(|(_, b)| !b.is_zero())
            .map(|(a, b)| (*a, *b))
            .collect()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Drain collected events
    pub fn take_events(&mut self) -> Vec<ExaEvent> {
        std::mem::take(&mut self.events).into_events()
    }

    pub(crate) fn emit(&mut self, event: ExaEvent) {
        self.events.emit(event);
    }

    /// Move `amount` between two accounts, no authorization involved
    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: U256,
        block_height: u64,
    ) -> ExaResult<()> {
        // 1. Recipient must be real
        require_address(to)?;

        // 2. Sender must cover it
        let from_balance = self.balance_of(from);
        check!(
            amount <= from_balance,
            ExaError::NotEnoughAmount {
                requested: amount,
                available: from_balance,
            }
        );

        // 3. Compute both sides before writing either
        let new_from = math::sub(from_balance, amount)?;
        let new_to = if from == to {
            from_balance
        } else {
            math::add(self.balance_of(to), amount)?
        };

        self.balances.insert(*from, new_from);
        self.balances.insert(*to, new_to);

        trace!(symbol = %self.symbol, %amount, "transfer");

        self.events.emit(ExaEvent::Transfer {
            from: *from,
            to: *to,
            amount,
            block_height,
        });
        Ok(())
    }

    /// Add freshly minted `amount` to `to`
    pub(crate) fn mint_to(&mut self, to: &Address, amount: U256) -> ExaResult<U256> {
        let balance = math::add(self.balance_of(to), amount)?;
        let supply = math::add(self.total_supply, amount)?;
        self.balances.insert(*to, balance);
        self.total_supply = supply;
        Ok(supply)
    }

    /// Remove `amount` from `from` and the supply
    pub(crate) fn burn_from(&mut self, from: &Address, amount: U256) -> ExaResult<U256> {
        let balance = self.balance_of(from);
        check!(
            amount <= balance,
            ExaError::NotEnoughAmount {
                requested: amount,
                available: balance,
            }
        );
        let supply = math::sub(self.total_supply, amount)?;
        self.balances.insert(*from, balance - amount);
        self.total_supply = supply;
        Ok(supply)
    }
}

impl AssetLedger for TokenLedger {
    fn balance_of(&self, owner: &Address) -> U256 {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    fn transfer(&mut self, ctx: &CallContext, to: &Address, amount: U256) -> ExaResult<()> {
        self.move_balance(&ctx.caller, to, amount, ctx.block_height)
    }

    fn transfer_from(
        &mut self,
        ctx: &CallContext,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> ExaResult<()> {
        // 1. Spender must have enough allowance
        let allowed = self.allowance(from, &ctx.caller);
        check!(
            amount <= allowed,
            ExaError::InsufficientAllowance {
                requested: amount,
                available: allowed,
            }
        );

        // 2. Move the balance (checks the owner's funds)
        self.move_balance(from, to, amount, ctx.block_height)?;

        // 3. Spend the allowance; unlimited approvals stay unlimited
        if allowed != U256::MAX {
            self.allowances.insert((*from, ctx.caller), allowed - amount);
        }
        Ok(())
    }
}

// ============ Tests ============
