//! EXA share token
//!
//! Fungible like any other ledger, but supply only moves through the
//! authorized minter. In the delegated arrangement the deployer creates the
//! token and hands the minter role to the pool; in the self-issuing one the
//! pool creates it with itself as minter.

use borsh::{BorshDeserialize, BorshSerialize};

use exa_common::{
    access_control::require_caller,
    check,
    constants::token,
    errors::{ExaError, ExaResult},
    events::{EventLog, ExaEvent},
    token_ops::{AssetLedger, ShareToken},
    types::{Address, CallContext, U256},
    validation::{require_address, require_positive},
};

use crate::TokenLedger;

/// EXA share ledger
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ShareLedger {
    /// Only this address can mint and burn
    authorized_minter: Address,
    ledger: TokenLedger,
}

// NOTE: Default intentionally not implemented; a ledger with a zero minter
// would accept mints from nobody and could never be fixed.

impl ShareLedger {
    /// Create an empty share ledger
    ///
    /// # Errors
    /// - `AddressZero` if `authorized_minter` is the null address
    pub fn new(authorized_minter: Address) -> ExaResult<Self> {
        require_address(&authorized_minter)?;
        Ok(Self {
            authorized_minter,
            ledger: TokenLedger::new(token::SYMBOL, token::DECIMALS),
        })
    }

    pub fn name() -> &'static str {
        token::NAME
    }

    pub fn symbol() -> &'static str {
        token::SYMBOL
    }

    pub fn decimals() -> u8 {
        token::DECIMALS
    }

    /// Rebuild a ledger from persisted holder balances
    ///
    /// # Errors
    /// - `AddressZero` for a zero minter or holder
    /// - `Overflow` if the balances do not fit in a supply
    pub fn from_holders(authorized_minter: Address, holders: &[(Address, U256)]) -> ExaResult<Self> {
        let mut shares = Self::new(authorized_minter)?;
        for (holder, balance) in holders {
            require_address(holder)?;
            shares.ledger.mint_to(holder, *balance)?;
        }
        Ok(shares)
    }

    /// Hand the minter role to `new_minter` (ownership transfer)
    pub fn transfer_minter(&mut self, ctx: &CallContext, new_minter: &Address) -> ExaResult<()> {
        require_caller(&self.authorized_minter, &ctx.caller)?;
        require_address(new_minter)?;
        self.authorized_minter = *new_minter;
        Ok(())
    }

    // ============ Holder-facing capability ============

    pub fn transfer(&mut self, ctx: &CallContext, to: &Address, amount: U256) -> ExaResult<()> {
        self.ledger.transfer(ctx, to, amount)
    }

    pub fn approve(&mut self, ctx: &CallContext, spender: &Address, amount: U256) -> ExaResult<()> {
        self.ledger.approve(ctx, spender, amount)
    }

    pub fn transfer_from(
        &mut self,
        ctx: &CallContext,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> ExaResult<()> {
        self.ledger.transfer_from(ctx, from, to, amount)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.ledger.allowance(owner, spender)
    }

    pub fn holder_count(&self) -> usize {
        self.ledger.holder_count()
    }

    pub fn events(&self) -> &EventLog {
        self.ledger.events()
    }

    pub fn take_events(&mut self) -> Vec<ExaEvent> {
        self.ledger.take_events()
    }
}

impl ShareToken for ShareLedger {
    fn balance_of(&self, holder: &Address) -> U256 {
        self.ledger.balance_of(holder)
    }

    fn total_supply(&self) -> U256 {
        self.ledger.total_supply()
    }

    fn mint(&mut self, ctx: &CallContext, to: &Address, amount: U256) -> ExaResult<()> {
        // 1. Caller must be the authorized minter
        check!(
            ctx.caller == self.authorized_minter,
            ExaError::MintUnauthorized { caller: ctx.caller }
        );

        // 2. Never mint to the null address
        require_address(to)?;

        // 3. Amount must be positive
        require_positive(amount)?;

        // 4. Credit and emit
        let new_total_supply = self.ledger.mint_to(to, amount)?;
        self.ledger.emit(ExaEvent::SharesMinted {
            to: *to,
            amount,
            new_total_supply,
            block_height: ctx.block_height,
        });
        Ok(())
    }

    fn burn(&mut self, ctx: &CallContext, from: &Address, amount: U256) -> ExaResult<()> {
        // 1. Caller must be the authorized minter
        check!(
            ctx.caller == self.authorized_minter,
            ExaError::BurnUnauthorized { caller: ctx.caller }
        );

        // 2. Amount must be positive
        require_positive(amount)?;

        // 3. Debit (checks the holder's balance) and emit
        let new_total_supply = self.ledger.burn_from(from, amount)?;
        self.ledger.emit(ExaEvent::SharesBurned {
            from: *from,
            amount,
            new_total_supply,
            block_height: ctx.block_height,
        });
        Ok(())
    }

    fn holders(&self) -> Vec<(Address, U256)> {
        self.ledger.non_zero_balances()
    }

    fn authorized_minter(&self) -> Address {
        self.authorized_minter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exa_common::token_ops::balances_conserved;

    fn pool() -> Address {
        [9u8; 32]
    }

    fn user() -> Address {
        [2u8; 32]
    }

    fn attacker() -> Address {
        [99u8; 32]
    }

    fn pool_ctx() -> CallContext {
        CallContext::new(pool(), 100)
    }

    #[test]
    fn test_metadata() {
        assert_eq!(ShareLedger::name(), "Exactly LP Token");
        assert_eq!(ShareLedger::symbol(), "EXA");
        assert_eq!(ShareLedger::decimals(), 18);
    }

    #[test]
    fn test_zero_minter_rejected() {
        assert_eq!(ShareLedger::new([0u8; 32]), Err(ExaError::AddressZero));
    }

    #[test]
    fn test_mint_authorized() {
        let mut shares = ShareLedger::new(pool()).unwrap();
        shares.mint(&pool_ctx(), &user(), U256::from(1000u64)).unwrap();

        assert_eq!(shares.balance_of(&user()), U256::from(1000u64));
        assert_eq!(shares.total_supply(), U256::from(1000u64));
        assert!(matches!(
            shares.events().last(),
            Some(ExaEvent::SharesMinted { block_height: 100, .. })
        ));
    }

    #[test]
    fn test_mint_unauthorized() {
        let mut shares = ShareLedger::new(pool()).unwrap();
        let ctx = CallContext::new(attacker(), 100);

        let result = shares.mint(&ctx, &user(), U256::from(1000u64));
        assert_eq!(result, Err(ExaError::MintUnauthorized { caller: attacker() }));
        assert_eq!(shares.total_supply(), U256::zero());
    }

    #[test]
    fn test_mint_to_zero_address() {
        let mut shares = ShareLedger::new(pool()).unwrap();
        let result = shares.mint(&pool_ctx(), &[0u8; 32], U256::one());
        assert_eq!(result, Err(ExaError::AddressZero));
    }

    #[test]
    fn test_burn_success() {
        let mut shares = ShareLedger::new(pool()).unwrap();
        shares.mint(&pool_ctx(), &user(), U256::from(5000u64)).unwrap();
        shares.burn(&pool_ctx(), &user(), U256::from(1000u64)).unwrap();

        assert_eq!(shares.balance_of(&user()), U256::from(4000u64));
        assert_eq!(shares.total_supply(), U256::from(4000u64));
    }

    #[test]
    fn test_burn_more_than_balance() {
        let mut shares = ShareLedger::new(pool()).unwrap();
        shares.mint(&pool_ctx(), &user(), U256::from(10u64)).unwrap();

        let result = shares.burn(&pool_ctx(), &user(), U256::from(11u64));
        assert_eq!(
            result,
            Err(ExaError::NotEnoughAmount {
                requested: U256::from(11u64),
                available: U256::from(10u64),
            })
        );
    }

    #[test]
    fn test_burn_unauthorized() {
        let mut shares = ShareLedger::new(pool()).unwrap();
        shares.mint(&pool_ctx(), &user(), U256::from(10u64)).unwrap();

        let ctx = CallContext::new(user(), 100);
        let result = shares.burn(&ctx, &user(), U256::from(10u64));
        assert!(matches!(result, Err(ExaError::BurnUnauthorized { .. })));
    }

    #[test]
    fn test_minter_handover() {
        let deployer = [5u8; 32];
        let mut shares = ShareLedger::new(deployer).unwrap();

        shares
            .transfer_minter(&CallContext::new(deployer, 1), &pool())
            .unwrap();
        assert_eq!(shares.authorized_minter(), pool());

        // old owner can no longer mint
        let result = shares.mint(&CallContext::new(deployer, 2), &user(), U256::one());
        assert!(matches!(result, Err(ExaError::MintUnauthorized { .. })));

        // and cannot take the role back
        let result = shares.transfer_minter(&CallContext::new(deployer, 3), &deployer);
        assert!(matches!(result, Err(ExaError::Unauthorized { .. })));
    }

    #[test]
    fn test_from_holders() {
        let holders = vec![(user(), U256::from(7u64)), (attacker(), U256::from(3u64))];
        let shares = ShareLedger::from_holders(pool(), &holders).unwrap();

        assert_eq!(shares.total_supply(), U256::from(10u64));
        assert_eq!(shares.authorized_minter(), pool());
        assert!(shares.events().is_empty());
        assert_eq!(
            ShareLedger::from_holders(pool(), &[([0u8; 32], U256::one())]),
            Err(ExaError::AddressZero)
        );
    }

    #[test]
    fn test_holder_transfers_keep_supply() {
        let mut shares = ShareLedger::new(pool()).unwrap();
        shares.mint(&pool_ctx(), &user(), U256::from(100u64)).unwrap();

        shares
            .transfer(&CallContext::new(user(), 101), &attacker(), U256::from(40u64))
            .unwrap();

        assert_eq!(shares.total_supply(), U256::from(100u64));
        assert_eq!(shares.holder_count(), 2);
        assert!(balances_conserved(&shares));
    }
}
