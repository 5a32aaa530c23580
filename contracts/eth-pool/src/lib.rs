//! ETHPool Contract
//!
//! Pooled native-coin vault. Depositors hand the pool base coin (or an
//! alternate asset priced by a rate feed) and receive EXA shares; the team
//! can fold extra coin into the pool without minting, raising what every
//! outstanding share redeems for.
//!
//! ## Call Model
//!
//! Every mutating call takes a [`CallContext`] naming the caller and the
//! block. Calls are serialized by the host, so each one runs to completion
//! with exclusive access to the pool and its collaborators.
//!
//! Each operation performs all of its checks (including balance, allowance,
//! custody and minter checks on the collaborators) before touching any
//! state, so a failed call leaves everything as it was.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use exa_common::{
    access_control::{require_team, rotate_team},
    check,
    errors::{ExaError, ExaResult},
    events::{EventLog, ExaEvent},
    oracle::{Conversion, PriceConverter, PriceFeed},
    token_ops::{AssetLedger, ShareToken},
    types::{hex_address, Address, CallContext, U256},
    validation::{require_available, require_positive, require_supply_mirror},
    value_ledger::{MintQuote, RedeemQuote, ValueLedger},
};
use exa_price_feed::RateFeed;
use exa_token::{ShareLedger, TokenLedger};

pub mod config;
pub mod scenario;
pub mod state;


pub use config::PoolConfig;
pub use state::{PoolSnapshot, PoolState, PoolStats, ShareBalance};

/// Pool backed entirely by in-process ledgers
pub type LedgerPool<F = RateFeed> = EthPool<ShareLedger, TokenLedger, TokenLedger, F>;

// ============ Actions ============

/// Operations the pool accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PoolAction {
    Supply { amount: U256 },
    SupplyWithAlternate { alt_amount: U256 },
    Withdraw { shares: U256 },
    Donate { amount: U256 },
    UpdateTeam {
        #[serde(with = "hex_address")]
        new_team: Address,
    },
}

// ============ Pool ============

/// The pool and the collaborators it holds capabilities over
#[derive(Debug, Clone)]
pub struct EthPool<S, N, A, F> {
    config: PoolConfig,
    state: PoolState,
    shares: S,
    native: N,
    alternate: Option<A>,
    feed: Option<F>,
    converter: PriceConverter,
    events: EventLog,
}

impl<N, A, F> EthPool<ShareLedger, N, A, F>
where
    N: AssetLedger,
    A: AssetLedger,
    F: PriceFeed,
{
    /// Deploy a pool that issues its own shares
    pub fn self_issuing(
        config: PoolConfig,
        native: N,
        alternate: Option<A>,
        feed: Option<F>,
    ) -> ExaResult<Self> {
        let shares = ShareLedger::new(config.pool_address)?;
        Self::new(config, shares, native, alternate, feed)
    }
}

impl<S, N, A, F> EthPool<S, N, A, F>
where
    S: ShareToken,
    N: AssetLedger,
    A: AssetLedger,
    F: PriceFeed,
{
    /// Deploy a pool over an existing, empty share token
    ///
    /// # Errors
    /// - anything `PoolConfig::validate` rejects
    /// - `ConservationViolated` if the share token already has supply
    /// - `InvalidInput` if the alternate ledger or feed disagree with the config
    pub fn new(
        config: PoolConfig,
        shares: S,
        native: N,
        alternate: Option<A>,
        feed: Option<F>,
    ) -> ExaResult<Self> {
        config.validate()?;
        require_supply_mirror(U256::zero(), shares.total_supply())?;
        check_collaborators(&config, alternate.is_some(), feed.is_some())?;

        let state = PoolState::new(config.team, config.initial_mint_scale());

        info!(
            pool = %hex::encode(config.pool_address),
            issuance = ?config.issuance,
            scale = %state.ledger.initial_mint_scale(),
            alternate = config.accepts_alternate(),
            "pool deployed"
        );

        Ok(Self {
            converter: PriceConverter::new(config.conversion),
            config,
            state,
            shares,
            native,
            alternate,
            feed,
            events: EventLog::new(),
        })
    }

    /// Rebuild a pool from a snapshot and live collaborators
    ///
    /// # Errors
    /// - anything `PoolConfig::validate` rejects
    /// - `ConservationViolated` if the ledger totals are inconsistent or
    ///   `total_shares` differs from the share token's supply
    pub fn restore(
        snapshot: PoolSnapshot,
        shares: S,
        native: N,
        alternate: Option<A>,
        feed: Option<F>,
    ) -> ExaResult<Self> {
        let PoolSnapshot { config, state, .. } = snapshot;

        config.validate()?;
        check_collaborators(&config, alternate.is_some(), feed.is_some())?;

        let ledger = ValueLedger::from_parts(
            state.ledger.total_underlying(),
            state.ledger.total_shares(),
            state.ledger.initial_mint_scale(),
        )?;
        require_supply_mirror(ledger.total_shares(), shares.total_supply())?;

        info!(digest = %hex::encode(state.digest()), "pool restored");

        Ok(Self {
            converter: PriceConverter::new(config.conversion),
            config,
            state: PoolState {
                team: state.team,
                ledger,
            },
            shares,
            native,
            alternate,
            feed,
            events: EventLog::new(),
        })
    }

    /// Main entry point for pool operations
    pub fn execute(&mut self, ctx: &CallContext, action: &PoolAction) -> ExaResult<()> {
        match action {
            PoolAction::Supply { amount } => self.supply(ctx, *amount).map(drop),
            PoolAction::SupplyWithAlternate { alt_amount } => {
                self.supply_with_alternate(ctx, *alt_amount).map(drop)
            }
            PoolAction::Withdraw { shares } => self.withdraw(ctx, *shares).map(drop),
            PoolAction::Donate { amount } => self.donate(ctx, *amount),
            PoolAction::UpdateTeam { new_team } => self.update_team(ctx, new_team),
        }
    }

    // ============ Deposits ============

    /// Deposit `amount` base coin, returning the shares minted
    ///
    /// # Errors
    /// - `AmountIsZero` for a zero deposit
    /// - `NotEnoughAmount(amount, balance)` if the depositor is short
    /// - `DegenerateRate` if the deposit would mint nothing
    pub fn supply(&mut self, ctx: &CallContext, amount: U256) -> ExaResult<U256> {
        // 1. Amount must be positive
        require_positive(amount)?;

        // 2. Depositor must hold it
        require_available(amount, self.native.balance_of(&ctx.caller))?;

        // 3. Price against the pre-deposit rate
        let quote = self.quote_mint_checked(amount)?;

        // 4. Take custody, mint, commit
        let pool = self.config.pool_address;
        self.native.transfer(ctx, &pool, amount)?;
        self.commit_mint(ctx, &quote)?;

        info!(
            depositor = %hex::encode(ctx.caller),
            %amount,
            shares = %quote.shares,
            bootstrap = quote.is_bootstrap(),
            "supply"
        );
        Ok(quote.shares)
    }

    /// Deposit `alt_amount` of the alternate asset at the feed's rate
    ///
    /// The pool pulls the asset with `transfer_from`, so the depositor must
    /// have approved the pool beforehand.
    ///
    /// # Errors
    /// - `AlternateAssetNotConfigured` if the pool takes no alternate asset
    /// - `AmountIsZero` for a zero deposit
    /// - `NotEnoughAmount(alt_amount, min(balance, allowance))` if short
    /// - feed errors, and `DivFailed(alt_amount, 0)` on a zero rate
    pub fn supply_with_alternate(&mut self, ctx: &CallContext, alt_amount: U256) -> ExaResult<U256> {
        let pool = self.config.pool_address;

        // 1. Alternate asset must be configured
        let (Some(alternate), Some(feed)) = (self.alternate.as_ref(), self.feed.as_ref()) else {
            return Err(ExaError::AlternateAssetNotConfigured);
        };

        // 2. Value the deposit (amount, then funds, then the rate)
        let available = alternate.spendable(&ctx.caller, &pool);
        let conversion =
            self.converter
                .to_base_equivalent(feed, alt_amount, available, ctx.block_height)?;

        // 3. Price the converted value
        let quote = self.quote_mint_checked(conversion.base_amount)?;

        // 4. Pull the asset, mint, commit
        self.alternate
            .as_mut()
            .ok_or(ExaError::AlternateAssetNotConfigured)?
            .transfer_from(&ctx.with_caller(pool), &ctx.caller, &pool, alt_amount)?;
        self.commit_mint(ctx, &quote)?;

        info!(
            depositor = %hex::encode(ctx.caller),
            %alt_amount,
            rate = %conversion.rate,
            base_amount = %conversion.base_amount,
            shares = %quote.shares,
            "supply with alternate"
        );
        Ok(quote.shares)
    }

    // ============ Withdrawal ============

    /// Burn `shares` of the caller's shares, returning the base coin paid out
    ///
    /// # Errors
    /// - `NotEnoughAmount(shares, balance)` if the caller holds fewer
    ///   shares, or holds none at all
    /// - `AmountIsZero` for a zero burn against a positive balance
    /// - `NotEnoughAmount(payout, custody)` if the pool's base coin cannot
    ///   cover the redemption
    pub fn withdraw(&mut self, ctx: &CallContext, shares: U256) -> ExaResult<U256> {
        let pool = self.config.pool_address;

        // 1. Holder must own what they burn
        let held = self.shares.balance_of(&ctx.caller);
        check!(
            shares <= held && !held.is_zero(),
            ExaError::NotEnoughAmount {
                requested: shares,
                available: held,
            }
        );

        // 2. Price against the pre-burn rate
        self.ensure_mirrored()?;
        self.ensure_minter(|caller| ExaError::BurnUnauthorized { caller })?;
        let quote = self.state.ledger.quote_redeem(shares)?;

        // 3. Custody must cover the payout
        require_available(quote.amount, self.native.balance_of(&pool))?;

        // 4. Burn, pay out, commit
        self.commit_redeem(ctx, &quote)?;

        info!(
            holder = %hex::encode(ctx.caller),
            %shares,
            amount = %quote.amount,
            sweep = quote.is_sweep(),
            "withdraw"
        );
        Ok(quote.amount)
    }

    // ============ Team ============

    /// Fold `amount` of the team's base coin into the pool without minting
    ///
    /// The plain-transfer path: any base coin the team sends the pool lands
    /// here.
    ///
    /// # Errors
    /// - `SenderIsNotTeam` if the caller is not the team
    /// - `AmountIsZero` for a zero donation
    /// - `EmptyPool` when there are no holders to credit
    /// - `NotEnoughAmount(amount, balance)` if the team is short
    pub fn donate(&mut self, ctx: &CallContext, amount: U256) -> ExaResult<()> {
        // 1. Team only
        require_team(&self.state.team, &ctx.caller)?;

        // 2. Price the donation
        self.ensure_mirrored()?;
        let quote = self.state.ledger.quote_donation(amount)?;

        // 3. Team must hold it
        require_available(amount, self.native.balance_of(&ctx.caller))?;

        // 4. Take custody and commit
        let pool = self.config.pool_address;
        self.native.transfer(ctx, &pool, amount)?;
        self.state.ledger.apply_donation(&quote)?;

        info!(%amount, total_underlying = %quote.new_total_underlying(), "team added eth");

        self.events.emit(ExaEvent::TeamAddedEth {
            team: ctx.caller,
            amount,
            block_height: ctx.block_height,
        });
        Ok(())
    }

    /// Incoming plain transfer of base coin
    pub fn receive(&mut self, ctx: &CallContext, amount: U256) -> ExaResult<()> {
        self.donate(ctx, amount)
    }

    /// Hand the team role to `new_team`
    pub fn update_team(&mut self, ctx: &CallContext, new_team: &Address) -> ExaResult<()> {
        let old_team = rotate_team(&mut self.state.team, &ctx.caller, new_team)?;

        info!(
            old_team = %hex::encode(old_team),
            new_team = %hex::encode(new_team),
            "team updated"
        );

        self.events.emit(ExaEvent::TeamUpdated {
            old_team,
            new_team: *new_team,
            block_height: ctx.block_height,
        });
        Ok(())
    }

    // ============ Internals ============

    fn ensure_mirrored(&self) -> ExaResult<()> {
        require_supply_mirror(self.state.ledger.total_shares(), self.shares.total_supply())
    }

    fn ensure_minter(&self, unauthorized: impl FnOnce(Address) -> ExaError) -> ExaResult<()> {
        let pool = self.config.pool_address;
        check!(self.shares.authorized_minter() == pool, unauthorized(pool));
        Ok(())
    }

    fn quote_mint_checked(&self, amount: U256) -> ExaResult<MintQuote> {
        self.ensure_mirrored()?;
        self.ensure_minter(|caller| ExaError::MintUnauthorized { caller })?;
        self.state.ledger.quote_mint(amount)
    }

    fn commit_mint(&mut self, ctx: &CallContext, quote: &MintQuote) -> ExaResult<()> {
        let pool_ctx = ctx.with_caller(self.config.pool_address);
        self.shares.mint(&pool_ctx, &ctx.caller, quote.shares)?;
        self.state.ledger.apply_mint(quote)?;

        self.events.emit(ExaEvent::Supply {
            depositor: ctx.caller,
            base_amount: quote.amount,
            shares_minted: quote.shares,
            block_height: ctx.block_height,
        });
        Ok(())
    }

    fn commit_redeem(&mut self, ctx: &CallContext, quote: &RedeemQuote) -> ExaResult<()> {
        let pool_ctx = ctx.with_caller(self.config.pool_address);
        self.shares.burn(&pool_ctx, &ctx.caller, quote.shares)?;
        if !quote.amount.is_zero() {
            self.native.transfer(&pool_ctx, &ctx.caller, quote.amount)?;
        }
        self.state.ledger.apply_redeem(quote)?;

        self.events.emit(ExaEvent::Withdraw {
            holder: ctx.caller,
            base_amount: quote.amount,
            shares_burned: quote.shares,
            block_height: ctx.block_height,
        });
        Ok(())
    }

    // ============ Queries ============

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn team(&self) -> Address {
        self.state.team
    }

    pub fn pool_address(&self) -> Address {
        self.config.pool_address
    }

    pub fn underlying_asset(&self) -> Address {
        self.config.base_asset
    }

    pub fn alternate_asset(&self) -> Option<Address> {
        self.config.alternate_asset
    }

    pub fn price_feed(&self) -> Option<Address> {
        self.config.price_feed
    }

    /// Feed rate at `block_height`
    pub fn current_rate(&self, block_height: u64) -> ExaResult<U256> {
        self.feed
            .as_ref()
            .ok_or(ExaError::AlternateAssetNotConfigured)?
            .current_rate(block_height)
    }

    pub fn units_per_share(&self) -> U256 {
        self.state.ledger.units_per_share()
    }

    pub fn total_underlying(&self) -> U256 {
        self.state.ledger.total_underlying()
    }

    pub fn total_shares(&self) -> U256 {
        self.state.ledger.total_shares()
    }

    pub fn initial_mint_scale(&self) -> U256 {
        self.state.ledger.initial_mint_scale()
    }

    /// Shares held by `holder`
    pub fn balance_of(&self, holder: &Address) -> U256 {
        self.shares.balance_of(holder)
    }

    /// Base coin the pool actually holds
    pub fn custody(&self) -> U256 {
        self.native.balance_of(&self.config.pool_address)
    }

    /// Shares a base-coin deposit of `amount` would mint right now
    pub fn preview_supply(&self, amount: U256) -> ExaResult<MintQuote> {
        self.state.ledger.quote_mint(amount)
    }

    /// Shares an alternate deposit of `alt_amount` would mint at `block_height`
    ///
    /// Ignores the depositor's balance and allowance.
    pub fn preview_supply_with_alternate(
        &self,
        alt_amount: U256,
        block_height: u64,
    ) -> ExaResult<(Conversion, MintQuote)> {
        let feed = self
            .feed
            .as_ref()
            .ok_or(ExaError::AlternateAssetNotConfigured)?;
        let conversion = self
            .converter
            .to_base_equivalent(feed, alt_amount, alt_amount, block_height)?;
        let quote = self.state.ledger.quote_mint(conversion.base_amount)?;
        Ok((conversion, quote))
    }

    /// Base coin burning `shares` would pay out right now
    pub fn preview_withdraw(&self, shares: U256) -> ExaResult<RedeemQuote> {
        self.state.ledger.quote_redeem(shares)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_underlying: self.total_underlying(),
            total_shares: self.total_shares(),
            units_per_share: self.units_per_share(),
            custody: self.custody(),
            holder_count: self.shares.holders().len(),
        }
    }

    /// Capture everything needed to rebuild the pool
    pub fn snapshot(&self, block_height: u64) -> PoolSnapshot {
        let snapshot = PoolSnapshot {
            config: self.config.clone(),
            state: self.state.clone(),
            holders: self
                .shares
                .holders()
                .into_iter()
                .map(|(holder, balance)| ShareBalance { holder, balance })
                .collect(),
            custody: self.custody(),
            block_height,
        };
        debug!(block_height, holders = snapshot.holders.len(), "snapshot taken");
        snapshot
    }

    // ============ Collaborators ============

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Drain the pool's own events
    pub fn take_events(&mut self) -> Vec<ExaEvent> {
        std::mem::take(&mut self.events).into_events()
    }

    pub fn shares(&self) -> &S {
        &self.shares
    }

    /// Holder-side access to the share token (transfers, approvals)
    pub fn shares_mut(&mut self) -> &mut S {
        &mut self.shares
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    /// Wallet-side access to the base-coin ledger
    pub fn native_mut(&mut self) -> &mut N {
        &mut self.native
    }

    pub fn alternate(&self) -> Option<&A> {
        self.alternate.as_ref()
    }

    /// Wallet-side access to the alternate ledger (approvals, funding)
    pub fn alternate_mut(&mut self) -> Option<&mut A> {
        self.alternate.as_mut()
    }

    pub fn feed(&self) -> Option<&F> {
        self.feed.as_ref()
    }

    /// Operator-side access to the feed
    pub fn feed_mut(&mut self) -> Option<&mut F> {
        self.feed.as_mut()
    }
}

/// Alternate ledger and feed must be present exactly when configured
fn check_collaborators(config: &PoolConfig, has_alternate: bool, has_feed: bool) -> ExaResult<()> {
    check!(
        has_alternate == config.alternate_asset.is_some(),
        ExaError::InvalidInput {
            param: "alternate",
            reason: "ledger must be supplied exactly when configured",
        }
    );
    check!(
        has_feed == config.price_feed.is_some(),
        ExaError::InvalidInput {
            param: "feed",
            reason: "feed must be supplied exactly when configured",
        }
    );
    Ok(())
}

// ============ Tests ============
