//! Value Ledger
//!
//! Share accounting for the pool: how many shares a deposit mints, how much
//! underlying a burn pays out, and how a donation raises the value of every
//! outstanding share.
//!
//! ## Exchange Rate
//!
//! The rate is derived, never stored:
//!
//! ```text
//! units_per_share = total_shares / total_underlying   (integer, 0 when empty)
//! mint            = deposit * units_per_share         (pre-deposit rate)
//! redeem          = burn / units_per_share            (pre-burn rate)
//! ```
//!
//! The very first mint has no prevailing rate, so it is normalized against
//! `initial_mint_scale` instead: `units_per_share = scale / deposit`.
//!
//! ## Invariants
//!
//! - `total_underlying == 0` iff `total_shares == 0`
//! - Burning every outstanding share pays out exactly `total_underlying`
//! - Truncation always rounds in favour of the pool, never the caller
//!
//! Every operation is split into a read-only quote and an `apply_*` step so
//! callers can run their own balance checks between the two.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ExaError, ExaResult};
use crate::math;
use crate::types::U256;
use crate::check;

// ============ Quotes ============

/// Result of pricing a deposit against the current ledger state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintQuote {
    /// Base-asset value being deposited
    pub amount: U256,
    /// Rate the deposit was priced at
    pub units_per_share: U256,
    /// Shares to mint
    pub shares: U256,
    prior: (U256, U256),
    next: (U256, U256),
}

impl MintQuote {
    /// `total_underlying` after the deposit is applied
    pub fn new_total_underlying(&self) -> U256 {
        self.next.0
    }

    /// `total_shares` after the deposit is applied
    pub fn new_total_shares(&self) -> U256 {
        self.next.1
    }

    /// True when this quote normalized against the bootstrap scale
    pub fn is_bootstrap(&self) -> bool {
        self.prior.1.is_zero()
    }
}

/// Result of pricing a burn against the current ledger state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedeemQuote {
    /// Shares to burn
    pub shares: U256,
    /// Rate the burn was priced at (zero for a full sweep of a pool
    /// whose rate has truncated to zero)
    pub units_per_share: U256,
    /// Base-asset value paid out
    pub amount: U256,
    prior: (U256, U256),
    next: (U256, U256),
}

impl RedeemQuote {
    pub fn new_total_underlying(&self) -> U256 {
        self.next.0
    }

    pub fn new_total_shares(&self) -> U256 {
        self.next.1
    }

    /// True when every outstanding share is burned
    pub fn is_sweep(&self) -> bool {
        self.next.1.is_zero()
    }
}

/// Result of pricing a donation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonationQuote {
    pub amount: U256,
    prior: (U256, U256),
    next: (U256, U256),
}

impl DonationQuote {
    pub fn new_total_underlying(&self) -> U256 {
        self.next.0
    }
}

// ============ Ledger ============

/// Pool-wide share accounting state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ValueLedger {
    total_underlying: U256,
    total_shares: U256,
    initial_mint_scale: U256,
}

impl ValueLedger {
    /// Create an empty ledger with the given bootstrap scale
    pub fn new(initial_mint_scale: U256) -> Self {
        Self {
            total_underlying: U256::zero(),
            total_shares: U256::zero(),
            initial_mint_scale,
        }
    }

    /// Rebuild a ledger from persisted totals
    ///
    /// # Errors
    /// - `ConservationViolated` if exactly one of the totals is zero
    pub fn from_parts(
        total_underlying: U256,
        total_shares: U256,
        initial_mint_scale: U256,
    ) -> ExaResult<Self> {
        check!(
            total_underlying.is_zero() == total_shares.is_zero(),
            ExaError::ConservationViolated {
                ledger_shares: total_shares,
                token_supply: total_shares,
            }
        );
        check!(
            !initial_mint_scale.is_zero(),
            ExaError::InvalidInput {
                param: "initial_mint_scale",
                reason: "must be positive",
            }
        );
        Ok(Self {
            total_underlying,
            total_shares,
            initial_mint_scale,
        })
    }

    pub fn total_underlying(&self) -> U256 {
        self.total_underlying
    }

    pub fn total_shares(&self) -> U256 {
        self.total_shares
    }

    pub fn initial_mint_scale(&self) -> U256 {
        self.initial_mint_scale
    }

    /// Current exchange rate (shares per unit of underlying), zero when empty
    pub fn units_per_share(&self) -> U256 {
        math::units_per_share(self.total_shares, self.total_underlying)
    }

    pub fn is_empty(&self) -> bool {
        self.total_shares.is_zero()
    }

    fn totals(&self) -> (U256, U256) {
        (self.total_underlying, self.total_shares)
    }

    // ============ Deposit ============

    /// Price a deposit of `amount` base-asset units
    ///
    /// # Errors
    /// - `AmountIsZero` for a zero deposit
    /// - `DegenerateRate` if the rate truncates to zero (the deposit would
    ///   mint nothing, or a bootstrap deposit exceeds the scale)
    /// - `Overflow` if the new totals do not fit
    pub fn quote_mint(&self, amount: U256) -> ExaResult<MintQuote> {
        // 1. Amount must be positive
        check!(!amount.is_zero(), ExaError::AmountIsZero);

        // 2. Rate: bootstrap scale for the first mint, pre-deposit rate after
        let units_per_share = if self.total_shares.is_zero() {
            math::div(self.initial_mint_scale, amount)?
        } else {
            math::div(self.total_shares, self.total_underlying)?
        };

        check!(
            !units_per_share.is_zero(),
            ExaError::DegenerateRate {
                total_shares: self.total_shares,
                total_underlying: self.total_underlying,
            }
        );

        // 3. Shares and post-deposit totals
        let shares = math::mul(amount, units_per_share)?;
        let next = (
            math::add(self.total_underlying, amount)?,
            math::add(self.total_shares, shares)?,
        );

        debug!(%amount, %units_per_share, %shares, "quoted mint");

        Ok(MintQuote {
            amount,
            units_per_share,
            shares,
            prior: self.totals(),
            next,
        })
    }

    /// Commit a mint quote taken against the current state
    pub fn apply_mint(&mut self, quote: &MintQuote) -> ExaResult<()> {
        self.ensure_fresh(quote.prior)?;
        (self.total_underlying, self.total_shares) = quote.next;
        Ok(())
    }

    /// Quote and commit in one step, returning the minted shares
    pub fn mint(&mut self, amount: U256) -> ExaResult<U256> {
        let quote = self.quote_mint(amount)?;
        self.apply_mint(&quote)?;
        Ok(quote.shares)
    }

    // ============ Redemption ============

    /// Price burning `shares`
    ///
    /// # Errors
    /// - `NotEnoughAmount(shares, total_shares)` if nothing is outstanding
    ///   or `shares` exceeds what is outstanding
    /// - `AmountIsZero` for a zero burn
    /// - `DivFailed(shares, 0)` if the rate has truncated to zero and this
    ///   is not a full sweep
    /// - `DegenerateRate` if a partial burn would drain all underlying
    pub fn quote_redeem(&self, shares: U256) -> ExaResult<RedeemQuote> {
        // 1. Something must be outstanding
        check!(
            !self.total_shares.is_zero(),
            ExaError::NotEnoughAmount {
                requested: shares,
                available: U256::zero(),
            }
        );

        // 2. Amount must be positive
        check!(!shares.is_zero(), ExaError::AmountIsZero);

        // 3. Cannot burn more than exists
        check!(
            shares <= self.total_shares,
            ExaError::NotEnoughAmount {
                requested: shares,
                available: self.total_shares,
            }
        );

        let units_per_share = self.units_per_share();

        // 4. Last shares out take whatever underlying is left
        let amount = if shares == self.total_shares {
            self.total_underlying
        } else {
            let amount = math::div(shares, units_per_share)?;
            check!(
                amount < self.total_underlying,
                ExaError::DegenerateRate {
                    total_shares: self.total_shares,
                    total_underlying: self.total_underlying,
                }
            );
            amount
        };

        let next = (
            math::sub(self.total_underlying, amount)?,
            math::sub(self.total_shares, shares)?,
        );

        debug!(%shares, %units_per_share, %amount, "quoted redeem");

        Ok(RedeemQuote {
            shares,
            units_per_share,
            amount,
            prior: self.totals(),
            next,
        })
    }

    /// Commit a redeem quote taken against the current state
    pub fn apply_redeem(&mut self, quote: &RedeemQuote) -> ExaResult<()> {
        self.ensure_fresh(quote.prior)?;
        (self.total_underlying, self.total_shares) = quote.next;
        Ok(())
    }

    /// Quote and commit in one step, returning the redeemed amount
    pub fn redeem(&mut self, shares: U256) -> ExaResult<U256> {
        let quote = self.quote_redeem(shares)?;
        self.apply_redeem(&quote)?;
        Ok(quote.amount)
    }

    // ============ Donation ============

    /// Price folding `amount` into the underlying without minting
    ///
    /// # Errors
    /// - `AmountIsZero` for a zero donation
    /// - `EmptyPool` when no shares are outstanding
    /// - `Overflow` if the new total does not fit
    pub fn quote_donation(&self, amount: U256) -> ExaResult<DonationQuote> {
        check!(!amount.is_zero(), ExaError::AmountIsZero);
        check!(!self.total_shares.is_zero(), ExaError::EmptyPool);

        let next = (math::add(self.total_underlying, amount)?, self.total_shares);
        Ok(DonationQuote {
            amount,
            prior: self.totals(),
            next,
        })
    }

    pub fn apply_donation(&mut self, quote: &DonationQuote) -> ExaResult<()> {
        self.ensure_fresh(quote.prior)?;
        self.total_underlying = quote.next.0;
        Ok(())
    }

    /// Quote and commit a donation in one step
    pub fn donate(&mut self, amount: U256) -> ExaResult<()> {
        let quote = self.quote_donation(amount)?;
        self.apply_donation(&quote)
    }

    fn ensure_fresh(&self, prior: (U256, U256)) -> ExaResult<()> {
        check!(
            prior == self.totals(),
            ExaError::InvalidInput {
                param: "quote",
                reason: "ledger changed since quote was taken",
            }
        );
        Ok(())
    }
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::scale::{DELEGATED_INITIAL_MINT_SCALE, SELF_ISSUING_INITIAL_MINT_SCALE};
    use proptest::prelude::*;

    const ETH: u64 = 1_000_000_000_000_000_000;
    const HALF_ETH: u64 = ETH / 2;

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    fn self_issuing() -> ValueLedger {
        ValueLedger::new(SELF_ISSUING_INITIAL_MINT_SCALE)
    }

    // ============ Bootstrap ============

    #[test]
    fn test_first_deposit_normalizes_to_scale() {
        let mut ledger = self_issuing();
        let shares = ledger.mint(u(HALF_ETH)).unwrap();

        assert_eq!(shares, SELF_ISSUING_INITIAL_MINT_SCALE);
        assert_eq!(ledger.total_underlying(), u(HALF_ETH));
        assert_eq!(ledger.total_shares(), SELF_ISSUING_INITIAL_MINT_SCALE);
        assert_eq!(ledger.units_per_share(), u(2 * ETH));
    }

    #[test]
    fn test_bootstrap_truncation_loss() {
        let mut ledger = ValueLedger::new(u(1000));
        // 1000 / 3 = 333, 3 * 333 = 999
        assert_eq!(ledger.mint(u(3)).unwrap(), u(999));
        assert_eq!(ledger.units_per_share(), u(333));
    }

    #[test]
    fn test_bootstrap_larger_than_scale_is_degenerate() {
        let ledger = ValueLedger::new(DELEGATED_INITIAL_MINT_SCALE);
        let result = ledger.quote_mint(u(2 * ETH));
        assert!(matches!(result, Err(ExaError::DegenerateRate { .. })));
    }

    #[test]
    fn test_zero_deposit_rejected() {
        let ledger = self_issuing();
        assert_eq!(ledger.quote_mint(U256::zero()), Err(ExaError::AmountIsZero));
    }

    // ============ Later deposits ============

    #[test]
    fn test_later_deposit_uses_pre_deposit_rate() {
        let mut ledger = self_issuing();
        let first = ledger.mint(u(HALF_ETH)).unwrap();
        let second = ledger.mint(u(HALF_ETH)).unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.units_per_share(), u(2 * ETH));
        assert_eq!(ledger.total_underlying(), u(ETH));
    }

    #[test]
    fn test_deposit_after_dilution_to_zero_rate_is_degenerate() {
        let mut ledger = ValueLedger::new(u(10));
        ledger.mint(u(10)).unwrap(); // 10 shares for 10 units
        ledger.donate(u(100)).unwrap(); // 10 shares / 110 units -> rate 0

        assert_eq!(ledger.units_per_share(), U256::zero());
        assert!(matches!(
            ledger.quote_mint(u(5)),
            Err(ExaError::DegenerateRate { .. })
        ));
    }

    #[test]
    fn test_mint_overflow() {
        let mut ledger = ValueLedger::new(U256::MAX);
        ledger.mint(u(1)).unwrap(); // rate = MAX
        assert_eq!(ledger.quote_mint(u(2)), Err(ExaError::Overflow));
    }

    // ============ Donation ============

    #[test]
    fn test_donation_halves_rate() {
        let mut ledger = self_issuing();
        ledger.mint(u(HALF_ETH)).unwrap();
        let before = ledger.units_per_share();

        ledger.donate(u(HALF_ETH)).unwrap();

        assert_eq!(ledger.total_underlying(), u(ETH));
        assert_eq!(ledger.total_shares(), SELF_ISSUING_INITIAL_MINT_SCALE);
        assert_eq!(ledger.units_per_share(), before / 2);
    }

    #[test]
    fn test_donation_into_empty_pool_rejected() {
        let mut ledger = self_issuing();
        assert_eq!(ledger.donate(u(ETH)), Err(ExaError::EmptyPool));
        assert_eq!(ledger.total_underlying(), U256::zero());
    }

    #[test]
    fn test_zero_donation_rejected() {
        let mut ledger = self_issuing();
        ledger.mint(u(ETH)).unwrap();
        assert_eq!(ledger.donate(U256::zero()), Err(ExaError::AmountIsZero));
    }

    // ============ Redemption ============

    #[test]
    fn test_withdraw_all_after_donation() {
        let mut ledger = self_issuing();
        let shares = ledger.mint(u(HALF_ETH)).unwrap();
        ledger.donate(u(HALF_ETH)).unwrap();

        let paid = ledger.redeem(shares).unwrap();

        assert_eq!(paid, u(ETH));
        assert_eq!(ledger.total_underlying(), U256::zero());
        assert_eq!(ledger.total_shares(), U256::zero());
    }

    #[test]
    fn test_redeem_from_empty_pool() {
        let ledger = self_issuing();
        assert_eq!(
            ledger.quote_redeem(u(5)),
            Err(ExaError::NotEnoughAmount {
                requested: u(5),
                available: U256::zero(),
            })
        );
        assert_eq!(
            ledger.quote_redeem(U256::zero()),
            Err(ExaError::NotEnoughAmount {
                requested: U256::zero(),
                available: U256::zero(),
            })
        );
    }

    #[test]
    fn test_redeem_more_than_outstanding() {
        let mut ledger = ValueLedger::new(u(100));
        ledger.mint(u(10)).unwrap();
        assert_eq!(
            ledger.quote_redeem(u(101)),
            Err(ExaError::NotEnoughAmount {
                requested: u(101),
                available: u(100),
            })
        );
    }

    #[test]
    fn test_partial_redeem_uses_pre_burn_rate() {
        let mut ledger = ValueLedger::new(u(100));
        ledger.mint(u(10)).unwrap(); // rate 10
        ledger.mint(u(10)).unwrap();

        let quote = ledger.quote_redeem(u(50)).unwrap();
        assert_eq!(quote.units_per_share, u(10));
        assert_eq!(quote.amount, u(5));
        assert!(!quote.is_sweep());
    }

    #[test]
    fn test_dust_burn_pays_nothing() {
        let mut ledger = ValueLedger::new(u(100));
        ledger.mint(u(10)).unwrap(); // rate 10
        ledger.mint(u(10)).unwrap();

        assert_eq!(ledger.redeem(u(9)).unwrap(), U256::zero());
        assert_eq!(ledger.total_underlying(), u(20));
        assert_eq!(ledger.total_shares(), u(191));
    }

    #[test]
    fn test_sweep_with_zero_rate() {
        let mut ledger = ValueLedger::new(u(10));
        ledger.mint(u(10)).unwrap();
        ledger.donate(u(100)).unwrap();

        // partial burns cannot be priced at a zero rate
        assert_eq!(
            ledger.quote_redeem(u(5)),
            Err(ExaError::DivFailed {
                numerator: u(5),
                denominator: U256::zero(),
            })
        );
        // the last holder still gets everything
        assert_eq!(ledger.redeem(u(10)).unwrap(), u(110));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_partial_redeem_draining_pool_is_degenerate() {
        // 5 shares over 3 units: rate truncates to 1, so 3 shares would
        // claim all 3 units while 2 shares remain outstanding
        let ledger = ValueLedger::from_parts(u(3), u(5), u(1)).unwrap();
        assert!(matches!(
            ledger.quote_redeem(u(3)),
            Err(ExaError::DegenerateRate { .. })
        ));
        assert_eq!(ledger.quote_redeem(u(5)).unwrap().amount, u(3));
    }

    // ============ Quotes ============

    #[test]
    fn test_stale_quote_rejected() {
        let mut ledger = self_issuing();
        let quote = ledger.quote_mint(u(ETH)).unwrap();
        ledger.mint(u(HALF_ETH)).unwrap();

        assert!(matches!(
            ledger.apply_mint(&quote),
            Err(ExaError::InvalidInput { param: "quote", .. })
        ));
    }

    #[test]
    fn test_quote_is_read_only() {
        let ledger = self_issuing();
        let before = ledger.clone();
        let quote = ledger.quote_mint(u(ETH)).unwrap();
        assert!(quote.is_bootstrap());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_from_parts_rejects_broken_invariant() {
        assert!(ValueLedger::from_parts(u(1), U256::zero(), u(10)).is_err());
        assert!(ValueLedger::from_parts(U256::zero(), u(1), u(10)).is_err());
        assert!(ValueLedger::from_parts(u(1), u(1), U256::zero()).is_err());
        assert!(ValueLedger::from_parts(U256::zero(), U256::zero(), u(10)).is_ok());
    }

    #[test]
    fn test_ledger_borsh_layout() {
        let mut ledger = self_issuing();
        ledger.mint(u(ETH)).unwrap();
        let bytes = borsh::to_vec(&ledger).unwrap();
        assert_eq!(bytes.len(), 96);
        assert_eq!(borsh::from_slice::<ValueLedger>(&bytes).unwrap(), ledger);
    }

    // ============ Properties ============

    proptest! {
        #[test]
        fn prop_bootstrap_mint(amount in 1u128..=u128::MAX) {
            let scale = SELF_ISSUING_INITIAL_MINT_SCALE;
            let amount = U256::from(amount);
            let ledger = ValueLedger::new(scale);

            match ledger.quote_mint(amount) {
                Ok(quote) => {
                    prop_assert_eq!(quote.shares, amount * (scale / amount));
                    prop_assert!(quote.shares <= scale);
                    prop_assert_eq!(quote.shares == scale, scale % amount == U256::zero());
                }
                Err(err) => {
                    prop_assert!(amount > scale);
                    let is_degenerate = matches!(err, ExaError::DegenerateRate { .. });
                    prop_assert!(is_degenerate);
                }
            }
        }

        #[test]
        fn prop_equal_deposits_mint_equal_shares(
            first in 1u64..=ETH,
            deposit in 1u64..=u64::MAX,
            count in 1usize..8,
        ) {
            let mut ledger = self_issuing();
            ledger.mint(u(first)).unwrap();
            let rate = ledger.units_per_share();

            let minted: Vec<U256> = (0..count)
                .map(|_| ledger.mint(u(deposit)).unwrap())
                .collect();

            prop_assert!(minted.iter().all(|s| *s == minted[0]));
            prop_assert_eq!(ledger.units_per_share(), rate);
        }

        #[test]
        fn prop_donation_never_raises_rate(
            first in 1u64..=ETH,
            donation in 1u64..=u64::MAX,
        ) {
            let mut ledger = self_issuing();
            ledger.mint(u(first)).unwrap();
            let rate = ledger.units_per_share();
            let shares = ledger.total_shares();

            ledger.donate(u(donation)).unwrap();

            prop_assert!(ledger.units_per_share() <= rate);
            prop_assert_eq!(ledger.total_shares(), shares);
        }

        #[test]
        fn prop_redeeming_everything_empties_ledger(
            deposits in proptest::collection::vec(1u64..=u64::MAX, 1..10),
        ) {
            let mut ledger = ValueLedger::new(u(ETH));
            let first = deposits[0] % ETH + 1;
            let mut holdings = vec![ledger.mint(u(first)).unwrap()];
            for d in &deposits[1..] {
                holdings.push(ledger.mint(u(*d)).unwrap());
            }

            let sum = holdings.iter().fold(U256::zero(), |acc, s| acc + *s);
            prop_assert_eq!(sum, ledger.total_shares());

            for shares in holdings {
                ledger.redeem(shares).unwrap();
            }
            prop_assert_eq!(ledger.total_underlying(), U256::zero());
            prop_assert_eq!(ledger.total_shares(), U256::zero());
        }

        #[test]
        fn prop_round_trip_never_profits(
            seed in 1u64..=ETH,
            donation in 0u64..=10 * ETH,
            x in 1u64..=u64::MAX,
        ) {
            let mut ledger = self_issuing();
            ledger.mint(u(seed)).unwrap();
            if donation > 0 {
                ledger.donate(u(donation)).unwrap();
            }

            if let Ok(shares) = ledger.mint(u(x)) {
                let back = ledger.redeem(shares).unwrap();
                prop_assert!(back <= u(x));
            }
        }
    }
}
