//! Integration Tests
//!
//! Tests that drive the ledger, converter and access guards together the
//! way the pool does, without any token bookkeeping.

#[cfg(test)]
mod tests {
    use crate::*;
    use crate::access_control::*;
    use crate::constants::scale::*;
    use std::collections::BTreeMap;

    const ETH: u64 = 1_000_000_000_000_000_000;
    const HALF_ETH: u64 = ETH / 2;

    fn team() -> Address {
        [1u8; 32]
    }

    fn alice() -> Address {
        [2u8; 32]
    }

    fn bob() -> Address {
        [3u8; 32]
    }

    fn eth(n: u64) -> U256 {
        U256::from(n) * U256::from(ETH)
    }

    struct Feed(U256);

    impl PriceFeed for Feed {
        fn current_rate(&self, _block_height: u64) -> ExaResult<U256> {
            Ok(self.0)
        }

        fn decimals(&self) -> u8 {
            8
        }
    }

    /// Ledger plus a holder map, enough to check conservation
    struct Book {
        ledger: ValueLedger,
        balances: BTreeMap<Address, U256>,
    }

    impl Book {
        fn new(scale: U256) -> Self {
            Self {
                ledger: ValueLedger::new(scale),
                balances: BTreeMap::new(),
            }
        }

        fn deposit(&mut self, who: Address, amount: U256) -> U256 {
            let shares = self.ledger.mint(amount).unwrap();
            *self.balances.entry(who).or_default() += shares;
            shares
        }

        fn withdraw_all(&mut self, who: Address) -> U256 {
            let shares = self.balances.remove(&who).unwrap_or_default();
            self.ledger.redeem(shares).unwrap()
        }

        fn sum(&self) -> U256 {
            self.balances.values().fold(U256::zero(), |acc, b| acc + *b)
        }
    }

    // ============================================================================
    // Scenarios
    // ============================================================================

    #[test]
    fn test_deposit_donate_withdraw() {
        let mut book = Book::new(SELF_ISSUING_INITIAL_MINT_SCALE);

        // 1. First deposit of 0.5 normalizes to the full scale
        let shares = book.deposit(alice(), U256::from(HALF_ETH));
        assert_eq!(shares, SELF_ISSUING_INITIAL_MINT_SCALE);
        let rate_before = book.ledger.units_per_share();

        // 2. Team donation of 0.5
        require_team(&team(), &team()).unwrap();
        book.ledger.donate(U256::from(HALF_ETH)).unwrap();
        assert_eq!(book.ledger.total_underlying(), eth(1));
        assert_eq!(book.ledger.units_per_share(), rate_before / 2);

        // 3. Withdraw everything
        let paid = book.withdraw_all(alice());
        assert_eq!(paid, eth(1));
        assert!(book.ledger.is_empty());
        assert_eq!(book.ledger.total_underlying(), U256::zero());
    }

    #[test]
    fn test_alternate_deposit_mints_at_converted_value() {
        let mut book = Book::new(SELF_ISSUING_INITIAL_MINT_SCALE);
        let converter = PriceConverter::default();
        let feed = Feed(U256::from(1000u64 * 100_000_000));

        let conversion = converter
            .to_base_equivalent(&feed, eth(1000), eth(1000), 10)
            .unwrap();
        let shares = book.deposit(bob(), conversion.base_amount);

        assert_eq!(conversion.base_amount, eth(1));
        // 1e36 / 1e18 = 1e18 per unit, times 1e18 units
        assert_eq!(shares, SELF_ISSUING_INITIAL_MINT_SCALE);
        assert_eq!(book.ledger.total_underlying(), eth(1));
    }

    #[test]
    fn test_two_holders_share_donation_pro_rata() {
        let mut book = Book::new(SELF_ISSUING_INITIAL_MINT_SCALE);

        book.deposit(alice(), eth(1));
        book.deposit(bob(), eth(3));
        assert_eq!(book.sum(), book.ledger.total_shares());

        book.ledger.donate(eth(4)).unwrap();

        let alice_paid = book.withdraw_all(alice());
        let bob_paid = book.withdraw_all(bob());

        assert_eq!(alice_paid, eth(2));
        assert_eq!(bob_paid, eth(6));
        assert!(book.ledger.is_empty());
    }

    #[test]
    fn test_late_depositor_does_not_capture_earlier_yield() {
        let mut book = Book::new(SELF_ISSUING_INITIAL_MINT_SCALE);

        book.deposit(alice(), eth(1));
        book.ledger.donate(eth(1)).unwrap();
        book.deposit(bob(), eth(2));

        let bob_paid = book.withdraw_all(bob());
        let alice_paid = book.withdraw_all(alice());

        assert!(bob_paid <= eth(2));
        assert_eq!(alice_paid, eth(4) - bob_paid);
    }

    #[test]
    fn test_delegated_scale_bootstrap_limit() {
        // One whole coin is the largest first deposit the 1e18 scale accepts
        let mut book = Book::new(DELEGATED_INITIAL_MINT_SCALE);
        assert!(matches!(
            book.ledger.quote_mint(eth(2)),
            Err(ExaError::DegenerateRate { .. })
        ));
        assert_eq!(book.deposit(alice(), eth(1)), DELEGATED_INITIAL_MINT_SCALE);

        // after bootstrap the rate is 1 and any size works
        assert_eq!(book.deposit(bob(), eth(5)), eth(5));
    }

    #[test]
    fn test_zero_rate_aborts_before_ledger_changes() {
        let mut book = Book::new(SELF_ISSUING_INITIAL_MINT_SCALE);
        book.deposit(alice(), eth(1));
        let before = book.ledger.clone();

        let converter = PriceConverter::default();
        let result = converter.to_base_equivalent(&Feed(U256::zero()), U256::from(1000u64), U256::from(1000u64), 1);

        assert_eq!(
            result,
            Err(ExaError::DivFailed {
                numerator: U256::from(1000u64),
                denominator: U256::zero(),
            })
        );
        assert_eq!(book.ledger, before);
    }
}
