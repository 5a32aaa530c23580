//! Pool Constants
//!
//! All magic numbers and configuration defaults for the EXA pool.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (tight oracle freshness window)
//! - Default (no feature) - Testnet values (relaxed for local runs)
//!
//! ```toml
//! # For mainnet deployment:
//! exa-common = { path = "...", features = ["mainnet"] }
//! ```

use crate::types::U256;

/// Share Token Metadata
pub mod token {
    /// Token name
    pub const NAME: &str = "Exactly LP Token";
    /// Token symbol
    pub const SYMBOL: &str = "EXA";
    /// Decimal places (same as the native coin)
    pub const DECIMALS: u8 = 18;
}

/// Base asset (native coin) denomination
pub mod base {
    /// Decimal places of the native coin
    pub const DECIMALS: u8 = 18;
    /// One whole coin in base units (1e18 wei)
    pub const ONE: u64 = 1_000_000_000_000_000_000;
}

/// Bootstrap scale constants used only for the very first mint
pub mod scale {
    use super::U256;

    /// Delegated share token variant (10^18)
    pub const DELEGATED_INITIAL_MINT_SCALE: U256 = U256([1_000_000_000_000_000_000, 0, 0, 0]);

    /// Self-issuing variant (10^36)
    pub const SELF_ISSUING_INITIAL_MINT_SCALE: U256 =
        U256([12_919_594_847_110_692_864, 54_210_108_624_275_221, 0, 0]);
}

/// Price Feed Configuration
pub mod oracle {
    /// Maximum rate age in blocks before considered stale
    /// - Mainnet: 300 blocks (~1 hour at 12s blocks)
    /// - Testnet: 7200 blocks (~1 day)
    #[cfg(feature = "mainnet")]
    pub const MAX_RATE_AGE_BLOCKS: u64 = 300;
    #[cfg(not(feature = "mainnet"))]
    pub const MAX_RATE_AGE_BLOCKS: u64 = 7_200;

    /// Maximum allowed rate deviation per update (5%)
    pub const MAX_RATE_DEVIATION_BPS: u64 = 500;

    /// Feed precision (8 decimals, Chainlink style)
    pub const FEED_DECIMALS: u8 = 8;

    /// Decimal places of the alternate asset (DAI style)
    pub const ALT_DECIMALS: u8 = 18;

    /// Basis points denominator
    pub const BPS_DENOMINATOR: u64 = 10_000;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::pow10;

    #[test]
    fn test_scale_constants() {
        assert_eq!(scale::DELEGATED_INITIAL_MINT_SCALE, pow10(18).unwrap());
        assert_eq!(scale::SELF_ISSUING_INITIAL_MINT_SCALE, pow10(36).unwrap());
        assert_eq!(
            scale::SELF_ISSUING_INITIAL_MINT_SCALE,
            scale::DELEGATED_INITIAL_MINT_SCALE * scale::DELEGATED_INITIAL_MINT_SCALE
        );
    }

    #[test]
    fn test_base_unit() {
        assert_eq!(U256::from(base::ONE), pow10(base::DECIMALS as u32).unwrap());
    }
}
