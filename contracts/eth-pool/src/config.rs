//! Pool deployment configuration
//!
//! Everything fixed at deployment: who the pool is, who the team starts as,
//! which share-token arrangement it uses and, optionally, which alternate
//! asset it accepts and how that asset is priced.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use exa_common::{
    check,
    errors::{ExaError, ExaResult},
    oracle::ConversionConfig,
    types::{hex_address, Address, ShareIssuance, U256, NATIVE_ASSET},
    validation::require_address,
};

fn native_asset() -> Address {
    NATIVE_ASSET
}

/// Deployment parameters of one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolConfig {
    /// Address the pool holds custody under
    #[serde(with = "hex_address")]
    pub pool_address: Address,
    /// Initial team (can donate and hand over the role)
    #[serde(with = "hex_address")]
    pub team: Address,
    /// Share-token arrangement
    #[serde(default)]
    pub issuance: ShareIssuance,
    /// Bootstrap scale override; the issuance variant's scale when absent
    #[serde(default)]
    pub initial_mint_scale: Option<U256>,
    /// The base asset (native coin marker unless overridden)
    #[serde(with = "hex_address", default = "native_asset")]
    pub base_asset: Address,
    /// Alternate asset accepted through `supply_with_alternate`
    #[serde(with = "hex_address::option", default)]
    pub alternate_asset: Option<Address>,
    /// Feed pricing the alternate asset
    #[serde(with = "hex_address::option", default)]
    pub price_feed: Option<Address>,
    #[serde(default)]
    pub conversion: ConversionConfig,
}

impl PoolConfig {
    /// Base-coin-only pool
    pub fn new(pool_address: Address, team: Address, issuance: ShareIssuance) -> Self {
        Self {
            pool_address,
            team,
            issuance,
            initial_mint_scale: None,
            base_asset: NATIVE_ASSET,
            alternate_asset: None,
            price_feed: None,
            conversion: ConversionConfig::default(),
        }
    }

    /// Pool whose share token is deployed separately and handed over
    pub fn delegated(pool_address: Address, team: Address) -> Self {
        Self::new(pool_address, team, ShareIssuance::Delegated)
    }

    /// Pool that issues its own shares
    pub fn self_issuing(pool_address: Address, team: Address) -> Self {
        Self::new(pool_address, team, ShareIssuance::SelfIssuing)
    }

    /// Accept `asset`, priced by `feed`
    pub fn with_alternate(mut self, asset: Address, feed: Address, conversion: ConversionConfig) -> Self {
        self.alternate_asset = Some(asset);
        self.price_feed = Some(feed);
        self.conversion = conversion;
        self
    }

    pub fn with_initial_mint_scale(mut self, scale: U256) -> Self {
        self.initial_mint_scale = Some(scale);
        self
    }

    /// Scale the first deposit is normalized against
    pub fn initial_mint_scale(&self) -> U256 {
        self.initial_mint_scale
            .unwrap_or_else(|| self.issuance.default_initial_mint_scale())
    }

    /// Reject configurations the pool cannot run with
    ///
    /// # Errors
    /// - `AddressZero` for a null pool, team, base or alternate address
    /// - `InvalidInput` for a zero scale or an alternate asset without a feed
    pub fn validate(&self) -> ExaResult<()> {
        // 1. Addresses must be real
        require_address(&self.pool_address)?;
        require_address(&self.team)?;
        require_address(&self.base_asset)?;

        // 2. Scale must be positive
        check!(
            !self.initial_mint_scale().is_zero(),
            ExaError::InvalidInput {
                param: "initial_mint_scale",
                reason: "must be positive",
            }
        );

        // 3. Alternate asset and feed come as a pair
        match (&self.alternate_asset, &self.price_feed) {
            (Some(asset), Some(feed)) => {
                require_address(asset)?;
                require_address(feed)?;
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(ExaError::InvalidInput {
                    param: "price_feed",
                    reason: "alternate asset requires a price feed",
                })
            }
            (None, Some(_)) => {
                return Err(ExaError::InvalidInput {
                    param: "alternate_asset",
                    reason: "price feed without an alternate asset",
                })
            }
        }
        Ok(())
    }

    pub fn accepts_alternate(&self) -> bool {
        self.alternate_asset.is_some()
    }
}
