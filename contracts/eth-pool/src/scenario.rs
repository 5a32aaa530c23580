//! Scripted pool walkthrough
//!
//! Deploys a pool from a TOML description and runs the operator flow
//! against it: the wallet supplies a tenth of its coin, the team adds a
//! tenth of the wallet's coin, the wallet supplies a tenth of its alternate
//! balance, then withdraws everything it holds.

use serde::Deserialize;
use tracing::{error, info, warn};

use exa_common::{
    errors::{ExaError, ExaResult},
    events::ExaEvent,
    token_ops::{AssetLedger, ShareToken},
    types::{hex_address, Address, CallContext, ShareIssuance, U256},
};
use exa_price_feed::{FeedParams, FeedState, RateFeed};
use exa_token::{ShareLedger, TokenLedger};

use crate::{EthPool, LedgerPool, PoolConfig, PoolStats};

// ============ Config ============

/// One funded account
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    #[serde(with = "hex_address")]
    pub address: Address,
    /// Native coin balance
    #[serde(default)]
    pub base: U256,
    /// Alternate asset balance
    #[serde(default)]
    pub alternate: U256,
}

/// Initial reading for the operated feed
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub rate: U256,
    #[serde(default)]
    pub params: FeedParams,
}

/// Full scenario description
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_start_block")]
    pub start_block: u64,
    pub pool: PoolConfig,
    /// The account driving deposits and withdrawals
    pub wallet: WalletConfig,
    /// Native coin held by the team
    #[serde(default)]
    pub team_base: U256,
    /// Required when the pool takes an alternate asset
    #[serde(default)]
    pub feed: Option<FeedConfig>,
}

fn default_start_block() -> u64 {
    1
}

impl ScenarioConfig {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}

// ============ Report ============

/// What one step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub name: &'static str,
    pub block_height: u64,
    pub result: Result<U256, ExaError>,
}

/// Everything the run produced
#[derive(Debug)]
pub struct ScenarioReport {
    pub steps: Vec<StepOutcome>,
    pub events: Vec<ExaEvent>,
    pub stats: PoolStats,
    pub pool: LedgerPool,
}

impl ScenarioReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| s.result.is_err())
    }

    pub fn succeeded(&self) -> bool {
        self.failures().next().is_none()
    }
}

// ============ Deployment ============

/// Build the pool and its ledgers, funding the wallet and the team
pub fn deploy(config: &ScenarioConfig) -> ExaResult<LedgerPool> {
    let pool_config = config.pool.clone();
    let wallet = &config.wallet;
    let ctx = CallContext::new(wallet.address, config.start_block);

    let mut native = TokenLedger::new("ETH", pool_config.conversion.base_decimals);
    native.credit(&wallet.address, wallet.base)?;
    native.credit(&pool_config.team, config.team_base)?;

    let (alternate, feed) = if pool_config.accepts_alternate() {
        let feed_config = config.feed.as_ref().ok_or(ExaError::InvalidInput {
            param: "feed",
            reason: "alternate asset configured without an initial rate",
        })?;

        let mut alternate = TokenLedger::new("DAI", pool_config.conversion.alt_decimals);
        alternate.credit(&wallet.address, wallet.alternate)?;

        // the team runs the feed
        let team = pool_config.team;
        let mut feed = RateFeed::new(FeedState::new(team, team, feed_config.params));
        feed.update_rate(&ctx.with_caller(team), feed_config.rate)?;

        (Some(alternate), Some(feed))
    } else {
        (None, None)
    };

    match pool_config.issuance {
        ShareIssuance::SelfIssuing => EthPool::self_issuing(pool_config, native, alternate, feed),
        ShareIssuance::Delegated => {
            // wallet deploys the token, then hands the minter role over
            let mut shares = ShareLedger::new(wallet.address)?;
            shares.transfer_minter(&ctx, &pool_config.pool_address)?;
            info!(minter = %hex::encode(pool_config.pool_address), "share token ownership transferred");
            EthPool::new(pool_config, shares, native, alternate, feed)
        }
    }
}

// ============ Run ============

/// Deploy and run the walkthrough
///
/// With `strict`, the first failing step aborts the run; otherwise every
/// step is attempted and failures land in the report.
pub fn run(config: &ScenarioConfig, strict: bool) -> ExaResult<ScenarioReport> {
    let mut pool = deploy(config)?;
    let wallet = config.wallet.address;
    let team = pool.team();
    let mut block = config.start_block;
    let mut steps = Vec::new();

    let mut record = |name: &'static str, block_height: u64, result: ExaResult<U256>| -> ExaResult<()> {
        match &result {
            Ok(amount) => info!(step = name, %amount, "step done"),
            Err(e) => error!(step = name, code = e.code(), error = %e, "step failed"),
        }
        let failed = result.as_ref().err().cloned();
        steps.push(StepOutcome {
            name,
            block_height,
            result,
        });
        match failed {
            Some(e) if strict => Err(e),
            _ => Ok(()),
        }
    };

    // 1. Wallet supplies a tenth of its coin
    block += 1;
    let amount = pool.native().balance_of(&wallet) / 10;
    let result = pool.supply(&CallContext::new(wallet, block), amount);
    record("supply", block, result)?;

    // 2. Team adds a tenth of the wallet's coin
    block += 1;
    let amount = pool.native().balance_of(&wallet) / 10;
    let result = pool.receive(&CallContext::new(team, block), amount).map(|_| amount);
    record("team_add_eth", block, result)?;
    info!(custody = %pool.custody(), "pool balance");

    // 3. Wallet supplies a tenth of its alternate balance
    if pool.config().accepts_alternate() {
        block += 1;
        let ctx = CallContext::new(wallet, block);
        let pool_address = pool.pool_address();
        let approved = match pool.alternate_mut() {
            Some(alternate) => {
                let amount = alternate.balance_of(&wallet) / 10;
                alternate
                    .approve(&ctx, &pool_address, amount)
                    .map(|_| amount)
            }
            None => Err(ExaError::AlternateAssetNotConfigured),
        };
        let result = approved.and_then(|amount| pool.supply_with_alternate(&ctx, amount));
        record("supply_with_alternate", block, result)?;
    } else {
        warn!("no alternate asset configured, skipping alternate deposit");
    }

    // 4. Wallet withdraws everything it holds
    block += 1;
    let shares = pool.shares().balance_of(&wallet);
    let result = pool.withdraw(&CallContext::new(wallet, block), shares);
    record("withdraw_all", block, result)?;

    let stats = pool.stats();
    info!(
        custody = %stats.custody,
        total_underlying = %stats.total_underlying,
        total_shares = %stats.total_shares,
        "pool balance at the end"
    );

    Ok(ScenarioReport {
        steps,
        events: pool.take_events(),
        stats,
        pool,
    })
}
