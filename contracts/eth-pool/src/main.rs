//! exa-pool: local ETHPool simulator
//!
//! ```text
//! exa-pool scenario --config scenario.toml [--snapshot pool.bin] [--strict]
//! exa-pool inspect --snapshot pool.bin [--json]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use exa_eth_pool::{
    scenario::{self, ScenarioConfig},
    PoolSnapshot,
};

#[derive(Parser)]
#[command(name = "exa-pool", version, about = "Run and inspect a local ETHPool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy from a config file and run the supply/donate/withdraw walkthrough
    Scenario {
        /// Deployment and wallet description
        #[arg(long, env = "EXA_POOL_CONFIG")]
        config: PathBuf,
        /// Write the final pool snapshot here
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Stop at the first failing step
        #[arg(long)]
        strict: bool,
    },
    /// Report the balances recorded in a snapshot
    Inspect {
        #[arg(long)]
        snapshot: PathBuf,
        /// Print the whole snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Scenario {
            config,
            snapshot,
            strict,
        } => run_scenario(&config, snapshot.as_deref(), strict),
        Command::Inspect { snapshot, json } => inspect(&snapshot, json),
    }
}

fn run_scenario(config_path: &Path, snapshot: Option<&Path>, strict: bool) -> Result<()> {
    let input = fs::read_to_string(config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let config = ScenarioConfig::from_toml(&input)
        .with_context(|| format!("parsing {}", config_path.display()))?;

    info!(pool = %hex::encode(config.pool.pool_address), "deploying contracts");
    let report = scenario::run(&config, strict)
        .map_err(|e| anyhow::anyhow!("{} ({})", e, e.code()))
        .context("scenario aborted")?;

    for event in &report.events {
        info!(?event, "pool event");
    }

    if let Some(path) = snapshot {
        let last_block = report.steps.last().map_or(config.start_block, |s| s.block_height);
        let snapshot = report.pool.snapshot(last_block);
        fs::write(path, snapshot.to_bytes())
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), digest = %hex::encode(snapshot.state.digest()), "snapshot written");
    }

    let failed = report.failures().count();
    if failed > 0 {
        warn!(failed, "scenario finished with failed steps");
    } else {
        info!("scenario finished");
    }
    Ok(())
}

fn inspect(path: &Path, json: bool) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot = PoolSnapshot::from_bytes(&bytes)
        .with_context(|| format!("decoding {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let stats = snapshot.stats();
    if stats.custody < stats.total_underlying {
        warn!(
            custody = %stats.custody,
            total_underlying = %stats.total_underlying,
            "custody trails underlying (alternate-asset deposits)"
        );
    }
    if stats.holder_count == 0 && !stats.total_shares.is_zero() {
        bail!("snapshot has outstanding shares but no holders");
    }

    info!(
        block = snapshot.block_height,
        team = %hex::encode(snapshot.state.team),
        custody = %stats.custody,
        total_underlying = %stats.total_underlying,
        total_shares = %stats.total_shares,
        units_per_share = %stats.units_per_share,
        holders = stats.holder_count,
        "pool balance"
    );
    Ok(())
}
