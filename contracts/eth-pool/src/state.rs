//! Persisted pool state
//!
//! [`PoolState`] is what the pool itself owns between calls. A
//! [`PoolSnapshot`] adds the deployment config and the share balances so a
//! pool can be rebuilt elsewhere.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use exa_common::{
    errors::{ExaError, ExaResult},
    types::{hex_address, Address, U256},
    value_ledger::ValueLedger,
};

use crate::config::PoolConfig;

// ============ Pool State ============

/// Mutable pool state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolState {
    /// Current team
    #[serde(with = "hex_address")]
    pub team: Address,
    /// Share accounting
    pub ledger: ValueLedger,
}

impl PoolState {
    pub fn new(team: Address, initial_mint_scale: U256) -> Self {
        Self {
            team,
            ledger: ValueLedger::new(initial_mint_scale),
        }
    }

    /// SHA-256 over the borsh encoding
    pub fn digest(&self) -> [u8; 32] {
        let bytes = borsh::to_vec(self).unwrap_or_default();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(&bytes));
        digest
    }
}

// ============ Snapshot ============

/// One holder's share balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ShareBalance {
    #[serde(with = "hex_address")]
    pub holder: Address,
    pub balance: U256,
}

/// Everything needed to rebuild a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolSnapshot {
    pub config: PoolConfig,
    pub state: PoolState,
    /// Non-zero share balances, ordered by holder
    pub holders: Vec<ShareBalance>,
    /// Base coin held by the pool when the snapshot was taken
    pub custody: U256,
    pub block_height: u64,
}

impl PoolSnapshot {
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> ExaResult<Self> {
        borsh::from_slice(bytes).map_err(|_| ExaError::InvalidInput {
            param: "snapshot",
            reason: "not a borsh-encoded pool snapshot",
        })
    }

    /// Holder balances as plain pairs
    pub fn holder_pairs(&self) -> Vec<(Address, U256)> {
        self.holders.iter().map(|h| (h.holder, h.balance)).collect()
    }

    /// Statistics as of the snapshot
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_underlying: self.state.ledger.total_underlying(),
            total_shares: self.state.ledger.total_shares(),
            units_per_share: self.state.ledger.units_per_share(),
            custody: self.custody,
            holder_count: self.holders.len(),
        }
    }
}

// ============ Stats ============

/// Pool summary for dashboards and the balance job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_underlying: U256,
    pub total_shares: U256,
    pub units_per_share: U256,
    /// Base coin actually held (can trail `total_underlying` after
    /// alternate-asset deposits)
    pub custody: U256,
    pub holder_count: usize,
}
