//! Core Types for the EXA Pool
//!
//! Fixed-width amounts, account identifiers and the small enums shared by
//! the pool, token and feed crates.

use core::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use uint::construct_uint;

use crate::errors::{ExaError, ExaResult};

construct_uint! {
    /// 256-bit unsigned integer used for every amount, share count and rate.
    pub struct U256(4);
}

/// Type alias for account and component addresses (32-byte hash)
pub type Address = [u8; 32];

/// The null address
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Marker address standing for the chain's native coin
pub const NATIVE_ASSET: Address = [0xee; 32];

/// Returns true for the null address
pub fn is_zero_address(address: &Address) -> bool {
    *address == ZERO_ADDRESS
}

/// Derive a deterministic component address from its deployer and nonce
pub fn derive_address(deployer: &Address, nonce: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(deployer);
    hasher.update(nonce.to_le_bytes());
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

/// Parse a 64-character hex string (optional `0x` prefix) into an address
pub fn parse_address(input: &str) -> ExaResult<Address> {
    let trimmed = input.strip_prefix("0x").unwrap_or(input);
    let bytes = hex::decode(trimmed).map_err(|_| ExaError::InvalidInput {
        param: "address",
        reason: "not valid hex",
    })?;
    bytes.try_into().map_err(|_| ExaError::InvalidInput {
        param: "address",
        reason: "must be 32 bytes",
    })
}

/// Serde helpers that read and write an [`Address`] as a hex string
pub mod hex_address {
    use super::{parse_address, Address};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(address)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_address(&s).map_err(serde::de::Error::custom)
    }

    /// Same encoding for optional addresses
    pub mod option {
        use super::{parse_address, Address};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            address: &Option<Address>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match address {
                Some(a) => super::serialize(a, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Address>, D::Error> {
            let s: Option<String> = Option::deserialize(deserializer)?;
            s.map(|s| parse_address(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

// ============ Call Context ============

/// Who is calling and at which block
///
/// Every mutating operation on the pool, the ledgers and the feed takes one
/// of these; the host substrate is responsible for authenticating `caller`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub block_height: u64,
}

impl CallContext {
    pub fn new(caller: Address, block_height: u64) -> Self {
        Self { caller, block_height }
    }

    /// Same block, different caller (a component calling onward)
    pub fn with_caller(&self, caller: Address) -> Self {
        Self { caller, block_height: self.block_height }
    }
}

// ============ U256 Encoding ============

// Decimal string keeps full precision in JSON/TOML; plain integers are
// accepted on input for small literals in config files.
impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct U256Visitor;

impl<'de> Visitor<'de> for U256Visitor {
    type Value = U256;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal string or unsigned integer")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<U256, E> {
        Ok(U256::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<U256, E> {
        u64::try_from(v)
            .map(U256::from)
            .map_err(|_| E::custom("negative amount"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
        U256::from_dec_str(v.trim()).map_err(|_| E::custom("invalid decimal amount"))
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(U256Visitor)
    }
}

// 32 bytes little-endian
impl BorshSerialize for U256 {
    fn serialize<W: borsh::io::Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        let mut bytes = [0u8; 32];
        self.to_little_endian(&mut bytes);
        writer.write_all(&bytes)
    }
}

impl BorshDeserialize for U256 {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let mut bytes = [0u8; 32];
        reader.read_exact(&mut bytes)?;
        Ok(U256::from_little_endian(&bytes))
    }
}

/// `10^exp` as a U256
pub fn pow10(exp: u32) -> ExaResult<U256> {
    U256::from(10u64)
        .checked_pow(U256::from(exp))
        .ok_or(ExaError::Overflow)
}

// ============ Deployment Enums ============

/// Which historical share-token arrangement a pool is deployed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareIssuance {
    /// Share token is a separate ledger whose minter is handed to the pool
    Delegated,
    /// The pool creates and owns its own share ledger
    #[default]
    SelfIssuing,
}

impl ShareIssuance {
    /// Bootstrap scale this variant was deployed with
    pub fn default_initial_mint_scale(&self) -> U256 {
        match self {
            Self::Delegated => crate::constants::scale::DELEGATED_INITIAL_MINT_SCALE,
            Self::SelfIssuing => crate::constants::scale::SELF_ISSUING_INITIAL_MINT_SCALE,
        }
    }
}

/// How the feed quotes the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateOrientation {
    /// Alternate-asset units per one base unit (e.g. ETH/DAI = 1000)
    #[default]
    AltPerBase,
    /// Base-asset units per one alternate unit (e.g. DAI/ETH = 0.001)
    BasePerAlt,
}
