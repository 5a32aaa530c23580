//! EXA Common Library
//!
//! Shared types, constants and accounting for the EXA pooled-asset vault.
//!
//! Depositors hand the pool native coin (or an alternate asset priced by a
//! rate feed) and receive EXA shares. The team can fold extra value into the
//! pool without minting, which raises what every share redeems for.
//!
//! ## Modules
//!
//! - **Value Ledger**: exchange-rate arithmetic for mint, redeem and donation
//! - **Oracle**: `PriceFeed` interface and alternate-asset conversion
//! - **Token Operations**: `ShareToken` / `AssetLedger` capability traits
//! - **Access Control**: team, admin and operator guards
//! - **Events**: domain events and the per-call event log
//!
//! All arithmetic is checked 256-bit; nothing wraps.

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod validation;
pub mod value_ledger;
pub mod oracle;
pub mod token_ops;
pub mod access_control;

#[cfg(test)]
mod integration_tests;

// Re-exports for convenience
pub use errors::*;
pub use types::*;
pub use events::*;
pub use value_ledger::*;
pub use oracle::*;
pub use token_ops::*;
