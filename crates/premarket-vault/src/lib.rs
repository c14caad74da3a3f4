//! # premarket-vault
//!
//! **Collateral escrow**: per-(user, token) balances with available/locked
//! accounting, custody tracking, and the privileged operations the matching
//! and settlement logic use to reserve and release collateral.
//!
//! ## Architecture
//!
//! - [`VaultAuthority`]: admin, emergency admin, pause switch, and the
//!   whitelist of programs allowed to call privileged operations
//! - [`CollateralLedger`]: `deposit` / `withdraw` for users; `lock` /
//!   `unlock` / `payout` / [`CollateralLedger::execute`] for whitelisted
//!   programs
//! - [`LedgerBatch`]: several ledger operations applied all-or-nothing
//! - [`CustodyTracker`]: conservation check, Σ(available + locked) ≤ custody
//! - [`ExternalTokens`] / [`TokenBank`]: the token accounts custody lives in

pub mod authority;
pub mod bank;
pub mod batch;
pub mod custody;
pub mod ledger;

pub use authority::VaultAuthority;
pub use bank::{ExternalTokens, TokenBank};
pub use batch::{LedgerBatch, LedgerOp};
pub use custody::{custody_address, CustodyTracker};
pub use ledger::CollateralLedger;
