//! # premarket-types
//!
//! Shared types, errors, and configuration for the **pre-market** trading
//! protocol.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Address`], [`OrderHash`], [`TargetTokenId`], [`TradeId`]
//! - **Order model**: [`PreOrder`], [`OrderSide`]
//! - **Market model**: [`TokenMarket`]
//! - **Balance model**: [`CollateralAccount`], [`BalanceSource`]
//! - **Trade model**: [`TradeRecord`], [`SettlementTerms`]
//! - **Configuration**: [`EconomicConfig`], [`TechnicalConfig`],
//!   [`AuthorizationMode`], [`ProtocolSettings`], [`TradeConfig`]
//! - **Events**: [`ProtocolEvent`]
//! - **Errors**: [`PremarketError`] with `PM_ERR_` prefix codes
//! - **Time**: [`Clock`], [`SystemClock`]
//! - **Arithmetic**: [`math`] checked fixed-point helpers
//! - **Constants**: protocol limits and seeds

pub mod balance;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod ids;
pub mod market;
pub mod math;
pub mod order;
pub mod trade;

pub use balance::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use ids::*;
pub use market::*;
pub use order::*;
pub use trade::*;

// Constants and math are accessed by path
// (`premarket_types::constants::PRICE_SCALE`, `premarket_types::math::apply_bps`).

// Signatures travel as the ed25519-dalek type.
pub use ed25519_dalek::Signature;
