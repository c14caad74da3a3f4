//! # premarket-matching
//!
//! **Trade creation** for the pre-market protocol.
//!
//! Relayers pair orders off-ledger and submit one (buy, sell) pair at a
//! time. This crate decides whether the pair may trade and, if so, reserves
//! collateral and emits the trade:
//!
//! - [`MarketRegistry`]: target-token markets and their one-time mapping to
//!   a real token
//! - [`OrderValidator`]: deadline, amount and price-bound checks per order
//! - [`Authorizer`]: relayer whitelist or per-order Ed25519 signatures
//! - [`FillTracker`]: monotonic cumulative fills and order cancellation
//! - [`MatchingEngine`]: the ordered match pipeline, collateral locking in
//!   one ledger batch, and [`TradeRecord`](premarket_types::TradeRecord)
//!   construction

pub mod authorization;
pub mod engine;
pub mod fills;
pub mod registry;
pub mod validator;

pub use authorization::{Authorizer, MatchAuthorization};
pub use engine::{FillQuote, MatchContext, MatchRequest, MatchingEngine};
pub use fills::FillTracker;
pub use registry::MarketRegistry;
pub use validator::OrderValidator;
