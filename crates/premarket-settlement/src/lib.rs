//! # premarket-settlement
//!
//! **Settlement state machine** for matched pre-market trades.
//!
//! Every trade ends in exactly one terminal state:
//!
//! 1. **Settled**: the seller delivered the real token within the grace
//!    period and received both collaterals plus the treasury-funded reward
//! 2. **Cancelled**: the grace period lapsed and the buyer reclaimed their
//!    collateral plus a penalty from the seller's
//!
//! ## Architecture
//!
//! - [`TradeBook`]: trade storage and the exactly-once terminal guard
//! - [`SettlementAmounts`] / [`CancellationAmounts`]: payout arithmetic from
//!   the trade's snapshotted terms
//! - [`Settler`]: the two transitions, each a single atomic ledger batch

pub mod payout;
pub mod settler;
pub mod trade_book;

pub use payout::{CancellationAmounts, SettlementAmounts};
pub use settler::{CancellationReceipt, SettlementContext, SettlementReceipt, Settler};
pub use trade_book::TradeBook;
