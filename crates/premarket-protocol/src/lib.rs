//! # premarket-protocol
//!
//! Single entry point for the **pre-market** trading protocol.
//!
//! Two parties agree off-ledger to exchange a token that does not exist yet.
//! Both lock collateral when a relayer submits the matched pair; the seller
//! then either delivers the real token inside the market's grace period and
//! collects both collaterals, or misses it and the buyer reclaims theirs
//! plus a penalty.
//!
//! ## Lifecycle
//!
//! ```text
//! initialize_vault ─▶ initialize_trading ─▶ add_authorized_trader(program)
//!        │
//!        ▼
//! create_token_market ─▶ deposit_collateral ─▶ match_orders ─┬─▶ settle_trade  (seller, ≤ deadline)
//!                                                            │
//!                          map_token (before settlement)     └─▶ cancel_trade  (buyer, > deadline)
//! ```
//!
//! - [`PremarketProtocol`]: every operation, backed by the vault, matching
//!   and settlement crates
//! - [`EventLog`]: what each successful operation emitted
//! - [`telemetry`]: `tracing-subscriber` setup

pub mod event_log;
pub mod protocol;
pub mod telemetry;

pub use event_log::EventLog;
pub use protocol::{
    trade_config_address, trading_program_address, vault_config_address, PremarketProtocol,
};
pub use telemetry::{init_tracing, LogFormat};

pub use premarket_matching::{MatchAuthorization, MatchRequest};
pub use premarket_settlement::{CancellationReceipt, SettlementReceipt};
