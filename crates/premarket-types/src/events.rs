//! Events emitted by successful protocol operations.
//!
//! Settled and cancelled trades share the same terminal flag on the record;
//! the event log is what tells the two paths apart.

use serde::{Deserialize, Serialize};

use crate::{
    Address, AuthorizationMode, EconomicConfig, OrderHash, TargetTokenId, TechnicalConfig,
    TradeId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolEvent {
    VaultInitialized {
        admin: Address,
        emergency_admin: Address,
    },
    CollateralDeposited {
        user: Address,
        mint: Address,
        amount: u64,
        new_available: u64,
    },
    CollateralWithdrawn {
        user: Address,
        mint: Address,
        amount: u64,
        new_available: u64,
    },
    TraderAuthorized {
        program: Address,
    },
    TraderRevoked {
        program: Address,
    },
    VaultPaused {
        by: Address,
    },
    VaultUnpaused {
        by: Address,
    },
    TradingInitialized {
        admin: Address,
        authorization: AuthorizationMode,
        economic: EconomicConfig,
        technical: TechnicalConfig,
    },
    TokenMarketCreated {
        token_id: TargetTokenId,
        symbol: String,
        name: String,
        settle_time_limit: u32,
        created_at: i64,
    },
    TokenMapped {
        token_id: TargetTokenId,
        real_mint: Address,
        mapping_time: i64,
    },
    RelayerAdded {
        relayer: Address,
    },
    RelayerRemoved {
        relayer: Address,
    },
    OrdersMatched {
        trade_id: TradeId,
        buyer: Address,
        seller: Address,
        target_token_id: TargetTokenId,
        filled_amount: u64,
        price: u64,
        buyer_collateral: u64,
        seller_collateral: u64,
        match_time: i64,
    },
    TradeSettled {
        trade_id: TradeId,
        seller: Address,
        buyer: Address,
        real_mint: Address,
        delivered: u64,
        collateral_released: u64,
        seller_reward: u64,
        settled_at: i64,
    },
    TradeCancelled {
        trade_id: TradeId,
        buyer: Address,
        seller: Address,
        penalty: u64,
        buyer_refund: u64,
        seller_refund: u64,
        cancelled_at: i64,
    },
    OrderCancelled {
        order_hash: OrderHash,
        trader: Address,
        target_token_id: TargetTokenId,
        cancelled_at: i64,
    },
    EconomicConfigUpdated {
        config: EconomicConfig,
        version: u64,
    },
    TechnicalConfigUpdated {
        config: TechnicalConfig,
        version: u64,
    },
    TradingPaused {
        by: Address,
    },
    TradingUnpaused {
        by: Address,
    },
}

impl ProtocolEvent {
    /// Short name for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VaultInitialized { .. } => "vault_initialized",
            Self::CollateralDeposited { .. } => "collateral_deposited",
            Self::CollateralWithdrawn { .. } => "collateral_withdrawn",
            Self::TraderAuthorized { .. } => "trader_authorized",
            Self::TraderRevoked { .. } => "trader_revoked",
            Self::VaultPaused { .. } => "vault_paused",
            Self::VaultUnpaused { .. } => "vault_unpaused",
            Self::TradingInitialized { .. } => "trading_initialized",
            Self::TokenMarketCreated { .. } => "token_market_created",
            Self::TokenMapped { .. } => "token_mapped",
            Self::RelayerAdded { .. } => "relayer_added",
            Self::RelayerRemoved { .. } => "relayer_removed",
            Self::OrdersMatched { .. } => "orders_matched",
            Self::TradeSettled { .. } => "trade_settled",
            Self::TradeCancelled { .. } => "trade_cancelled",
            Self::OrderCancelled { .. } => "order_cancelled",
            Self::EconomicConfigUpdated { .. } => "economic_config_updated",
            Self::TechnicalConfigUpdated { .. } => "technical_config_updated",
            Self::TradingPaused { .. } => "trading_paused",
            Self::TradingUnpaused { .. } => "trading_unpaused",
        }
    }
}
