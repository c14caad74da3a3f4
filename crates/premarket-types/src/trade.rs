//! Trade records produced by the matching engine.

use serde::{Deserialize, Serialize};

use crate::{math, Address, OrderHash, Result, TargetTokenId, TradeId};

/// Settlement parameters captured when the trade was matched.
///
/// Config updates after the match never change these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTerms {
    pub seller_reward_bps: u16,
    pub late_penalty_bps: u16,
    /// Trade config version the terms were read from.
    pub config_version: u64,
}

/// A matched trade awaiting settlement or cancellation.
///
/// `settled` is the terminal flag: it is set exactly once, by either the
/// seller's settlement or the buyer's cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: TradeId,
    pub buyer: Address,
    pub seller: Address,
    pub target_token_id: TargetTokenId,
    pub collateral_token: Address,
    pub filled_amount: u64,
    pub price: u64,
    pub buyer_collateral: u64,
    pub seller_collateral: u64,
    pub match_time: i64,
    pub settled: bool,
    pub buy_order_hash: OrderHash,
    pub sell_order_hash: OrderHash,
    pub terms: SettlementTerms,
}

impl TradeRecord {
    /// Notional value `filled_amount * price / PRICE_SCALE`.
    pub fn trade_value(&self) -> Result<u64> {
        math::trade_value(self.filled_amount, self.price)
    }

    /// Last instant the seller may settle, given the market's grace period.
    #[must_use]
    pub fn grace_period_end(&self, settle_time_limit: u32) -> i64 {
        self.match_time.saturating_add(i64::from(settle_time_limit))
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.settled
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl TradeRecord {
    /// Scenario-A trade: 1000 units at 1.5, fully collateralized on both sides.
    pub fn dummy(buyer: Address, seller: Address) -> Self {
        let buy_order_hash = OrderHash([0xb0; 32]);
        let sell_order_hash = OrderHash([0x5e; 32]);
        Self {
            trade_id: TradeId::derive(&buy_order_hash, &sell_order_hash, 0),
            buyer,
            seller,
            target_token_id: TargetTokenId([0x77; 32]),
            collateral_token: Address([0xcc; 32]),
            filled_amount: 1_000,
            price: 1_500_000,
            buyer_collateral: 1_500,
            seller_collateral: 1_500,
            match_time: 0,
            settled: false,
            buy_order_hash,
            sell_order_hash,
            terms: SettlementTerms {
                seller_reward_bps: 0,
                late_penalty_bps: 10_000,
                config_version: 0,
            },
        }
    }
}
