//! Payout arithmetic for the two terminal paths.
//!
//! Amounts are computed from the trade's own snapshot of settlement terms,
//! never from the live config.

use premarket_types::{math, Result, TradeRecord};

/// What the seller receives on a timely delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementAmounts {
    pub trade_value: u64,
    /// `trade_value * seller_reward_bps / 10_000`, paid from the treasury.
    pub seller_reward: u64,
    /// Both sides' locked collateral, released to the seller.
    pub collateral_released: u64,
    /// `collateral_released + seller_reward`.
    pub total: u64,
}

impl SettlementAmounts {
    pub fn compute(trade: &TradeRecord) -> Result<Self> {
        let trade_value = trade.trade_value()?;
        let seller_reward = math::apply_bps(trade_value, trade.terms.seller_reward_bps)?;
        let collateral_released = math::checked_add(trade.buyer_collateral, trade.seller_collateral)?;
        Ok(Self {
            trade_value,
            seller_reward,
            collateral_released,
            total: math::checked_add(collateral_released, seller_reward)?,
        })
    }
}

/// Refunds after the seller missed the grace period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationAmounts {
    pub trade_value: u64,
    /// Taken from the seller's collateral; never more than it.
    pub penalty: u64,
    pub buyer_refund: u64,
    pub seller_refund: u64,
}

impl CancellationAmounts {
    pub fn compute(trade: &TradeRecord) -> Result<Self> {
        let trade_value = trade.trade_value()?;
        let penalty = math::apply_bps(trade_value, trade.terms.late_penalty_bps)?
            .min(trade.seller_collateral);
        Ok(Self {
            trade_value,
            penalty,
            buyer_refund: math::checked_add(trade.buyer_collateral, penalty)?,
            seller_refund: trade.seller_collateral.saturating_sub(penalty),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use premarket_types::Address;
    use proptest::prelude::*;

    fn trade() -> TradeRecord {
        TradeRecord::dummy(Address([1u8; 32]), Address([2u8; 32]))
    }

    #[test]
    fn settlement_without_reward() {
        let amounts = SettlementAmounts::compute(&trade()).unwrap();
        assert_eq!(amounts.trade_value, 1_500);
        assert_eq!(amounts.seller_reward, 0);
        assert_eq!(amounts.total, 3_000);
    }

    #[test]
    fn settlement_with_reward() {
        let mut t = trade();
        t.terms.seller_reward_bps = 500;
        let amounts = SettlementAmounts::compute(&t).unwrap();
        assert_eq!(amounts.seller_reward, 75);
        assert_eq!(amounts.total, 3_075);
    }

    #[test]
    fn full_penalty() {
        let amounts = CancellationAmounts::compute(&trade()).unwrap();
        assert_eq!(amounts.penalty, 1_500);
        assert_eq!(amounts.buyer_refund, 3_000);
        assert_eq!(amounts.seller_refund, 0);
    }

    #[test]
    fn partial_penalty() {
        let mut t = trade();
        t.terms.late_penalty_bps = 2_000;
        let amounts = CancellationAmounts::compute(&t).unwrap();
        assert_eq!(amounts.penalty, 300);
        assert_eq!(amounts.buyer_refund, 1_800);
        assert_eq!(amounts.seller_refund, 1_200);
    }

    #[test]
    fn penalty_capped_by_seller_collateral() {
        let mut t = trade();
        t.seller_collateral = 750;
        let amounts = CancellationAmounts::compute(&t).unwrap();
        assert_eq!(amounts.penalty, 750);
        assert_eq!(amounts.seller_refund, 0);
    }

    proptest! {
        #[test]
        fn penalty_never_exceeds_seller_collateral(
            filled in 1u64..1_000_000_000,
            price in 1_000u64..10_000_000_000,
            seller_ratio in 1u16..=200,
            penalty_bps in 0u16..=10_000,
        ) {
            let mut t = trade();
            t.filled_amount = filled;
            t.price = price;
            let value = t.trade_value().unwrap();
            t.buyer_collateral = value;
            t.seller_collateral = math::apply_percent(value, seller_ratio).unwrap();
            t.terms.late_penalty_bps = penalty_bps;

            let amounts = CancellationAmounts::compute(&t).unwrap();
            prop_assert!(amounts.penalty <= t.seller_collateral);
            prop_assert_eq!(amounts.penalty + amounts.seller_refund, t.seller_collateral);
            prop_assert_eq!(amounts.buyer_refund + amounts.seller_refund,
                t.buyer_collateral + t.seller_collateral);
        }
    }
}
