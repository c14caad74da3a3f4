//! Cumulative fill accounting per order hash.
//!
//! The filled amount of an order only ever grows and never exceeds the
//! order's amount. Cancelled orders accept no further fills.

use std::collections::{HashMap, HashSet};

use premarket_types::{OrderHash, PreOrder, PremarketError, Result};

#[derive(Debug, Default)]
pub struct FillTracker {
    filled: HashMap<OrderHash, u64>,
    cancelled: HashSet<OrderHash>,
}

impl FillTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filled(&self, hash: &OrderHash) -> u64 {
        self.filled.get(hash).copied().unwrap_or(0)
    }

    /// `amount - filled`, never negative.
    #[must_use]
    pub fn remaining(&self, order: &PreOrder) -> u64 {
        order.amount.saturating_sub(self.filled(&order.hash()))
    }

    /// The filled total after adding `amount`, without recording it.
    pub fn check_fill(&self, hash: &OrderHash, amount: u64, order_amount: u64) -> Result<u64> {
        let total = self
            .filled(hash)
            .checked_add(amount)
            .ok_or(PremarketError::MathOverflow)?;
        if total > order_amount {
            return Err(PremarketError::ExceedOrderAmount {
                amount: total,
                maximum: order_amount,
            });
        }
        Ok(total)
    }

    /// Add `amount` to the order's filled total. Returns the new total.
    pub fn record_fill(&mut self, hash: OrderHash, amount: u64, order_amount: u64) -> Result<u64> {
        let total = self.check_fill(&hash, amount, order_amount)?;
        self.filled.insert(hash, total);
        Ok(total)
    }

    pub fn cancel(&mut self, hash: OrderHash) -> Result<()> {
        if !self.cancelled.insert(hash) {
            return Err(PremarketError::OrderCancelled(hash));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_cancelled(&self, hash: &OrderHash) -> bool {
        self.cancelled.contains(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use premarket_types::{Address, OrderSide, TargetTokenId};
    use proptest::prelude::*;

    fn order(amount: u64) -> PreOrder {
        PreOrder::dummy(
            Address([1u8; 32]),
            OrderSide::Sell,
            Address([2u8; 32]),
            TargetTokenId([3u8; 32]),
            amount,
            1_000_000,
        )
    }

    #[test]
    fn fills_accumulate() {
        let mut fills = FillTracker::new();
        let o = order(1_000);
        assert_eq!(fills.remaining(&o), 1_000);
        assert_eq!(fills.record_fill(o.hash(), 400, o.amount).unwrap(), 400);
        assert_eq!(fills.record_fill(o.hash(), 600, o.amount).unwrap(), 1_000);
        assert_eq!(fills.remaining(&o), 0);
    }

    #[test]
    fn overfill_rejected_without_change() {
        let mut fills = FillTracker::new();
        let o = order(1_000);
        fills.record_fill(o.hash(), 900, o.amount).unwrap();
        assert!(matches!(
            fills.record_fill(o.hash(), 101, o.amount),
            Err(PremarketError::ExceedOrderAmount { .. })
        ));
        assert_eq!(fills.filled(&o.hash()), 900);
    }

    #[test]
    fn cancel_is_once() {
        let mut fills = FillTracker::new();
        let h = order(1).hash();
        fills.cancel(h).unwrap();
        assert!(fills.is_cancelled(&h));
        assert!(matches!(fills.cancel(h), Err(PremarketError::OrderCancelled(_))));
    }

    proptest! {
        #[test]
        fn filled_is_monotonic_and_bounded(
            amount in 1u64..1_000_000,
            steps in prop::collection::vec(0u64..400_000, 1..20),
        ) {
            let mut fills = FillTracker::new();
            let o = order(amount);
            let mut previous = 0;
            for step in steps {
                let _ = fills.record_fill(o.hash(), step, o.amount);
                let now = fills.filled(&o.hash());
                prop_assert!(now >= previous);
                prop_assert!(now <= amount);
                previous = now;
            }
        }
    }
}
