//! Stateless checks on a single order.
//!
//! Runs on each side of a pair before anything touches the ledger. The
//! checks are ordered and each fails fast with its own error.

use premarket_types::constants::{MAX_PRICE, MIN_PRICE};
use premarket_types::{EconomicConfig, PreOrder, PremarketError, Result};

/// Order validator. Holds no state.
pub struct OrderValidator;

impl OrderValidator {
    /// Validate `order` at time `now` under `economic` limits.
    ///
    /// Order of checks:
    /// 1. deadline strictly after `now`
    /// 2. amount > 0
    /// 3. amount ≤ `maximum_order_amount`
    /// 4. `MIN_PRICE` ≤ price ≤ `MAX_PRICE`
    pub fn validate(order: &PreOrder, now: i64, economic: &EconomicConfig) -> Result<()> {
        if order.is_expired_at(now) {
            return Err(PremarketError::OrderExpired {
                deadline: order.deadline,
                now,
            });
        }
        if order.amount == 0 {
            return Err(PremarketError::ZeroAmount);
        }
        if order.amount > economic.maximum_order_amount {
            return Err(PremarketError::ExceedOrderAmount {
                amount: order.amount,
                maximum: economic.maximum_order_amount,
            });
        }
        if order.price < MIN_PRICE {
            return Err(PremarketError::PriceTooLow {
                price: order.price,
                minimum: MIN_PRICE,
            });
        }
        if order.price > MAX_PRICE {
            return Err(PremarketError::PriceTooHigh {
                price: order.price,
                maximum: MAX_PRICE,
            });
        }
        Ok(())
    }
}
