//! Checked fixed-point arithmetic.
//!
//! Every multiplication is done in `u128` and narrowed back to `u64` with
//! `try_from`; any overflow surfaces as [`PremarketError::MathOverflow`].

use crate::constants::{BPS_DENOMINATOR, PERCENT_DENOMINATOR, PRICE_SCALE};
use crate::{PremarketError, Result};

fn narrow(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| PremarketError::MathOverflow)
}

/// `amount * price / PRICE_SCALE`, rounded down.
pub fn trade_value(amount: u64, price: u64) -> Result<u64> {
    let product = u128::from(amount)
        .checked_mul(u128::from(price))
        .ok_or(PremarketError::MathOverflow)?;
    narrow(product / u128::from(PRICE_SCALE))
}

/// `value * percent / 100`, rounded down.
pub fn apply_percent(value: u64, percent: u16) -> Result<u64> {
    let product = u128::from(value) * u128::from(percent);
    narrow(product / u128::from(PERCENT_DENOMINATOR))
}

/// `value * bps / 10_000`, rounded down.
pub fn apply_bps(value: u64, bps: u16) -> Result<u64> {
    let product = u128::from(value) * u128::from(bps);
    narrow(product / u128::from(BPS_DENOMINATOR))
}

pub fn checked_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(PremarketError::MathOverflow)
}

pub fn checked_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(PremarketError::MathOverflow)
}
