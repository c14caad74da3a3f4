//! Collateral account model for the escrow vault.
//!
//! Every (user, collateral token) pair has an `available` balance (free to
//! withdraw or lock for a new match) and a `locked` balance (reserved by open
//! trades). Accounts are created lazily on first deposit and never deleted.

use serde::{Deserialize, Serialize};

use crate::constants::USER_BALANCE_SEED;
use crate::{Address, PremarketError, Result};

/// Which balance of a collateral account a payout draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceSource {
    Available,
    Locked,
}

impl std::fmt::Display for BalanceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "AVAILABLE"),
            Self::Locked => write!(f, "LOCKED"),
        }
    }
}

/// Balance of one user in one collateral token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralAccount {
    pub owner: Address,
    pub mint: Address,
    pub available: u64,
    pub locked: u64,
    /// Lifetime deposits.
    pub total_deposited: u64,
    /// Lifetime withdrawals.
    pub total_withdrawn: u64,
}

impl CollateralAccount {
    #[must_use]
    pub fn new(owner: Address, mint: Address) -> Self {
        Self {
            owner,
            mint,
            available: 0,
            locked: 0,
            total_deposited: 0,
            total_withdrawn: 0,
        }
    }

    /// Ledger address of this account: `["user_balance", owner, mint]`.
    #[must_use]
    pub fn address(&self) -> Address {
        Address::derive(&[USER_BALANCE_SEED, self.owner.as_bytes(), self.mint.as_bytes()])
    }

    /// `available + locked`, or `None` if the sum overflows.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.available.checked_add(self.locked)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.available == 0 && self.locked == 0
    }

    pub fn credit_deposit(&mut self, amount: u64) -> Result<()> {
        let available = self
            .available
            .checked_add(amount)
            .ok_or(PremarketError::MathOverflow)?;
        let deposited = self
            .total_deposited
            .checked_add(amount)
            .ok_or(PremarketError::MathOverflow)?;
        self.available = available;
        self.total_deposited = deposited;
        Ok(())
    }

    pub fn debit_withdrawal(&mut self, amount: u64) -> Result<()> {
        if self.available < amount {
            return Err(PremarketError::InsufficientBalance {
                needed: amount,
                available: self.available,
            });
        }
        let withdrawn = self
            .total_withdrawn
            .checked_add(amount)
            .ok_or(PremarketError::MathOverflow)?;
        self.available -= amount;
        self.total_withdrawn = withdrawn;
        Ok(())
    }

    /// Move `amount` from available to locked.
    pub fn lock(&mut self, amount: u64) -> Result<()> {
        if self.available < amount {
            return Err(PremarketError::InsufficientBalance {
                needed: amount,
                available: self.available,
            });
        }
        let locked = self
            .locked
            .checked_add(amount)
            .ok_or(PremarketError::MathOverflow)?;
        self.available -= amount;
        self.locked = locked;
        Ok(())
    }

    /// Move `amount` from locked back to available.
    pub fn unlock(&mut self, amount: u64) -> Result<()> {
        if self.locked < amount {
            return Err(PremarketError::InsufficientLocked {
                needed: amount,
                locked: self.locked,
            });
        }
        let available = self
            .available
            .checked_add(amount)
            .ok_or(PremarketError::MathOverflow)?;
        self.locked -= amount;
        self.available = available;
        Ok(())
    }

    /// Remove `amount` from `source`. The tokens leave the account entirely.
    pub fn debit(&mut self, source: BalanceSource, amount: u64) -> Result<()> {
        match source {
            BalanceSource::Available => {
                if self.available < amount {
                    return Err(PremarketError::InsufficientBalance {
                        needed: amount,
                        available: self.available,
                    });
                }
                self.available -= amount;
            }
            BalanceSource::Locked => {
                if self.locked < amount {
                    return Err(PremarketError::InsufficientLocked {
                        needed: amount,
                        locked: self.locked,
                    });
                }
                self.locked -= amount;
            }
        }
        Ok(())
    }
}
