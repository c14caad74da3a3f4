//! External token accounts.
//!
//! Collateral enters the vault from a user's own token account and leaves to
//! a recipient's token account. [`ExternalTokens`] is that outside ledger;
//! [`TokenBank`] is the in-memory implementation used by the protocol and
//! its tests.

use std::collections::HashMap;

use premarket_types::{Address, PremarketError, Result};

/// An external token ledger keyed by (owner, mint).
pub trait ExternalTokens {
    fn balance_of(&self, owner: &Address, mint: &Address) -> u64;

    /// Move `amount` of `mint` from `from` to `to`. Either the whole transfer
    /// happens or nothing does.
    ///
    /// Implementations must succeed whenever `balance_of` shows `from`
    /// holding at least `amount`. A refusal in the middle of a ledger batch
    /// makes the ledger reverse the transfers it already applied, and those
    /// reversals rely on the same guarantee.
    fn transfer(
        &mut self,
        mint: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<()>;
}

/// In-memory token balances.
#[derive(Debug, Clone, Default)]
pub struct TokenBank {
    balances: HashMap<(Address, Address), u64>,
}

impl TokenBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new tokens in `owner`'s account.
    pub fn mint_to(&mut self, owner: Address, mint: Address, amount: u64) -> Result<()> {
        let entry = self.balances.entry((owner, mint)).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(PremarketError::MathOverflow)?;
        Ok(())
    }

    /// Sum of every account's balance in `mint`.
    #[must_use]
    pub fn total_supply(&self, mint: &Address) -> u128 {
        self.balances
            .iter()
            .filter(|((_, m), _)| m == mint)
            .map(|(_, amount)| u128::from(*amount))
            .sum()
    }
}

impl ExternalTokens for TokenBank {
    fn balance_of(&self, owner: &Address, mint: &Address) -> u64 {
        self.balances.get(&(*owner, *mint)).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        mint: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<()> {
        if amount == 0 || from == to {
            return Ok(());
        }
        let from_balance = self.balance_of(from, mint);
        if from_balance < amount {
            return Err(PremarketError::InsufficientExternalBalance {
                needed: amount,
                available: from_balance,
            });
        }
        let to_balance = self
            .balance_of(to, mint)
            .checked_add(amount)
            .ok_or(PremarketError::MathOverflow)?;
        self.balances.insert((*from, *mint), from_balance - amount);
        self.balances.insert((*to, *mint), to_balance);
        Ok(())
    }
}
