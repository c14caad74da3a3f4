//! Custody conservation tracking.
//!
//! Invariant checked after every ledger mutation:
//! ```text
//! ∀ mint: Σ(available + locked) ≤ Σ(inflows) - Σ(outflows)
//! ```
//!
//! Inflows are deposits. Outflows are withdrawals and payouts. A breach means
//! the ledger has promised users more than the vault holds.

use std::collections::HashMap;

use premarket_types::constants::VAULT_AUTHORITY_SEED;
use premarket_types::{Address, PremarketError, Result};

/// Token account holding the vault's custody of `mint`:
/// `["vault_authority", mint]`.
#[must_use]
pub fn custody_address(mint: &Address) -> Address {
    Address::derive(&[VAULT_AUTHORITY_SEED, mint.as_bytes()])
}

/// Per-mint running totals of tokens that entered and left custody.
#[derive(Debug, Clone, Default)]
pub struct CustodyTracker {
    deposits: HashMap<Address, u128>,
    withdrawals: HashMap<Address, u128>,
}

impl CustodyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_deposit(&mut self, mint: &Address, amount: u64) {
        *self.deposits.entry(*mint).or_insert(0) += u128::from(amount);
    }

    /// Record tokens leaving custody (withdrawal or payout).
    pub fn record_withdrawal(&mut self, mint: &Address, amount: u64) {
        *self.withdrawals.entry(*mint).or_insert(0) += u128::from(amount);
    }

    #[must_use]
    pub fn total_deposits(&self, mint: &Address) -> u128 {
        self.deposits.get(mint).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_withdrawals(&self, mint: &Address) -> u128 {
        self.withdrawals.get(mint).copied().unwrap_or(0)
    }

    /// Tokens the vault should currently hold for `mint`.
    #[must_use]
    pub fn custody(&self, mint: &Address) -> u128 {
        self.total_deposits(mint)
            .saturating_sub(self.total_withdrawals(mint))
    }

    /// Check that user claims on `mint` are covered by custody.
    pub fn verify(&self, mint: &Address, total_claims: u128) -> Result<()> {
        let custody = self.custody(mint);
        if total_claims > custody {
            return Err(PremarketError::SupplyInvariantViolation {
                reason: format!(
                    "mint {mint}: balances {total_claims} exceed custody {custody} \
                     (deposits={}, withdrawals={})",
                    self.total_deposits(mint),
                    self.total_withdrawals(mint),
                ),
            });
        }
        Ok(())
    }

    /// Every mint that has ever entered custody.
    #[must_use]
    pub fn tracked_mints(&self) -> Vec<Address> {
        let mut mints: Vec<Address> = self.deposits.keys().copied().collect();
        mints.sort();
        mints
    }
}
