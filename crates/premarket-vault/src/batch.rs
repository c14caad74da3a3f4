//! Staged multi-operation ledger updates.
//!
//! A match locks two balances; a settlement or cancellation pays out of up
//! to three balances and moves real tokens. Each is expressed as one
//! [`LedgerBatch`] that the ledger applies all-or-nothing.

use premarket_types::{Address, BalanceSource};

/// One step of a [`LedgerBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    /// available → locked.
    Lock {
        owner: Address,
        mint: Address,
        amount: u64,
    },
    /// locked → available.
    Unlock {
        owner: Address,
        mint: Address,
        amount: u64,
    },
    /// Debit `source` of `owner`'s account and send the tokens from custody
    /// to `recipient`'s external account.
    Payout {
        owner: Address,
        mint: Address,
        source: BalanceSource,
        amount: u64,
        recipient: Address,
    },
    /// Move tokens between two external accounts, outside the vault.
    ExternalTransfer {
        mint: Address,
        from: Address,
        to: Address,
        amount: u64,
    },
}

impl LedgerOp {
    #[must_use]
    pub fn amount(&self) -> u64 {
        match self {
            Self::Lock { amount, .. }
            | Self::Unlock { amount, .. }
            | Self::Payout { amount, .. }
            | Self::ExternalTransfer { amount, .. } => *amount,
        }
    }
}

/// Ordered list of ledger operations applied atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerBatch {
    ops: Vec<LedgerOp>,
}

impl LedgerBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lock(mut self, owner: Address, mint: Address, amount: u64) -> Self {
        self.ops.push(LedgerOp::Lock { owner, mint, amount });
        self
    }

    #[must_use]
    pub fn unlock(mut self, owner: Address, mint: Address, amount: u64) -> Self {
        self.ops.push(LedgerOp::Unlock { owner, mint, amount });
        self
    }

    #[must_use]
    pub fn payout(
        mut self,
        owner: Address,
        mint: Address,
        source: BalanceSource,
        amount: u64,
        recipient: Address,
    ) -> Self {
        self.ops.push(LedgerOp::Payout {
            owner,
            mint,
            source,
            amount,
            recipient,
        });
        self
    }

    #[must_use]
    pub fn external_transfer(mut self, mint: Address, from: Address, to: Address, amount: u64) -> Self {
        self.ops.push(LedgerOp::ExternalTransfer {
            mint,
            from,
            to,
            amount,
        });
        self
    }

    #[must_use]
    pub fn ops(&self) -> &[LedgerOp] {
        &self.ops
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }
}
