//! The collateral ledger.
//!
//! Tracks per-(user, collateral token) balances with available/locked
//! accounting. `deposit` and `withdraw` are user-facing; `lock`, `unlock`,
//! `payout` and [`CollateralLedger::execute`] are privileged and gated by the
//! vault's authorized-trader whitelist.
//!
//! Every operation is all-or-nothing. Batches are applied to scratch copies
//! of the touched accounts and the external transfers are simulated against
//! the token ledger before anything is committed.

use std::collections::HashMap;

use premarket_types::{
    Address, BalanceSource, CollateralAccount, PremarketError, Result,
};
use tracing::{debug, error, info, warn};

use crate::authority::VaultAuthority;
use crate::bank::ExternalTokens;
use crate::batch::{LedgerBatch, LedgerOp};
use crate::custody::{custody_address, CustodyTracker};

type AccountKey = (Address, Address);

#[derive(Debug, Clone, Copy)]
struct Transfer {
    mint: Address,
    from: Address,
    to: Address,
    amount: u64,
}

/// Result of applying a batch to scratch state.
#[derive(Debug, Default)]
struct Staged {
    accounts: HashMap<AccountKey, CollateralAccount>,
    transfers: Vec<Transfer>,
    outflows: HashMap<Address, u64>,
}

/// Escrow ledger for collateral tokens.
#[derive(Debug, Default)]
pub struct CollateralLedger {
    authority: Option<VaultAuthority>,
    accounts: HashMap<AccountKey, CollateralAccount>,
    custody: CustodyTracker,
}

impl CollateralLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Governance
    // -----------------------------------------------------------------------

    /// Create the global vault configuration. Callable once.
    pub fn initialize(&mut self, admin: Address, emergency_admin: Address) -> Result<()> {
        if self.authority.is_some() {
            return Err(PremarketError::AlreadyInitialized("vault"));
        }
        self.authority = Some(VaultAuthority::new(admin, emergency_admin));
        info!(admin = %admin, emergency_admin = %emergency_admin, "Vault initialized");
        Ok(())
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.authority.is_some()
    }

    pub fn authority(&self) -> Result<&VaultAuthority> {
        self.authority
            .as_ref()
            .ok_or(PremarketError::NotInitialized("vault"))
    }

    fn authority_mut(&mut self) -> Result<&mut VaultAuthority> {
        self.authority
            .as_mut()
            .ok_or(PremarketError::NotInitialized("vault"))
    }

    pub fn add_authorized_trader(&mut self, caller: &Address, program: Address) -> Result<()> {
        self.authority_mut()?.add_authorized_trader(caller, program)
    }

    pub fn remove_authorized_trader(&mut self, caller: &Address, program: &Address) -> Result<()> {
        self.authority_mut()?.remove_authorized_trader(caller, program)
    }

    pub fn pause(&mut self, caller: &Address) -> Result<()> {
        self.authority_mut()?.pause(caller)
    }

    pub fn unpause(&mut self, caller: &Address) -> Result<()> {
        self.authority_mut()?.unpause(caller)
    }

    // -----------------------------------------------------------------------
    // User-facing operations
    // -----------------------------------------------------------------------

    /// Pull `amount` of `mint` from the user's token account into custody and
    /// credit their available balance. Returns the new available balance.
    pub fn deposit<B: ExternalTokens + ?Sized>(
        &mut self,
        user: Address,
        mint: Address,
        amount: u64,
        bank: &mut B,
    ) -> Result<u64> {
        self.authority()?.ensure_not_paused()?;
        if amount == 0 {
            return Err(PremarketError::ZeroAmount);
        }

        let mut account = self.account(&user, &mint);
        account.credit_deposit(amount)?;
        bank.transfer(&mint, &user, &custody_address(&mint), amount)?;

        let new_available = account.available;
        self.accounts.insert((user, mint), account);
        self.custody.record_deposit(&mint, amount);

        info!(user = %user, mint = %mint, amount, new_available, "Collateral deposited");
        Ok(new_available)
    }

    /// Debit the user's available balance and send the tokens back to their
    /// token account. Returns the new available balance.
    pub fn withdraw<B: ExternalTokens + ?Sized>(
        &mut self,
        user: Address,
        mint: Address,
        amount: u64,
        bank: &mut B,
    ) -> Result<u64> {
        self.authority()?.ensure_not_paused()?;
        if amount == 0 {
            return Err(PremarketError::ZeroAmount);
        }

        let mut account = self.account(&user, &mint);
        account.debit_withdrawal(amount)?;
        bank.transfer(&mint, &custody_address(&mint), &user, amount)?;

        let new_available = account.available;
        self.accounts.insert((user, mint), account);
        self.custody.record_withdrawal(&mint, amount);

        info!(user = %user, mint = %mint, amount, new_available, "Collateral withdrawn");
        Ok(new_available)
    }

    // -----------------------------------------------------------------------
    // Privileged operations
    // -----------------------------------------------------------------------

    pub fn lock(&mut self, caller: &Address, owner: Address, mint: Address, amount: u64) -> Result<()> {
        let batch = LedgerBatch::new().lock(owner, mint, amount);
        self.execute_local(caller, &batch)
    }

    pub fn unlock(
        &mut self,
        caller: &Address,
        owner: Address,
        mint: Address,
        amount: u64,
    ) -> Result<()> {
        let batch = LedgerBatch::new().unlock(owner, mint, amount);
        self.execute_local(caller, &batch)
    }

    /// Debit `source` of `owner`'s balance and send the tokens to
    /// `recipient`'s external account, bypassing the owner's available
    /// balance.
    #[allow(clippy::too_many_arguments)]
    pub fn payout<B: ExternalTokens + ?Sized>(
        &mut self,
        caller: &Address,
        owner: Address,
        mint: Address,
        source: BalanceSource,
        amount: u64,
        recipient: Address,
        bank: &mut B,
    ) -> Result<()> {
        let batch = LedgerBatch::new().payout(owner, mint, source, amount, recipient);
        self.execute(caller, &batch, bank)
    }

    /// Apply `batch` atomically: either every operation takes effect or none
    /// does. Zero-amount operations are skipped.
    pub fn execute<B: ExternalTokens + ?Sized>(
        &mut self,
        caller: &Address,
        batch: &LedgerBatch,
        bank: &mut B,
    ) -> Result<()> {
        self.authority()?.ensure_privileged(caller)?;
        let staged = self.stage(batch)?;
        Self::preflight(&staged.transfers, bank)?;

        for (applied, t) in staged.transfers.iter().enumerate() {
            if let Err(err) = bank.transfer(&t.mint, &t.from, &t.to, t.amount) {
                Self::rollback(&staged.transfers[..applied], bank);
                return Err(err);
            }
        }
        self.commit(staged);

        debug!(caller = %caller, ops = batch.len(), "Ledger batch executed");
        Ok(())
    }

    /// Reverse already applied transfers, newest first.
    fn rollback<B: ExternalTokens + ?Sized>(applied: &[Transfer], bank: &mut B) {
        for t in applied.iter().rev() {
            if let Err(err) = bank.transfer(&t.mint, &t.to, &t.from, t.amount) {
                error!(
                    mint = %t.mint,
                    from = %t.to,
                    to = %t.from,
                    amount = t.amount,
                    error = %err,
                    "Transfer rollback failed"
                );
            }
        }
        warn!(reverted = applied.len(), "Ledger batch rolled back");
    }

    /// Apply a batch that only moves balances inside the vault (locks and
    /// unlocks). Fails without effect if any op would move tokens.
    pub fn execute_local(&mut self, caller: &Address, batch: &LedgerBatch) -> Result<()> {
        self.authority()?.ensure_privileged(caller)?;
        let staged = self.stage(batch)?;
        if !staged.transfers.is_empty() {
            return Err(PremarketError::Internal(
                "batch moves tokens but no token ledger was supplied".into(),
            ));
        }
        self.commit(staged);
        debug!(caller = %caller, ops = batch.len(), "Ledger batch executed");
        Ok(())
    }

    /// Apply every op to scratch copies of the touched accounts.
    fn stage(&self, batch: &LedgerBatch) -> Result<Staged> {
        let mut staged = Staged::default();

        for op in batch.ops() {
            if op.amount() == 0 {
                continue;
            }
            match *op {
                LedgerOp::Lock {
                    owner,
                    mint,
                    amount,
                } => {
                    self.scratch(&mut staged.accounts, owner, mint).lock(amount)?;
                    debug!(owner = %owner.short(), amount, "lock");
                }
                LedgerOp::Unlock {
                    owner,
                    mint,
                    amount,
                } => {
                    self.scratch(&mut staged.accounts, owner, mint)
                        .unlock(amount)?;
                    debug!(owner = %owner.short(), amount, "unlock");
                }
                LedgerOp::Payout {
                    owner,
                    mint,
                    source,
                    amount,
                    recipient,
                } => {
                    self.scratch(&mut staged.accounts, owner, mint)
                        .debit(source, amount)?;
                    let outflow = staged.outflows.entry(mint).or_insert(0);
                    *outflow = outflow
                        .checked_add(amount)
                        .ok_or(PremarketError::MathOverflow)?;
                    staged.transfers.push(Transfer {
                        mint,
                        from: custody_address(&mint),
                        to: recipient,
                        amount,
                    });
                    debug!(
                        owner = %owner.short(),
                        recipient = %recipient.short(),
                        source = %source,
                        amount,
                        "payout"
                    );
                }
                LedgerOp::ExternalTransfer {
                    mint,
                    from,
                    to,
                    amount,
                } => {
                    staged.transfers.push(Transfer {
                        mint,
                        from,
                        to,
                        amount,
                    });
                }
            }
        }
        Ok(staged)
    }

    fn scratch<'a>(
        &self,
        scratch: &'a mut HashMap<AccountKey, CollateralAccount>,
        owner: Address,
        mint: Address,
    ) -> &'a mut CollateralAccount {
        scratch
            .entry((owner, mint))
            .or_insert_with(|| self.account(&owner, &mint))
    }

    /// Replay the transfers in order against a snapshot of the touched
    /// external balances.
    fn preflight<B: ExternalTokens + ?Sized>(transfers: &[Transfer], bank: &B) -> Result<()> {
        let mut balances: HashMap<AccountKey, u64> = HashMap::new();
        for t in transfers {
            if t.from == t.to {
                continue;
            }
            let from_balance = *balances
                .entry((t.from, t.mint))
                .or_insert_with(|| bank.balance_of(&t.from, &t.mint));
            if from_balance < t.amount {
                return Err(PremarketError::InsufficientExternalBalance {
                    needed: t.amount,
                    available: from_balance,
                });
            }
            balances.insert((t.from, t.mint), from_balance - t.amount);

            let to_balance = balances
                .entry((t.to, t.mint))
                .or_insert_with(|| bank.balance_of(&t.to, &t.mint));
            *to_balance = to_balance
                .checked_add(t.amount)
                .ok_or(PremarketError::MathOverflow)?;
        }
        Ok(())
    }

    fn commit(&mut self, staged: Staged) {
        self.accounts.extend(staged.accounts);
        for (mint, amount) in staged.outflows {
            self.custody.record_withdrawal(&mint, amount);
        }
    }

    // -----------------------------------------------------------------------
    // Read API
    // -----------------------------------------------------------------------

    /// The account for (owner, mint), or a zero account if none exists yet.
    #[must_use]
    pub fn account(&self, owner: &Address, mint: &Address) -> CollateralAccount {
        self.accounts
            .get(&(*owner, *mint))
            .cloned()
            .unwrap_or_else(|| CollateralAccount::new(*owner, *mint))
    }

    /// Σ(available + locked) over every account in `mint`.
    #[must_use]
    pub fn total_balances(&self, mint: &Address) -> u128 {
        self.accounts
            .values()
            .filter(|a| a.mint == *mint)
            .map(|a| u128::from(a.available) + u128::from(a.locked))
            .sum()
    }

    /// Tokens the vault should hold for `mint`.
    #[must_use]
    pub fn custody(&self, mint: &Address) -> u128 {
        self.custody.custody(mint)
    }

    #[must_use]
    pub fn custody_tracker(&self) -> &CustodyTracker {
        &self.custody
    }

    /// Σ(available + locked) ≤ custody for `mint`.
    pub fn verify_conservation(&self, mint: &Address) -> Result<()> {
        self.custody.verify(mint, self.total_balances(mint))
    }

    /// The custody token account really holds what the tracker says.
    pub fn verify_custody_backing<B: ExternalTokens + ?Sized>(
        &self,
        mint: &Address,
        bank: &B,
    ) -> Result<()> {
        let held = u128::from(bank.balance_of(&custody_address(mint), mint));
        let expected = self.custody.custody(mint);
        if held < expected {
            return Err(PremarketError::SupplyInvariantViolation {
                reason: format!("mint {mint}: custody account holds {held}, ledger expects {expected}"),
            });
        }
        Ok(())
    }
}
