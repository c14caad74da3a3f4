//! Vault governance: admins, pause switch, and the privileged-caller whitelist.
//!
//! `lock`, `unlock` and `payout` are never callable by end users. The vault
//! enforces this with an explicit check keyed to the caller's identity, so
//! only programs the admin has whitelisted may move escrowed collateral.

use premarket_types::constants::MAX_AUTHORIZED_TRADERS;
use premarket_types::{Address, PremarketError, Result};
use tracing::{info, warn};

/// Global vault configuration (`["vault_config"]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultAuthority {
    admin: Address,
    emergency_admin: Address,
    paused: bool,
    authorized_traders: Vec<Address>,
}

impl VaultAuthority {
    #[must_use]
    pub fn new(admin: Address, emergency_admin: Address) -> Self {
        Self {
            admin,
            emergency_admin,
            paused: false,
            authorized_traders: Vec::new(),
        }
    }

    #[must_use]
    pub fn admin(&self) -> Address {
        self.admin
    }

    #[must_use]
    pub fn emergency_admin(&self) -> Address {
        self.emergency_admin
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn authorized_traders(&self) -> &[Address] {
        &self.authorized_traders
    }

    #[must_use]
    pub fn is_authorized_trader(&self, program: &Address) -> bool {
        self.authorized_traders.contains(program)
    }

    pub fn ensure_not_paused(&self) -> Result<()> {
        if self.paused {
            Err(PremarketError::VaultPaused)
        } else {
            Ok(())
        }
    }

    /// Gate for privileged ledger operations.
    pub fn ensure_privileged(&self, caller: &Address) -> Result<()> {
        self.ensure_not_paused()?;
        if !self.is_authorized_trader(caller) {
            warn!(caller = %caller, "Rejected privileged ledger call");
            return Err(PremarketError::UnauthorizedCaller(*caller));
        }
        Ok(())
    }

    pub fn add_authorized_trader(&mut self, caller: &Address, program: Address) -> Result<()> {
        self.ensure_admin(caller)?;
        if self.authorized_traders.contains(&program) {
            return Err(PremarketError::TraderAlreadyAuthorized(program));
        }
        if self.authorized_traders.len() >= MAX_AUTHORIZED_TRADERS {
            return Err(PremarketError::TooManyAuthorizedTraders {
                max: MAX_AUTHORIZED_TRADERS,
            });
        }
        self.authorized_traders.push(program);
        info!(program = %program, "Authorized trader program");
        Ok(())
    }

    pub fn remove_authorized_trader(&mut self, caller: &Address, program: &Address) -> Result<()> {
        self.ensure_admin(caller)?;
        let pos = self
            .authorized_traders
            .iter()
            .position(|p| p == program)
            .ok_or(PremarketError::TraderNotFound(*program))?;
        self.authorized_traders.remove(pos);
        info!(program = %program, "Revoked trader program");
        Ok(())
    }

    pub fn pause(&mut self, caller: &Address) -> Result<()> {
        self.ensure_emergency_admin(caller)?;
        if self.paused {
            return Err(PremarketError::VaultPaused);
        }
        self.paused = true;
        warn!(by = %caller, "Vault paused");
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Address) -> Result<()> {
        self.ensure_emergency_admin(caller)?;
        if !self.paused {
            return Err(PremarketError::VaultNotPaused);
        }
        self.paused = false;
        info!(by = %caller, "Vault unpaused");
        Ok(())
    }

    fn ensure_admin(&self, caller: &Address) -> Result<()> {
        if *caller == self.admin {
            Ok(())
        } else {
            Err(PremarketError::InvalidAdmin(*caller))
        }
    }

    fn ensure_emergency_admin(&self, caller: &Address) -> Result<()> {
        if *caller == self.emergency_admin {
            Ok(())
        } else {
            Err(PremarketError::InvalidEmergencyAdmin(*caller))
        }
    }
}
