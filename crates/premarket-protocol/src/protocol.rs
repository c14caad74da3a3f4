//! The protocol facade.
//!
//! [`PremarketProtocol`] owns every piece of state: the collateral ledger,
//! the external token accounts, the market registry, the matching engine,
//! the settler, the trading config and the event log. Each public method is
//! one independently authorized operation. It reads the clock once, runs to
//! completion, and either commits all of its effects or returns an error
//! with none.

use premarket_matching::{MarketRegistry, MatchContext, MatchRequest, MatchingEngine};
use premarket_settlement::{
    CancellationReceipt, SettlementContext, SettlementReceipt, Settler, TradeBook,
};
use premarket_types::constants::{TRADE_CONFIG_SEED, TRADING_PROGRAM_SEED, VAULT_CONFIG_SEED};
use premarket_types::{
    Address, Clock, CollateralAccount, EconomicConfig, OrderHash, PreOrder, PremarketError,
    ProtocolEvent, ProtocolSettings, Result, Signature, SystemClock, TargetTokenId,
    TechnicalConfig, TokenMarket, TradeConfig, TradeId, TradeRecord,
};
use premarket_vault::{custody_address, CollateralLedger, TokenBank};
use tracing::{debug, info};

use crate::event_log::EventLog;

/// Identity the trading logic presents to the vault's privileged operations.
#[must_use]
pub fn trading_program_address() -> Address {
    Address::derive(&[TRADING_PROGRAM_SEED])
}

/// Address of the global vault configuration record.
#[must_use]
pub fn vault_config_address() -> Address {
    Address::derive(&[VAULT_CONFIG_SEED])
}

/// Address of the global trading configuration record.
#[must_use]
pub fn trade_config_address() -> Address {
    Address::derive(&[TRADE_CONFIG_SEED])
}

pub struct PremarketProtocol<C: Clock = SystemClock> {
    clock: C,
    ledger: CollateralLedger,
    bank: TokenBank,
    registry: MarketRegistry,
    engine: MatchingEngine,
    settler: Settler,
    trading: Option<TradeConfig>,
    events: EventLog,
}

impl PremarketProtocol<SystemClock> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for PremarketProtocol<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PremarketProtocol<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            ledger: CollateralLedger::new(),
            bank: TokenBank::new(),
            registry: MarketRegistry::new(),
            engine: MatchingEngine::new(),
            settler: Settler::new(),
            trading: None,
            events: EventLog::new(),
        }
    }

    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Vault
    // -----------------------------------------------------------------------

    /// Create the global vault config. Callable once, by anyone.
    pub fn initialize_vault(
        &mut self,
        deployer: &Address,
        admin: Address,
        emergency_admin: Address,
    ) -> Result<()> {
        self.ledger.initialize(admin, emergency_admin)?;
        info!(
            deployer = %deployer.short(),
            config = %vault_config_address().short(),
            "Vault deployed"
        );
        self.events.emit(ProtocolEvent::VaultInitialized {
            admin,
            emergency_admin,
        });
        Ok(())
    }

    /// Move `amount` from the user's token account into custody. Returns the
    /// new available balance.
    pub fn deposit_collateral(&mut self, user: Address, mint: Address, amount: u64) -> Result<u64> {
        let new_available = self.ledger.deposit(user, mint, amount, &mut self.bank)?;
        self.events.emit(ProtocolEvent::CollateralDeposited {
            user,
            mint,
            amount,
            new_available,
        });
        Ok(new_available)
    }

    /// Return available collateral to the user's token account.
    pub fn withdraw_collateral(
        &mut self,
        user: Address,
        mint: Address,
        amount: u64,
    ) -> Result<u64> {
        let new_available = self.ledger.withdraw(user, mint, amount, &mut self.bank)?;
        self.events.emit(ProtocolEvent::CollateralWithdrawn {
            user,
            mint,
            amount,
            new_available,
        });
        Ok(new_available)
    }

    pub fn add_authorized_trader(&mut self, admin: &Address, program: Address) -> Result<()> {
        self.ledger.add_authorized_trader(admin, program)?;
        self.events.emit(ProtocolEvent::TraderAuthorized { program });
        Ok(())
    }

    pub fn remove_authorized_trader(&mut self, admin: &Address, program: &Address) -> Result<()> {
        self.ledger.remove_authorized_trader(admin, program)?;
        self.events
            .emit(ProtocolEvent::TraderRevoked { program: *program });
        Ok(())
    }

    /// Halt deposits, withdrawals and every privileged ledger operation.
    pub fn pause_vault(&mut self, emergency_admin: &Address) -> Result<()> {
        self.ledger.pause(emergency_admin)?;
        self.events.emit(ProtocolEvent::VaultPaused {
            by: *emergency_admin,
        });
        Ok(())
    }

    pub fn unpause_vault(&mut self, emergency_admin: &Address) -> Result<()> {
        self.ledger.unpause(emergency_admin)?;
        self.events.emit(ProtocolEvent::VaultUnpaused {
            by: *emergency_admin,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Trading administration
    // -----------------------------------------------------------------------

    /// Create the trading config. Callable once, after the vault exists.
    ///
    /// Returns the trading program identity. The vault admin must whitelist
    /// it with [`Self::add_authorized_trader`] before any match can lock
    /// collateral.
    pub fn initialize_trading(
        &mut self,
        deployer: &Address,
        admin: Address,
        settings: &ProtocolSettings,
    ) -> Result<Address> {
        if self.trading.is_some() {
            return Err(PremarketError::AlreadyInitialized("trading"));
        }
        if !self.ledger.is_initialized() {
            return Err(PremarketError::NotInitialized("vault"));
        }
        settings.validate()?;

        let program = trading_program_address();
        let config = TradeConfig::new(admin, program, settings);
        info!(
            deployer = %deployer.short(),
            config = %trade_config_address().short(),
            program = %program.short(),
            treasury = %config.treasury.short(),
            "Trading deployed"
        );
        self.events.emit(ProtocolEvent::TradingInitialized {
            admin,
            authorization: config.authorization,
            economic: config.economic,
            technical: config.technical,
        });
        self.trading = Some(config);
        Ok(program)
    }

    pub fn create_token_market(
        &mut self,
        admin: &Address,
        symbol: &str,
        name: &str,
        settle_time_limit: u32,
    ) -> Result<TargetTokenId> {
        let config = self
            .trading
            .as_ref()
            .ok_or(PremarketError::NotInitialized("trading"))?;
        config.ensure_admin(admin)?;
        let now = self.clock.now();
        let token_id =
            self.registry
                .create_market(symbol, name, settle_time_limit, &config.technical, now)?;
        self.events.emit(ProtocolEvent::TokenMarketCreated {
            token_id,
            symbol: symbol.to_string(),
            name: name.to_string(),
            settle_time_limit,
            created_at: now,
        });
        Ok(token_id)
    }

    /// Bind a market to its real token, once and irreversibly.
    pub fn map_token(
        &mut self,
        admin: &Address,
        token_id: &TargetTokenId,
        real_mint: Address,
    ) -> Result<()> {
        self.config()?.ensure_admin(admin)?;
        let now = self.clock.now();
        self.registry.map_token(token_id, real_mint, now)?;
        self.events.emit(ProtocolEvent::TokenMapped {
            token_id: *token_id,
            real_mint,
            mapping_time: now,
        });
        Ok(())
    }

    /// Add (`add = true`) or revoke a relayer.
    pub fn manage_relayers(&mut self, admin: &Address, relayer: Address, add: bool) -> Result<()> {
        let config = self.config_mut()?;
        config.ensure_admin(admin)?;
        if add {
            config.add_relayer(relayer)?;
            info!(relayer = %relayer.short(), version = config.version, "Relayer added");
            self.events.emit(ProtocolEvent::RelayerAdded { relayer });
        } else {
            config.remove_relayer(&relayer)?;
            info!(relayer = %relayer.short(), version = config.version, "Relayer removed");
            self.events.emit(ProtocolEvent::RelayerRemoved { relayer });
        }
        Ok(())
    }

    /// Replace the economic parameters. Returns the new config version.
    /// Trades already matched keep the terms they were matched under.
    pub fn update_economic_config(&mut self, admin: &Address, economic: EconomicConfig) -> Result<u64> {
        let config = self.config_mut()?;
        config.ensure_admin(admin)?;
        config.update_economic(economic)?;
        let version = config.version;
        info!(version, "Economic config updated");
        self.events.emit(ProtocolEvent::EconomicConfigUpdated {
            config: economic,
            version,
        });
        Ok(version)
    }

    /// Replace the settle-time bounds. Existing markets are not re-checked.
    pub fn update_technical_config(
        &mut self,
        admin: &Address,
        technical: TechnicalConfig,
    ) -> Result<u64> {
        let config = self.config_mut()?;
        config.ensure_admin(admin)?;
        config.update_technical(technical)?;
        let version = config.version;
        info!(version, "Technical config updated");
        self.events.emit(ProtocolEvent::TechnicalConfigUpdated {
            config: technical,
            version,
        });
        Ok(version)
    }

    /// Halt matching, settlement and order cancellation.
    pub fn pause_trading(&mut self, admin: &Address) -> Result<()> {
        let config = self.config_mut()?;
        config.ensure_admin(admin)?;
        config.pause()?;
        info!(by = %admin.short(), "Trading paused");
        self.events.emit(ProtocolEvent::TradingPaused { by: *admin });
        Ok(())
    }

    pub fn unpause_trading(&mut self, admin: &Address) -> Result<()> {
        let config = self.config_mut()?;
        config.ensure_admin(admin)?;
        config.unpause()?;
        info!(by = %admin.short(), "Trading unpaused");
        self.events.emit(ProtocolEvent::TradingUnpaused { by: *admin });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Trading
    // -----------------------------------------------------------------------

    /// Execute a pre-selected (buy, sell) pair and store the resulting trade.
    pub fn match_orders(&mut self, request: &MatchRequest) -> Result<TradeRecord> {
        let config = self
            .trading
            .as_ref()
            .ok_or(PremarketError::NotInitialized("trading"))?;
        let now = self.clock.now();
        let trade = self.engine.match_orders(
            request,
            MatchContext {
                config,
                registry: &self.registry,
                ledger: &mut self.ledger,
                now,
            },
        )?;
        self.settler.record(trade.clone())?;
        self.events.emit(ProtocolEvent::OrdersMatched {
            trade_id: trade.trade_id,
            buyer: trade.buyer,
            seller: trade.seller,
            target_token_id: trade.target_token_id,
            filled_amount: trade.filled_amount,
            price: trade.price,
            buyer_collateral: trade.buyer_collateral,
            seller_collateral: trade.seller_collateral,
            match_time: trade.match_time,
        });
        Ok(trade)
    }

    /// Seller delivers within the grace period.
    pub fn settle_trade(&mut self, caller: &Address, trade_id: &TradeId) -> Result<SettlementReceipt> {
        let config = self
            .trading
            .as_ref()
            .ok_or(PremarketError::NotInitialized("trading"))?;
        let now = self.clock.now();
        let receipt = self.settler.settle(
            trade_id,
            caller,
            SettlementContext {
                config,
                registry: &self.registry,
                ledger: &mut self.ledger,
                bank: &mut self.bank,
                now,
            },
        )?;
        self.events.emit(ProtocolEvent::TradeSettled {
            trade_id: receipt.trade_id,
            seller: receipt.seller,
            buyer: receipt.buyer,
            real_mint: receipt.real_mint,
            delivered: receipt.delivered,
            collateral_released: receipt.amounts.collateral_released,
            seller_reward: receipt.amounts.seller_reward,
            settled_at: receipt.settled_at,
        });
        Ok(receipt)
    }

    /// Buyer reclaims collateral after the grace period lapsed.
    pub fn cancel_trade(
        &mut self,
        caller: &Address,
        trade_id: &TradeId,
    ) -> Result<CancellationReceipt> {
        let config = self
            .trading
            .as_ref()
            .ok_or(PremarketError::NotInitialized("trading"))?;
        let now = self.clock.now();
        let receipt = self.settler.cancel(
            trade_id,
            caller,
            SettlementContext {
                config,
                registry: &self.registry,
                ledger: &mut self.ledger,
                bank: &mut self.bank,
                now,
            },
        )?;
        self.events.emit(ProtocolEvent::TradeCancelled {
            trade_id: receipt.trade_id,
            buyer: receipt.buyer,
            seller: receipt.seller,
            penalty: receipt.amounts.penalty,
            buyer_refund: receipt.amounts.buyer_refund,
            seller_refund: receipt.amounts.seller_refund,
            cancelled_at: receipt.cancelled_at,
        });
        Ok(receipt)
    }

    /// The trader withdraws an order so it accepts no further fills.
    /// `signature` is required when orders are signature-verified.
    pub fn cancel_order(
        &mut self,
        trader: &Address,
        order: &PreOrder,
        signature: Option<&Signature>,
    ) -> Result<OrderHash> {
        let config = self
            .trading
            .as_ref()
            .ok_or(PremarketError::NotInitialized("trading"))?;
        let now = self.clock.now();
        let order_hash = self
            .engine
            .cancel_order(trader, order, signature, config, now)?;
        self.events.emit(ProtocolEvent::OrderCancelled {
            order_hash,
            trader: *trader,
            target_token_id: order.target_token_id,
            cancelled_at: now,
        });
        Ok(order_hash)
    }

    // -----------------------------------------------------------------------
    // Read API
    // -----------------------------------------------------------------------

    pub fn config(&self) -> Result<&TradeConfig> {
        self.trading
            .as_ref()
            .ok_or(PremarketError::NotInitialized("trading"))
    }

    fn config_mut(&mut self) -> Result<&mut TradeConfig> {
        self.trading
            .as_mut()
            .ok_or(PremarketError::NotInitialized("trading"))
    }

    #[must_use]
    pub fn trade(&self, trade_id: &TradeId) -> Option<&TradeRecord> {
        self.settler.book().get(trade_id)
    }

    #[must_use]
    pub fn trades(&self) -> &TradeBook {
        self.settler.book()
    }

    #[must_use]
    pub fn market(&self, token_id: &TargetTokenId) -> Option<&TokenMarket> {
        self.registry.get(token_id)
    }

    #[must_use]
    pub fn market_by_symbol(&self, symbol: &str) -> Option<&TokenMarket> {
        self.registry.by_symbol(symbol)
    }

    #[must_use]
    pub fn account(&self, owner: &Address, mint: &Address) -> CollateralAccount {
        self.ledger.account(owner, mint)
    }

    /// Cumulative filled amount of an order.
    #[must_use]
    pub fn filled(&self, order_hash: &OrderHash) -> u64 {
        self.engine.fills().filled(order_hash)
    }

    #[must_use]
    pub fn is_order_cancelled(&self, order_hash: &OrderHash) -> bool {
        self.engine.fills().is_cancelled(order_hash)
    }

    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    #[must_use]
    pub fn ledger(&self) -> &CollateralLedger {
        &self.ledger
    }

    /// External token accounts: user wallets, custody, real tokens.
    #[must_use]
    pub fn bank(&self) -> &TokenBank {
        &self.bank
    }

    /// Credit `owner`'s external wallet with newly issued `mint` tokens.
    /// Custody accounts only change through the collateral ledger, so they
    /// cannot be funded here.
    pub fn fund_wallet(&mut self, owner: Address, mint: Address, amount: u64) -> Result<()> {
        if owner == custody_address(&mint) {
            return Err(PremarketError::UnauthorizedCaller(owner));
        }
        self.bank.mint_to(owner, mint, amount)?;
        debug!(owner = %owner.short(), mint = %mint, amount, "Wallet funded");
        Ok(())
    }

    /// Ledger claims for `mint` never exceed custody, and custody is really
    /// held by the custody token account.
    pub fn verify_conservation(&self, mint: &Address) -> Result<()> {
        self.ledger.verify_conservation(mint)?;
        self.ledger.verify_custody_backing(mint, &self.bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use premarket_types::ManualClock;

    const DEPLOYER: Address = Address([9u8; 32]);
    const ADMIN: Address = Address([1u8; 32]);
    const EMERGENCY: Address = Address([2u8; 32]);

    fn protocol() -> (PremarketProtocol<Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        (PremarketProtocol::with_clock(Arc::clone(&clock)), clock)
    }

    #[test]
    fn trading_requires_vault() {
        let (mut p, _) = protocol();
        assert!(matches!(
            p.initialize_trading(&DEPLOYER, ADMIN, &ProtocolSettings::default()),
            Err(PremarketError::NotInitialized("vault"))
        ));
        p.initialize_vault(&DEPLOYER, ADMIN, EMERGENCY).unwrap();
        let program = p
            .initialize_trading(&DEPLOYER, ADMIN, &ProtocolSettings::default())
            .unwrap();
        assert_eq!(program, trading_program_address());
        assert!(matches!(
            p.initialize_trading(&DEPLOYER, ADMIN, &ProtocolSettings::default()),
            Err(PremarketError::AlreadyInitialized("trading"))
        ));
        assert!(matches!(
            p.initialize_vault(&DEPLOYER, ADMIN, EMERGENCY),
            Err(PremarketError::AlreadyInitialized("vault"))
        ));
    }

    #[test]
    fn invalid_settings_rejected() {
        let (mut p, _) = protocol();
        p.initialize_vault(&DEPLOYER, ADMIN, EMERGENCY).unwrap();
        let mut settings = ProtocolSettings::default();
        settings.economic.seller_reward_bps = 1_001;
        assert!(matches!(
            p.initialize_trading(&DEPLOYER, ADMIN, &settings),
            Err(PremarketError::InvalidRewardParameters { .. })
        ));
        assert!(p.config().is_err());
    }

    #[test]
    fn admin_operations_check_admin() {
        let (mut p, clock) = protocol();
        p.initialize_vault(&DEPLOYER, ADMIN, EMERGENCY).unwrap();
        p.initialize_trading(&DEPLOYER, ADMIN, &ProtocolSettings::default())
            .unwrap();

        assert!(matches!(
            p.create_token_market(&EMERGENCY, "PRE", "Pre", 3_600),
            Err(PremarketError::InvalidAdmin(_))
        ));
        let id = p.create_token_market(&ADMIN, "PRE", "Pre", 3_600).unwrap();
        assert_eq!(p.market(&id).unwrap().created_at, 1_000);

        clock.advance(50);
        assert!(matches!(
            p.map_token(&EMERGENCY, &id, Address([7u8; 32])),
            Err(PremarketError::InvalidAdmin(_))
        ));
        p.map_token(&ADMIN, &id, Address([7u8; 32])).unwrap();
        assert_eq!(p.market(&id).unwrap().mapping_time, Some(1_050));

        assert!(matches!(
            p.manage_relayers(&EMERGENCY, Address([3u8; 32]), true),
            Err(PremarketError::InvalidAdmin(_))
        ));
        assert!(matches!(
            p.pause_trading(&EMERGENCY),
            Err(PremarketError::InvalidAdmin(_))
        ));
    }

    #[test]
    fn relayer_management_bumps_version() {
        let (mut p, _) = protocol();
        p.initialize_vault(&DEPLOYER, ADMIN, EMERGENCY).unwrap();
        p.initialize_trading(&DEPLOYER, ADMIN, &ProtocolSettings::default())
            .unwrap();
        let relayer = Address([3u8; 32]);
        p.manage_relayers(&ADMIN, relayer, true).unwrap();
        assert!(p.config().unwrap().is_relayer(&relayer));
        assert!(matches!(
            p.manage_relayers(&ADMIN, relayer, true),
            Err(PremarketError::RelayerAlreadyRegistered(_))
        ));
        p.manage_relayers(&ADMIN, relayer, false).unwrap();
        assert!(matches!(
            p.manage_relayers(&ADMIN, relayer, false),
            Err(PremarketError::RelayerNotFound(_))
        ));
        assert_eq!(p.config().unwrap().version, 2);
    }

    #[test]
    fn pause_round_trip_emits_events() {
        let (mut p, _) = protocol();
        p.initialize_vault(&DEPLOYER, ADMIN, EMERGENCY).unwrap();
        p.initialize_trading(&DEPLOYER, ADMIN, &ProtocolSettings::default())
            .unwrap();
        p.pause_trading(&ADMIN).unwrap();
        assert!(matches!(p.pause_trading(&ADMIN), Err(PremarketError::TradingPaused)));
        p.unpause_trading(&ADMIN).unwrap();
        assert!(matches!(
            p.unpause_trading(&ADMIN),
            Err(PremarketError::TradingNotPaused)
        ));

        assert!(matches!(p.pause_vault(&ADMIN), Err(PremarketError::InvalidEmergencyAdmin(_))));
        p.pause_vault(&EMERGENCY).unwrap();
        p.unpause_vault(&EMERGENCY).unwrap();

        let kinds: Vec<_> = p.events().all().iter().map(ProtocolEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "vault_initialized",
                "trading_initialized",
                "trading_paused",
                "trading_unpaused",
                "vault_paused",
                "vault_unpaused",
            ]
        );
    }

    #[test]
    fn operations_before_trading_init() {
        let (mut p, _) = protocol();
        assert!(matches!(
            p.create_token_market(&ADMIN, "PRE", "Pre", 3_600),
            Err(PremarketError::NotInitialized("trading"))
        ));
        assert!(matches!(
            p.settle_trade(&ADMIN, &TradeId([0u8; 32])),
            Err(PremarketError::NotInitialized("trading"))
        ));
    }

    #[test]
    fn state_addresses_are_distinct() {
        let addrs = [
            trading_program_address(),
            vault_config_address(),
            trade_config_address(),
        ];
        assert_ne!(addrs[0], addrs[1]);
        assert_ne!(addrs[1], addrs[2]);
        assert_ne!(addrs[0], addrs[2]);
    }
}
