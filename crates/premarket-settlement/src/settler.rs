//! Settlement state machine.
//!
//! A trade is `Open` until exactly one of two things happens:
//!
//! - **settle**: the seller delivers the real token to the buyer within the
//!   market's grace period (`now <= match_time + settle_time_limit`) and
//!   receives both sides' collateral plus the reward.
//! - **cancel**: the grace period lapsed (`now > match_time +
//!   settle_time_limit`) and the buyer reclaims their collateral plus a
//!   penalty taken from the seller's collateral.
//!
//! All balance movements of one transition, including the real-token
//! delivery, run as a single ledger batch. Nothing moves unless every leg
//! succeeds.

use premarket_matching::MarketRegistry;
use premarket_types::{
    Address, BalanceSource, PremarketError, Result, TradeConfig, TradeId, TradeRecord,
};
use premarket_vault::{CollateralLedger, ExternalTokens, LedgerBatch};
use tracing::{info, warn};

use crate::payout::{CancellationAmounts, SettlementAmounts};
use crate::trade_book::TradeBook;

/// State a settlement or cancellation reads and writes.
pub struct SettlementContext<'a, B: ExternalTokens + ?Sized> {
    pub config: &'a TradeConfig,
    pub registry: &'a MarketRegistry,
    pub ledger: &'a mut CollateralLedger,
    pub bank: &'a mut B,
    pub now: i64,
}

/// Outcome of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReceipt {
    pub trade_id: TradeId,
    pub seller: Address,
    pub buyer: Address,
    pub real_mint: Address,
    /// Real tokens moved seller → buyer.
    pub delivered: u64,
    pub amounts: SettlementAmounts,
    pub settled_at: i64,
}

/// Outcome of a late-delivery cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationReceipt {
    pub trade_id: TradeId,
    pub buyer: Address,
    pub seller: Address,
    pub amounts: CancellationAmounts,
    pub cancelled_at: i64,
}

/// Drives trades from open to terminal.
#[derive(Debug, Default)]
pub struct Settler {
    book: TradeBook,
}

impl Settler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn book(&self) -> &TradeBook {
        &self.book
    }

    /// Take ownership of a freshly matched trade.
    pub fn record(&mut self, trade: TradeRecord) -> Result<()> {
        self.book.insert(trade)
    }

    /// Seller delivers the real token and collects collateral plus reward.
    ///
    /// # Errors
    /// - `TradingPaused` while trading is halted
    /// - `TradeNotFound` / `TradeAlreadySettled`
    /// - `OnlySellerCanSettle` if `caller` is not the seller
    /// - `TokenNotMapped` while the market has no real token
    /// - `GracePeriodExpired` once `now` is past the grace period
    /// - any ledger error from the payout batch, with no effect
    pub fn settle<B: ExternalTokens + ?Sized>(
        &mut self,
        trade_id: &TradeId,
        caller: &Address,
        ctx: SettlementContext<'_, B>,
    ) -> Result<SettlementReceipt> {
        let SettlementContext {
            config,
            registry,
            ledger,
            bank,
            now,
        } = ctx;
        config.ensure_active()?;

        let trade = self.open_trade(trade_id)?;
        if *caller != trade.seller {
            return Err(PremarketError::OnlySellerCanSettle(*trade_id));
        }
        let market = registry.require(&trade.target_token_id)?;
        let real_mint = market
            .real_mint
            .ok_or(PremarketError::TokenNotMapped(trade.target_token_id))?;
        let deadline = trade.grace_period_end(market.settle_time_limit);
        if now > deadline {
            warn!(trade_id = %trade_id, deadline, now, "Settlement after grace period rejected");
            return Err(PremarketError::GracePeriodExpired { deadline, now });
        }

        let amounts = SettlementAmounts::compute(trade)?;
        let mint = trade.collateral_token;
        let batch = LedgerBatch::new()
            .payout(trade.buyer, mint, BalanceSource::Locked, trade.buyer_collateral, trade.seller)
            .payout(trade.seller, mint, BalanceSource::Locked, trade.seller_collateral, trade.seller)
            .payout(config.treasury, mint, BalanceSource::Available, amounts.seller_reward, trade.seller)
            .external_transfer(real_mint, trade.seller, trade.buyer, trade.filled_amount);
        ledger.execute(&config.trading_program, &batch, bank)?;

        let receipt = SettlementReceipt {
            trade_id: *trade_id,
            seller: trade.seller,
            buyer: trade.buyer,
            real_mint,
            delivered: trade.filled_amount,
            amounts,
            settled_at: now,
        };
        self.book.mark_terminal(trade_id)?;

        info!(
            trade_id = %trade_id,
            seller = %receipt.seller.short(),
            delivered = receipt.delivered,
            collateral_released = amounts.collateral_released,
            seller_reward = amounts.seller_reward,
            "Trade settled"
        );
        Ok(receipt)
    }

    /// Buyer reclaims collateral after the seller missed the grace period.
    ///
    /// # Errors
    /// - `TradingPaused` while trading is halted
    /// - `TradeNotFound` / `TradeAlreadySettled`
    /// - `OnlyBuyerCanCancel` if `caller` is not the buyer
    /// - `GracePeriodActive` until `now` is past the grace period
    /// - any ledger error from the refund batch, with no effect
    pub fn cancel<B: ExternalTokens + ?Sized>(
        &mut self,
        trade_id: &TradeId,
        caller: &Address,
        ctx: SettlementContext<'_, B>,
    ) -> Result<CancellationReceipt> {
        let SettlementContext {
            config,
            registry,
            ledger,
            bank,
            now,
        } = ctx;
        config.ensure_active()?;

        let trade = self.open_trade(trade_id)?;
        if *caller != trade.buyer {
            return Err(PremarketError::OnlyBuyerCanCancel(*trade_id));
        }
        let market = registry.require(&trade.target_token_id)?;
        let deadline = trade.grace_period_end(market.settle_time_limit);
        if now <= deadline {
            return Err(PremarketError::GracePeriodActive { deadline, now });
        }

        let amounts = CancellationAmounts::compute(trade)?;
        let mint = trade.collateral_token;
        let batch = LedgerBatch::new()
            .payout(trade.buyer, mint, BalanceSource::Locked, trade.buyer_collateral, trade.buyer)
            .payout(trade.seller, mint, BalanceSource::Locked, amounts.penalty, trade.buyer)
            .payout(trade.seller, mint, BalanceSource::Locked, amounts.seller_refund, trade.seller);
        ledger.execute(&config.trading_program, &batch, bank)?;

        let receipt = CancellationReceipt {
            trade_id: *trade_id,
            buyer: trade.buyer,
            seller: trade.seller,
            amounts,
            cancelled_at: now,
        };
        self.book.mark_terminal(trade_id)?;

        info!(
            trade_id = %trade_id,
            buyer = %receipt.buyer.short(),
            penalty = amounts.penalty,
            buyer_refund = amounts.buyer_refund,
            seller_refund = amounts.seller_refund,
            "Trade cancelled"
        );
        Ok(receipt)
    }

    fn open_trade(&self, trade_id: &TradeId) -> Result<&TradeRecord> {
        let trade = self.book.require(trade_id)?;
        if trade.settled {
            return Err(PremarketError::TradeAlreadySettled(*trade_id));
        }
        Ok(trade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use premarket_types::{ProtocolSettings, TechnicalConfig};
    use premarket_vault::TokenBank;

    const ADMIN: Address = Address([1u8; 32]);
    const PROGRAM: Address = Address([2u8; 32]);
    const BUYER: Address = Address([10u8; 32]);
    const SELLER: Address = Address([11u8; 32]);
    const USDC: Address = Address([0xcc; 32]);
    const REAL: Address = Address([0xee; 32]);
    const LIMIT: u32 = 3_600;

    struct Fixture {
        settler: Settler,
        config: TradeConfig,
        registry: MarketRegistry,
        ledger: CollateralLedger,
        bank: TokenBank,
        trade_id: TradeId,
    }

    impl Fixture {
        /// Scenario-A trade with both collaterals locked and the market mapped.
        fn new() -> Self {
            let config = TradeConfig::new(ADMIN, PROGRAM, &ProtocolSettings::default());
            let mut registry = MarketRegistry::new();
            let token = registry
                .create_market("PRE", "Pre Token", LIMIT, &TechnicalConfig::default(), 0)
                .unwrap();
            registry.map_token(&token, REAL, 10).unwrap();

            let mut ledger = CollateralLedger::new();
            ledger.initialize(ADMIN, ADMIN).unwrap();
            ledger.add_authorized_trader(&ADMIN, PROGRAM).unwrap();
            let mut bank = TokenBank::new();
            for user in [BUYER, SELLER, ADMIN] {
                bank.mint_to(user, USDC, 5_000).unwrap();
                ledger.deposit(user, USDC, 5_000, &mut bank).unwrap();
            }
            bank.mint_to(SELLER, REAL, 1_000).unwrap();

            let mut trade = TradeRecord::dummy(BUYER, SELLER);
            trade.target_token_id = token;
            trade.collateral_token = USDC;
            ledger.lock(&PROGRAM, BUYER, USDC, trade.buyer_collateral).unwrap();
            ledger.lock(&PROGRAM, SELLER, USDC, trade.seller_collateral).unwrap();

            let trade_id = trade.trade_id;
            let mut settler = Settler::new();
            settler.record(trade).unwrap();

            Self {
                settler,
                config,
                registry,
                ledger,
                bank,
                trade_id,
            }
        }

        fn settle(&mut self, caller: Address, now: i64) -> Result<SettlementReceipt> {
            let id = self.trade_id;
            self.settler.settle(
                &id,
                &caller,
                SettlementContext {
                    config: &self.config,
                    registry: &self.registry,
                    ledger: &mut self.ledger,
                    bank: &mut self.bank,
                    now,
                },
            )
        }

        fn cancel(&mut self, caller: Address, now: i64) -> Result<CancellationReceipt> {
            let id = self.trade_id;
            self.settler.cancel(
                &id,
                &caller,
                SettlementContext {
                    config: &self.config,
                    registry: &self.registry,
                    ledger: &mut self.ledger,
                    bank: &mut self.bank,
                    now,
                },
            )
        }
    }

    #[test]
    fn settle_pays_seller_and_delivers() {
        let mut f = Fixture::new();
        let receipt = f.settle(SELLER, 100).unwrap();
        assert_eq!(receipt.amounts.total, 3_000);
        assert_eq!(receipt.delivered, 1_000);

        assert_eq!(f.bank.balance_of(&SELLER, &USDC), 3_000);
        assert_eq!(f.bank.balance_of(&BUYER, &REAL), 1_000);
        assert_eq!(f.bank.balance_of(&SELLER, &REAL), 0);
        assert_eq!(f.ledger.account(&BUYER, &USDC).locked, 0);
        assert_eq!(f.ledger.account(&SELLER, &USDC).locked, 0);
        assert!(f.settler.book().get(&f.trade_id).unwrap().settled);
        f.ledger.verify_conservation(&USDC).unwrap();
        f.ledger.verify_custody_backing(&USDC, &f.bank).unwrap();
    }

    #[test]
    fn reward_comes_from_treasury() {
        let mut f = Fixture::new();
        let id = f.trade_id;
        f.settler.book.get_mut(&id).unwrap().terms.seller_reward_bps = 1_000;
        let receipt = f.settle(SELLER, 100).unwrap();
        assert_eq!(receipt.amounts.seller_reward, 150);
        assert_eq!(f.bank.balance_of(&SELLER, &USDC), 3_150);
        assert_eq!(f.ledger.account(&ADMIN, &USDC).available, 4_850);
    }

    #[test]
    fn grace_period_boundary() {
        let mut f = Fixture::new();
        assert!(matches!(
            f.cancel(BUYER, i64::from(LIMIT)),
            Err(PremarketError::GracePeriodActive { .. })
        ));
        assert!(f.settle(SELLER, i64::from(LIMIT)).is_ok());

        let mut late = Fixture::new();
        assert!(matches!(
            late.settle(SELLER, i64::from(LIMIT) + 1),
            Err(PremarketError::GracePeriodExpired { .. })
        ));
        assert!(late.cancel(BUYER, i64::from(LIMIT) + 1).is_ok());
    }

    #[test]
    fn cancel_applies_penalty() {
        let mut f = Fixture::new();
        let receipt = f.cancel(BUYER, i64::from(LIMIT) + 1).unwrap();
        assert_eq!(receipt.amounts.penalty, 1_500);
        assert_eq!(f.bank.balance_of(&BUYER, &USDC), 3_000);
        assert_eq!(f.bank.balance_of(&SELLER, &USDC), 0);
        assert_eq!(f.ledger.account(&SELLER, &USDC).locked, 0);
        f.ledger.verify_conservation(&USDC).unwrap();
    }

    #[test]
    fn exactly_once() {
        let mut f = Fixture::new();
        f.settle(SELLER, 100).unwrap();
        assert!(matches!(
            f.settle(SELLER, 100),
            Err(PremarketError::TradeAlreadySettled(_))
        ));
        assert!(matches!(
            f.cancel(BUYER, i64::from(LIMIT) + 1),
            Err(PremarketError::TradeAlreadySettled(_))
        ));
    }

    #[test]
    fn wrong_caller() {
        let mut f = Fixture::new();
        assert!(matches!(
            f.settle(BUYER, 100),
            Err(PremarketError::OnlySellerCanSettle(_))
        ));
        assert!(matches!(
            f.cancel(SELLER, i64::from(LIMIT) + 1),
            Err(PremarketError::OnlyBuyerCanCancel(_))
        ));
    }

    #[test]
    fn unmapped_market_blocks_settlement() {
        let mut f = Fixture::new();
        let other = f
            .registry
            .create_market("UNM", "Unmapped", LIMIT, &TechnicalConfig::default(), 0)
            .unwrap();
        let id = f.trade_id;
        f.settler.book.get_mut(&id).unwrap().target_token_id = other;
        assert!(matches!(
            f.settle(SELLER, 100),
            Err(PremarketError::TokenNotMapped(_))
        ));
        // The buyer can still recover after the deadline.
        assert!(f.cancel(BUYER, i64::from(LIMIT) + 1).is_ok());
    }

    #[test]
    fn missing_real_tokens_aborts_everything() {
        let mut f = Fixture::new();
        f.bank.transfer(&REAL, &SELLER, &ADMIN, 1).unwrap();
        assert!(matches!(
            f.settle(SELLER, 100),
            Err(PremarketError::InsufficientExternalBalance { .. })
        ));
        assert_eq!(f.ledger.account(&BUYER, &USDC).locked, 1_500);
        assert_eq!(f.ledger.account(&SELLER, &USDC).locked, 1_500);
        assert_eq!(f.bank.balance_of(&SELLER, &USDC), 0);
        assert!(f.settler.book().get(&f.trade_id).unwrap().is_open());
    }

    #[test]
    fn empty_treasury_aborts_settlement() {
        let mut f = Fixture::new();
        let id = f.trade_id;
        f.settler.book.get_mut(&id).unwrap().terms.seller_reward_bps = 1_000;
        f.ledger.withdraw(ADMIN, USDC, 5_000, &mut f.bank).unwrap();
        assert!(matches!(
            f.settle(SELLER, 100),
            Err(PremarketError::InsufficientBalance { .. })
        ));
        assert_eq!(f.bank.balance_of(&BUYER, &REAL), 0);
        assert!(f.settler.book().get(&id).unwrap().is_open());
    }

    #[test]
    fn paused_trading_blocks_both_paths() {
        let mut f = Fixture::new();
        f.config.pause().unwrap();
        assert!(matches!(f.settle(SELLER, 100), Err(PremarketError::TradingPaused)));
        assert!(matches!(
            f.cancel(BUYER, i64::from(LIMIT) + 1),
            Err(PremarketError::TradingPaused)
        ));
    }
}
