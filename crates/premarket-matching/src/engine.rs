//! The matching engine.
//!
//! Admits a pre-selected (buy, sell) pair, computes the fill and the
//! collateral each side must post, locks both collateral amounts in one
//! ledger batch, and emits a [`TradeRecord`]. The engine does not choose
//! which orders to pair; relayers do that off-ledger.

use premarket_types::{
    math, Address, OrderHash, OrderSide, PreOrder, PremarketError, Result, SettlementTerms,
    Signature, TradeConfig, TradeId, TradeRecord,
};
use premarket_vault::{CollateralLedger, LedgerBatch};
use tracing::{debug, info};

use crate::authorization::{Authorizer, MatchAuthorization};
use crate::fills::FillTracker;
use crate::registry::MarketRegistry;
use crate::validator::OrderValidator;

/// A matched pair submitted for execution.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub buy: PreOrder,
    pub sell: PreOrder,
    /// Explicit fill; `None` fills as much as both orders allow.
    pub fill_amount: Option<u64>,
    pub authorization: MatchAuthorization,
}

/// Shared state a match reads and writes.
pub struct MatchContext<'a> {
    pub config: &'a TradeConfig,
    pub registry: &'a MarketRegistry,
    pub ledger: &'a mut CollateralLedger,
    pub now: i64,
}

/// Fill and collateral computed for an admitted pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillQuote {
    pub fill: u64,
    pub trade_value: u64,
    pub buyer_collateral: u64,
    pub seller_collateral: u64,
}

/// Executes matched pairs and owns the per-order fill records.
#[derive(Debug, Default)]
pub struct MatchingEngine {
    fills: FillTracker,
    trade_sequence: u64,
}

impl MatchingEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fills(&self) -> &FillTracker {
        &self.fills
    }

    /// Number of trades created so far.
    #[must_use]
    pub fn trade_count(&self) -> u64 {
        self.trade_sequence
    }

    /// Run a match.
    ///
    /// Checks, in order, each failing fast:
    /// 0. trading not paused, submitter authorized
    /// 1. one buy, one sell
    /// 2. identical prices
    /// 3. same collateral token and target token
    /// 4. different traders
    /// 5. per-order validation (deadline, amount, price bounds), then order
    ///    signatures when required
    /// 6. the market exists
    /// 7. neither order is cancelled, both have unfilled amount left
    ///
    /// Then the fill is computed and checked against the minimum, collateral
    /// is locked on both sides in one batch, and fills are recorded. Any
    /// failure leaves every balance and fill record untouched.
    pub fn match_orders(&mut self, request: &MatchRequest, ctx: MatchContext<'_>) -> Result<TradeRecord> {
        let MatchContext {
            config,
            registry,
            ledger,
            now,
        } = ctx;
        let buy = &request.buy;
        let sell = &request.sell;

        config.ensure_active()?;
        Authorizer::check_submitter(config, &request.authorization)?;

        // 1. Sides
        if buy.side != OrderSide::Buy || sell.side != OrderSide::Sell {
            return Err(PremarketError::InvalidOrderType);
        }
        // 2. Price agreement
        if buy.price != sell.price {
            return Err(PremarketError::PriceMismatch {
                buy_price: buy.price,
                sell_price: sell.price,
            });
        }
        // 3. Same tokens
        if buy.collateral_token != sell.collateral_token {
            return Err(PremarketError::TokenMismatch {
                reason: "collateral tokens differ".into(),
            });
        }
        if buy.target_token_id != sell.target_token_id {
            return Err(PremarketError::TokenMismatch {
                reason: "target tokens differ".into(),
            });
        }
        // 4. No self-trade
        if buy.trader == sell.trader {
            return Err(PremarketError::SelfTrade);
        }
        // 5. Per-order checks
        OrderValidator::validate(buy, now, &config.economic)?;
        OrderValidator::validate(sell, now, &config.economic)?;
        Authorizer::check_orders(config, &request.authorization, buy, sell)?;
        // 6. Market
        registry.require(&buy.target_token_id)?;

        // 7. Remaining amounts
        let buy_hash = buy.hash();
        let sell_hash = sell.hash();
        self.ensure_fillable(buy, &buy_hash)?;
        self.ensure_fillable(sell, &sell_hash)?;

        let quote = self.quote(buy, sell, request.fill_amount, config)?;
        let buy_filled = self.fills.check_fill(&buy_hash, quote.fill, buy.amount)?;
        let sell_filled = self.fills.check_fill(&sell_hash, quote.fill, sell.amount)?;

        let batch = LedgerBatch::new()
            .lock(buy.trader, buy.collateral_token, quote.buyer_collateral)
            .lock(sell.trader, sell.collateral_token, quote.seller_collateral);
        ledger.execute_local(&config.trading_program, &batch)?;

        self.fills.record_fill(buy_hash, quote.fill, buy.amount)?;
        self.fills.record_fill(sell_hash, quote.fill, sell.amount)?;

        let trade_id = TradeId::derive(&buy_hash, &sell_hash, self.trade_sequence);
        self.trade_sequence += 1;

        let trade = TradeRecord {
            trade_id,
            buyer: buy.trader,
            seller: sell.trader,
            target_token_id: buy.target_token_id,
            collateral_token: buy.collateral_token,
            filled_amount: quote.fill,
            price: buy.price,
            buyer_collateral: quote.buyer_collateral,
            seller_collateral: quote.seller_collateral,
            match_time: now,
            settled: false,
            buy_order_hash: buy_hash,
            sell_order_hash: sell_hash,
            terms: SettlementTerms {
                seller_reward_bps: config.economic.seller_reward_bps,
                late_penalty_bps: config.economic.late_penalty_bps,
                config_version: config.version,
            },
        };

        debug!(
            buy_order = %buy_hash,
            sell_order = %sell_hash,
            buy_filled,
            sell_filled,
            "Order fills recorded"
        );
        info!(
            trade_id = %trade.trade_id,
            buyer = %trade.buyer.short(),
            seller = %trade.seller.short(),
            fill = quote.fill,
            price = trade.price,
            buyer_collateral = quote.buyer_collateral,
            seller_collateral = quote.seller_collateral,
            "Orders matched"
        );
        Ok(trade)
    }

    /// Fill and collateral for a pair, given the current fill records.
    pub fn quote(
        &self,
        buy: &PreOrder,
        sell: &PreOrder,
        requested: Option<u64>,
        config: &TradeConfig,
    ) -> Result<FillQuote> {
        let max_fill = self.fills.remaining(buy).min(self.fills.remaining(sell));
        let fill = requested.map_or(max_fill, |r| r.min(max_fill));
        if fill < config.economic.minimum_fill_amount {
            return Err(PremarketError::BelowMinimumFill {
                fill,
                minimum: config.economic.minimum_fill_amount,
            });
        }

        let trade_value = math::trade_value(fill, buy.price)?;
        Ok(FillQuote {
            fill,
            trade_value,
            buyer_collateral: math::apply_percent(
                trade_value,
                config.economic.buyer_collateral_ratio,
            )?,
            seller_collateral: math::apply_percent(
                trade_value,
                config.economic.seller_collateral_ratio,
            )?,
        })
    }

    /// Withdraw an order so it can never be filled again.
    ///
    /// Collateral is only locked at match time, so nothing moves here. Fills
    /// already executed are unaffected.
    pub fn cancel_order(
        &mut self,
        caller: &Address,
        order: &PreOrder,
        signature: Option<&Signature>,
        config: &TradeConfig,
        now: i64,
    ) -> Result<OrderHash> {
        config.ensure_active()?;
        if *caller != order.trader {
            return Err(PremarketError::InvalidOrderOwner(*caller));
        }
        Authorizer::check_order(config, order, signature)?;
        if order.is_expired_at(now) {
            return Err(PremarketError::OrderExpired {
                deadline: order.deadline,
                now,
            });
        }

        let hash = order.hash();
        if self.fills.is_cancelled(&hash) {
            return Err(PremarketError::OrderCancelled(hash));
        }
        if self.fills.remaining(order) == 0 {
            return Err(PremarketError::OrderAlreadyFilled(hash));
        }
        self.fills.cancel(hash)?;

        info!(order_hash = %hash, trader = %caller.short(), "Order cancelled");
        Ok(hash)
    }

    fn ensure_fillable(&self, order: &PreOrder, hash: &OrderHash) -> Result<()> {
        if self.fills.is_cancelled(hash) {
            return Err(PremarketError::OrderCancelled(*hash));
        }
        if self.fills.remaining(order) == 0 {
            return Err(PremarketError::OrderAlreadyFilled(*hash));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use premarket_types::{
        AuthorizationMode, ProtocolSettings, TargetTokenId, TechnicalConfig,
    };
    use premarket_vault::TokenBank;

    const ADMIN: Address = Address([1u8; 32]);
    const PROGRAM: Address = Address([2u8; 32]);
    const RELAYER: Address = Address([3u8; 32]);
    const BUYER: Address = Address([10u8; 32]);
    const SELLER: Address = Address([11u8; 32]);
    const USDC: Address = Address([20u8; 32]);

    struct Fixture {
        engine: MatchingEngine,
        config: TradeConfig,
        registry: MarketRegistry,
        ledger: CollateralLedger,
        token: TargetTokenId,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_mode(AuthorizationMode::RelayerAuthorized)
        }

        fn with_mode(mode: AuthorizationMode) -> Self {
            let settings = ProtocolSettings {
                authorization: mode,
                ..ProtocolSettings::default()
            };
            let mut config = TradeConfig::new(ADMIN, PROGRAM, &settings);
            config.add_relayer(RELAYER).unwrap();

            let mut registry = MarketRegistry::new();
            let token = registry
                .create_market("PRE", "Pre Token", 86_400, &TechnicalConfig::default(), 0)
                .unwrap();

            let mut ledger = CollateralLedger::new();
            ledger.initialize(ADMIN, ADMIN).unwrap();
            ledger.add_authorized_trader(&ADMIN, PROGRAM).unwrap();
            let mut bank = TokenBank::new();
            for user in [BUYER, SELLER] {
                bank.mint_to(user, USDC, 100_000).unwrap();
                ledger.deposit(user, USDC, 10_000, &mut bank).unwrap();
            }

            Self {
                engine: MatchingEngine::new(),
                config,
                registry,
                ledger,
                token,
            }
        }

        fn order(&self, trader: Address, side: OrderSide, amount: u64) -> PreOrder {
            PreOrder::dummy(trader, side, USDC, self.token, amount, 1_500_000)
        }

        fn run(&mut self, request: &MatchRequest) -> Result<TradeRecord> {
            self.engine.match_orders(
                request,
                MatchContext {
                    config: &self.config,
                    registry: &self.registry,
                    ledger: &mut self.ledger,
                    now: 100,
                },
            )
        }

        fn request(&self, buy: PreOrder, sell: PreOrder, fill: Option<u64>) -> MatchRequest {
            MatchRequest {
                buy,
                sell,
                fill_amount: fill,
                authorization: MatchAuthorization::relayer(RELAYER),
            }
        }
    }

    #[test]
    fn full_match_locks_collateral() {
        let mut f = Fixture::new();
        let req = f.request(
            f.order(BUYER, OrderSide::Buy, 1_000),
            f.order(SELLER, OrderSide::Sell, 1_000),
            None,
        );
        let trade = f.run(&req).unwrap();
        assert_eq!(trade.filled_amount, 1_000);
        assert_eq!(trade.trade_value().unwrap(), 1_500);
        assert_eq!(trade.buyer_collateral, 1_500);
        assert_eq!(trade.seller_collateral, 1_500);
        assert_eq!(trade.match_time, 100);
        assert!(!trade.settled);
        assert_eq!(f.ledger.account(&BUYER, &USDC).locked, 1_500);
        assert_eq!(f.ledger.account(&SELLER, &USDC).locked, 1_500);
        assert_eq!(f.engine.fills().filled(&req.buy.hash()), 1_000);
        assert_eq!(f.engine.trade_count(), 1);
    }

    #[test]
    fn partial_fills_until_exhausted() {
        let mut f = Fixture::new();
        let buy = f.order(BUYER, OrderSide::Buy, 3_000);
        let sell = f.order(SELLER, OrderSide::Sell, 2_200);
        let first = f.run(&f.request(buy.clone(), sell.clone(), Some(1_200))).unwrap();
        assert_eq!(first.filled_amount, 1_200);
        let second = f.run(&f.request(buy.clone(), sell.clone(), None)).unwrap();
        assert_eq!(second.filled_amount, 1_000);
        assert_ne!(first.trade_id, second.trade_id);
        let err = f.run(&f.request(buy.clone(), sell.clone(), None)).unwrap_err();
        assert!(matches!(err, PremarketError::OrderAlreadyFilled(h) if h == sell.hash()));
        assert_eq!(f.engine.fills().remaining(&buy), 800);
        assert_eq!(f.ledger.account(&BUYER, &USDC).locked, 3_300);
    }

    #[test]
    fn requested_fill_is_clipped() {
        let mut f = Fixture::new();
        let req = f.request(
            f.order(BUYER, OrderSide::Buy, 1_000),
            f.order(SELLER, OrderSide::Sell, 5_000),
            Some(9_999),
        );
        assert_eq!(f.run(&req).unwrap().filled_amount, 1_000);
    }

    #[test]
    fn validation_order() {
        let mut f = Fixture::new();
        let buy = f.order(BUYER, OrderSide::Buy, 1_000);
        let sell = f.order(SELLER, OrderSide::Sell, 1_000);

        let mut wrong_side = sell.clone();
        wrong_side.side = OrderSide::Buy;
        assert!(matches!(
            f.run(&f.request(buy.clone(), wrong_side, None)),
            Err(PremarketError::InvalidOrderType)
        ));

        let mut cheap = sell.clone();
        cheap.price = 1_400_000;
        assert!(matches!(
            f.run(&f.request(buy.clone(), cheap, None)),
            Err(PremarketError::PriceMismatch { .. })
        ));

        let mut other_collateral = sell.clone();
        other_collateral.collateral_token = Address([21u8; 32]);
        assert!(matches!(
            f.run(&f.request(buy.clone(), other_collateral, None)),
            Err(PremarketError::TokenMismatch { .. })
        ));

        let self_sell = f.order(BUYER, OrderSide::Sell, 1_000);
        assert!(matches!(
            f.run(&f.request(buy.clone(), self_sell, None)),
            Err(PremarketError::SelfTrade)
        ));

        let mut expired = sell.clone();
        expired.deadline = 100;
        assert!(matches!(
            f.run(&f.request(buy.clone(), expired, None)),
            Err(PremarketError::OrderExpired { .. })
        ));

        let mut unknown = f.order(BUYER, OrderSide::Buy, 1_000);
        unknown.target_token_id = TargetTokenId([99u8; 32]);
        let mut unknown_sell = sell.clone();
        unknown_sell.target_token_id = unknown.target_token_id;
        assert!(matches!(
            f.run(&f.request(unknown, unknown_sell, None)),
            Err(PremarketError::TokenNotExists(_))
        ));

        // Nothing moved.
        assert_eq!(f.ledger.account(&BUYER, &USDC).locked, 0);
        assert_eq!(f.engine.trade_count(), 0);
    }

    #[test]
    fn unknown_relayer_rejected_first() {
        let mut f = Fixture::new();
        let mut req = f.request(
            f.order(BUYER, OrderSide::Buy, 1_000),
            f.order(BUYER, OrderSide::Buy, 1_000),
            None,
        );
        req.authorization = MatchAuthorization::relayer(Address([77u8; 32]));
        assert!(matches!(
            f.run(&req),
            Err(PremarketError::UnauthorizedRelayer(_))
        ));
    }

    #[test]
    fn below_minimum_fill() {
        let mut f = Fixture::new();
        let req = f.request(
            f.order(BUYER, OrderSide::Buy, 1_000),
            f.order(SELLER, OrderSide::Sell, 1_000),
            Some(999),
        );
        assert!(matches!(
            f.run(&req),
            Err(PremarketError::BelowMinimumFill {
                fill: 999,
                minimum: 1_000
            })
        ));
    }

    #[test]
    fn insufficient_collateral_aborts_both_locks() {
        let mut f = Fixture::new();
        // 10_000 units at 1.5 needs 15_000 per side; each side has 10_000.
        let req = f.request(
            f.order(BUYER, OrderSide::Buy, 10_000),
            f.order(SELLER, OrderSide::Sell, 10_000),
            None,
        );
        assert!(matches!(
            f.run(&req),
            Err(PremarketError::InsufficientBalance { .. })
        ));
        assert_eq!(f.ledger.account(&BUYER, &USDC).available, 10_000);
        assert_eq!(f.ledger.account(&SELLER, &USDC).available, 10_000);
        assert_eq!(f.engine.fills().filled(&req.buy.hash()), 0);
    }

    #[test]
    fn collateral_ratios_apply_per_side() {
        let mut f = Fixture::new();
        f.config.economic.buyer_collateral_ratio = 50;
        f.config.economic.seller_collateral_ratio = 150;
        let req = f.request(
            f.order(BUYER, OrderSide::Buy, 2_000),
            f.order(SELLER, OrderSide::Sell, 2_000),
            None,
        );
        let trade = f.run(&req).unwrap();
        assert_eq!(trade.buyer_collateral, 1_500);
        assert_eq!(trade.seller_collateral, 4_500);
    }

    #[test]
    fn terms_are_snapshotted() {
        let mut f = Fixture::new();
        let mut econ = f.config.economic;
        econ.seller_reward_bps = 300;
        f.config.update_economic(econ).unwrap();
        let req = f.request(
            f.order(BUYER, OrderSide::Buy, 1_000),
            f.order(SELLER, OrderSide::Sell, 1_000),
            None,
        );
        let trade = f.run(&req).unwrap();
        assert_eq!(trade.terms.seller_reward_bps, 300);
        assert_eq!(trade.terms.config_version, f.config.version);
    }

    #[test]
    fn vault_must_whitelist_trading_program() {
        let mut f = Fixture::new();
        f.ledger.remove_authorized_trader(&ADMIN, &PROGRAM).unwrap();
        let req = f.request(
            f.order(BUYER, OrderSide::Buy, 1_000),
            f.order(SELLER, OrderSide::Sell, 1_000),
            None,
        );
        assert!(matches!(
            f.run(&req),
            Err(PremarketError::UnauthorizedCaller(_))
        ));
        assert_eq!(f.engine.fills().filled(&req.buy.hash()), 0);
    }

    #[test]
    fn paused_trading_blocks_matches() {
        let mut f = Fixture::new();
        f.config.pause().unwrap();
        let req = f.request(
            f.order(BUYER, OrderSide::Buy, 1_000),
            f.order(SELLER, OrderSide::Sell, 1_000),
            None,
        );
        assert!(matches!(f.run(&req), Err(PremarketError::TradingPaused)));
    }

    #[test]
    fn signature_mode_match() {
        let (buy_key, buyer) = PreOrder::keypair(1);
        let (sell_key, seller) = PreOrder::keypair(2);
        let mut f = Fixture::with_mode(AuthorizationMode::SignatureVerified);
        let mut bank = TokenBank::new();
        for user in [buyer, seller] {
            bank.mint_to(user, USDC, 10_000).unwrap();
            f.ledger.deposit(user, USDC, 10_000, &mut bank).unwrap();
        }
        let buy = f.order(buyer, OrderSide::Buy, 1_000);
        let sell = f.order(seller, OrderSide::Sell, 1_000);

        let mut req = f.request(buy.clone(), sell.clone(), None);
        req.authorization = MatchAuthorization::signed(
            Address([55u8; 32]),
            buy.sign(&buy_key),
            buy.sign(&buy_key),
        );
        assert!(matches!(
            f.run(&req),
            Err(PremarketError::InvalidSignature { .. })
        ));

        req.authorization =
            MatchAuthorization::signed(Address([55u8; 32]), buy.sign(&buy_key), sell.sign(&sell_key));
        assert!(f.run(&req).is_ok());
    }

    #[test]
    fn cancelled_order_cannot_fill() {
        let mut f = Fixture::new();
        let buy = f.order(BUYER, OrderSide::Buy, 2_000);
        let sell = f.order(SELLER, OrderSide::Sell, 2_000);
        f.run(&f.request(buy.clone(), sell.clone(), Some(1_000))).unwrap();

        assert!(matches!(
            f.engine.cancel_order(&SELLER, &buy, None, &f.config, 100),
            Err(PremarketError::InvalidOrderOwner(_))
        ));
        f.engine.cancel_order(&BUYER, &buy, None, &f.config, 100).unwrap();
        assert!(matches!(
            f.engine.cancel_order(&BUYER, &buy, None, &f.config, 100),
            Err(PremarketError::OrderCancelled(_))
        ));
        assert!(matches!(
            f.run(&f.request(buy.clone(), sell.clone(), None)),
            Err(PremarketError::OrderCancelled(_))
        ));
        // Collateral from the executed fill stays locked.
        assert_eq!(f.ledger.account(&BUYER, &USDC).locked, 1_500);
    }

    #[test]
    fn cancel_filled_or_expired_order() {
        let mut f = Fixture::new();
        let buy = f.order(BUYER, OrderSide::Buy, 1_000);
        let sell = f.order(SELLER, OrderSide::Sell, 1_000);
        f.run(&f.request(buy.clone(), sell.clone(), None)).unwrap();
        assert!(matches!(
            f.engine.cancel_order(&BUYER, &buy, None, &f.config, 100),
            Err(PremarketError::OrderAlreadyFilled(_))
        ));
        let fresh = f.order(BUYER, OrderSide::Buy, 5_000);
        assert!(matches!(
            f.engine.cancel_order(&BUYER, &fresh, None, &f.config, 3_600),
            Err(PremarketError::OrderExpired { .. })
        ));
    }
}
