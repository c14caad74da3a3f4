//! Market registry: the catalog of not-yet-real tokens.
//!
//! A market is created unmapped and mapped to its real token exactly once.
//! Symbols are unique, and a real token can back at most one market.

use std::collections::HashMap;

use premarket_types::constants::{MAX_NAME_LENGTH, MAX_SYMBOL_LENGTH};
use premarket_types::{
    Address, PremarketError, Result, TargetTokenId, TechnicalConfig, TokenMarket,
};
use tracing::info;

#[derive(Debug, Default)]
pub struct MarketRegistry {
    markets: HashMap<TargetTokenId, TokenMarket>,
    by_symbol: HashMap<String, TargetTokenId>,
    by_real_mint: HashMap<Address, TargetTokenId>,
    next_sequence: u64,
}

impl MarketRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new unmapped market and allocate its target-token id.
    pub fn create_market(
        &mut self,
        symbol: &str,
        name: &str,
        settle_time_limit: u32,
        technical: &TechnicalConfig,
        now: i64,
    ) -> Result<TargetTokenId> {
        validate_symbol(symbol)?;
        validate_name(name)?;
        if !technical.allows(settle_time_limit) {
            return Err(PremarketError::InvalidSettleTime {
                value: settle_time_limit,
                min: technical.min_settle_time,
                max: technical.max_settle_time,
            });
        }
        if self.by_symbol.contains_key(symbol) {
            return Err(PremarketError::DuplicateSymbol(symbol.to_string()));
        }

        let token_id = TargetTokenId::derive(self.next_sequence, symbol);
        self.next_sequence += 1;

        let market = TokenMarket::new(
            token_id,
            symbol.to_string(),
            name.to_string(),
            settle_time_limit,
            now,
        );
        self.by_symbol.insert(market.symbol.clone(), token_id);
        self.markets.insert(token_id, market);

        info!(token_id = %token_id, symbol, settle_time_limit, "Token market created");
        Ok(token_id)
    }

    /// Bind a market to its real token. Irreversible.
    pub fn map_token(
        &mut self,
        token_id: &TargetTokenId,
        real_mint: Address,
        now: i64,
    ) -> Result<()> {
        if real_mint.is_zero() {
            return Err(PremarketError::InvalidMarketField {
                reason: "real token mint must not be zero".into(),
            });
        }
        let market = self
            .markets
            .get_mut(token_id)
            .ok_or(PremarketError::TokenNotExists(*token_id))?;
        if market.is_mapped() {
            return Err(PremarketError::TokenAlreadyMapped(*token_id));
        }
        if self.by_real_mint.contains_key(&real_mint) {
            return Err(PremarketError::RealTokenInUse(real_mint));
        }

        market.real_mint = Some(real_mint);
        market.mapping_time = Some(now);
        self.by_real_mint.insert(real_mint, *token_id);

        info!(token_id = %token_id, real_mint = %real_mint, "Token mapped");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, token_id: &TargetTokenId) -> Option<&TokenMarket> {
        self.markets.get(token_id)
    }

    /// Like [`Self::get`], but a missing market is an error.
    pub fn require(&self, token_id: &TargetTokenId) -> Result<&TokenMarket> {
        self.get(token_id)
            .ok_or(PremarketError::TokenNotExists(*token_id))
    }

    #[must_use]
    pub fn by_symbol(&self, symbol: &str) -> Option<&TokenMarket> {
        self.by_symbol
            .get(symbol)
            .and_then(|id| self.markets.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

fn validate_symbol(symbol: &str) -> Result<()> {
    if symbol.trim().is_empty() {
        return Err(PremarketError::InvalidMarketField {
            reason: "symbol must not be blank".into(),
        });
    }
    let len = symbol.chars().count();
    if len > MAX_SYMBOL_LENGTH {
        return Err(PremarketError::SymbolTooLong {
            len,
            max: MAX_SYMBOL_LENGTH,
        });
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PremarketError::InvalidMarketField {
            reason: "name must not be blank".into(),
        });
    }
    let len = name.chars().count();
    if len > MAX_NAME_LENGTH {
        return Err(PremarketError::NameTooLong {
            len,
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(())
}
