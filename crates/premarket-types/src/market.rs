//! Token markets for not-yet-issued tokens.

use serde::{Deserialize, Serialize};

use crate::{Address, TargetTokenId};

/// Catalog entry for a tradeable pre-market token.
///
/// Created unmapped; transitions to mapped exactly once, when an admin
/// supplies the real token. Settlement is blocked until then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMarket {
    pub token_id: TargetTokenId,
    pub symbol: String,
    pub name: String,
    /// Real token mint, `None` until mapped.
    pub real_mint: Option<Address>,
    /// When the mapping happened, unix seconds.
    pub mapping_time: Option<i64>,
    /// Seller's delivery window after a match, in seconds.
    pub settle_time_limit: u32,
    pub created_at: i64,
}

impl TokenMarket {
    #[must_use]
    pub fn new(
        token_id: TargetTokenId,
        symbol: String,
        name: String,
        settle_time_limit: u32,
        created_at: i64,
    ) -> Self {
        Self {
            token_id,
            symbol,
            name,
            real_mint: None,
            mapping_time: None,
            settle_time_limit,
            created_at,
        }
    }

    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.real_mint.is_some()
    }

    /// Last instant (inclusive) at which a trade matched at `match_time` may
    /// still be settled.
    #[must_use]
    pub fn grace_period_end(&self, match_time: i64) -> i64 {
        match_time.saturating_add(i64::from(self.settle_time_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_market_is_unmapped() {
        let market = TokenMarket::new(
            TargetTokenId([1u8; 32]),
            "PRE".into(),
            "Pre Token".into(),
            3_600,
            0,
        );
        assert!(!market.is_mapped());
        assert_eq!(market.mapping_time, None);
    }

    #[test]
    fn grace_period_end_adds_limit() {
        let market = TokenMarket::new(TargetTokenId([1u8; 32]), "PRE".into(), "P".into(), 86_400, 0);
        assert_eq!(market.grace_period_end(1_000), 87_400);
        assert_eq!(market.grace_period_end(i64::MAX), i64::MAX);
    }
}
