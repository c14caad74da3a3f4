//! Trade storage and the exactly-once terminal guard.
//!
//! Each trade id is inserted once. [`TradeBook::mark_terminal`] flips the
//! trade's `settled` flag and fails on every later call, so settlement and
//! cancellation of the same trade are mutually exclusive.

use std::collections::HashMap;

use premarket_types::{PremarketError, Result, TradeId, TradeRecord};

#[derive(Debug, Default)]
pub struct TradeBook {
    trades: HashMap<TradeId, TradeRecord>,
    /// Insertion order, oldest first.
    order: Vec<TradeId>,
}

impl TradeBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, trade: TradeRecord) -> Result<()> {
        if self.trades.contains_key(&trade.trade_id) {
            return Err(PremarketError::DuplicateTrade(trade.trade_id));
        }
        self.order.push(trade.trade_id);
        self.trades.insert(trade.trade_id, trade);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, trade_id: &TradeId) -> Option<&TradeRecord> {
        self.trades.get(trade_id)
    }

    pub fn get_mut(&mut self, trade_id: &TradeId) -> Option<&mut TradeRecord> {
        self.trades.get_mut(trade_id)
    }

    /// Like [`Self::get`], but a missing trade is an error.
    pub fn require(&self, trade_id: &TradeId) -> Result<&TradeRecord> {
        self.get(trade_id)
            .ok_or(PremarketError::TradeNotFound(*trade_id))
    }

    /// Non-terminal trades in match order.
    pub fn open_trades(&self) -> impl Iterator<Item = &TradeRecord> {
        self.order
            .iter()
            .filter_map(|id| self.trades.get(id))
            .filter(|t| t.is_open())
    }

    /// Flip the trade to terminal.
    pub fn mark_terminal(&mut self, trade_id: &TradeId) -> Result<()> {
        let trade = self
            .trades
            .get_mut(trade_id)
            .ok_or(PremarketError::TradeNotFound(*trade_id))?;
        if trade.settled {
            return Err(PremarketError::TradeAlreadySettled(*trade_id));
        }
        trade.settled = true;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use premarket_types::{Address, OrderHash};

    fn trade(seq: u64) -> TradeRecord {
        let mut t = TradeRecord::dummy(Address([1u8; 32]), Address([2u8; 32]));
        t.trade_id = TradeId::derive(&OrderHash([1u8; 32]), &OrderHash([2u8; 32]), seq);
        t
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut book = TradeBook::new();
        book.insert(trade(0)).unwrap();
        assert!(matches!(
            book.insert(trade(0)),
            Err(PremarketError::DuplicateTrade(_))
        ));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn terminal_exactly_once() {
        let mut book = TradeBook::new();
        let t = trade(0);
        let id = t.trade_id;
        book.insert(t).unwrap();
        book.mark_terminal(&id).unwrap();
        assert!(book.get(&id).unwrap().settled);
        assert!(matches!(
            book.mark_terminal(&id),
            Err(PremarketError::TradeAlreadySettled(_))
        ));
    }

    #[test]
    fn open_trades_in_order() {
        let mut book = TradeBook::new();
        for seq in 0..3 {
            book.insert(trade(seq)).unwrap();
        }
        let second = trade(1).trade_id;
        book.mark_terminal(&second).unwrap();
        let open: Vec<_> = book.open_trades().map(|t| t.trade_id).collect();
        assert_eq!(open, vec![trade(0).trade_id, trade(2).trade_id]);
    }

    #[test]
    fn unknown_trade() {
        let mut book = TradeBook::new();
        let id = trade(9).trade_id;
        assert!(matches!(book.require(&id), Err(PremarketError::TradeNotFound(_))));
        assert!(matches!(
            book.mark_terminal(&id),
            Err(PremarketError::TradeNotFound(_))
        ));
    }
}
