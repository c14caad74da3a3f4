//! Append-only log of protocol events.

use premarket_types::{ProtocolEvent, Result};
use tracing::debug;

#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<ProtocolEvent>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: ProtocolEvent) {
        debug!(kind = event.kind(), seq = self.events.len(), "Event emitted");
        self.events.push(event);
    }

    #[must_use]
    pub fn all(&self) -> &[ProtocolEvent] {
        &self.events
    }

    /// Events at or after position `from`.
    #[must_use]
    pub fn since(&self, from: usize) -> &[ProtocolEvent] {
        self.events.get(from..).unwrap_or(&[])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// One JSON object per line, for indexers.
    pub fn to_json_lines(&self) -> Result<String> {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use premarket_types::Address;

    #[test]
    fn since_and_json_lines() {
        let mut log = EventLog::new();
        log.emit(ProtocolEvent::RelayerAdded {
            relayer: Address([1u8; 32]),
        });
        log.emit(ProtocolEvent::TradingPaused {
            by: Address([2u8; 32]),
        });
        assert_eq!(log.since(1).len(), 1);
        assert!(log.since(5).is_empty());

        let lines = log.to_json_lines().unwrap();
        let parsed: Vec<ProtocolEvent> = lines
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed, log.all());
    }
}
