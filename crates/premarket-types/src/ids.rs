//! Identifiers used throughout the protocol.
//!
//! Every identity is 32 bytes. Users, token mints, relayers and programs share
//! [`Address`]; protocol-allocated ids ([`TargetTokenId`], [`TradeId`],
//! [`OrderHash`]) are SHA-256 digests over domain-separated inputs so every
//! node derives the same id from the same inputs.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 32-byte ledger identity: a user's public key, a token mint, a relayer,
/// or a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The all-zero address. Never a valid participant.
    pub const ZERO: Self = Self([0u8; 32]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Derive a deterministic sub-account address from seed strings and keys.
    ///
    /// Format: `SHA-256("premarket:derive:v1:" || (len_le32 || seed)*)`.
    /// Seeds are length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
    #[must_use]
    pub fn derive(seeds: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"premarket:derive:v1:");
        for seed in seeds {
            let len = u32::try_from(seed.len()).unwrap_or(u32::MAX);
            hasher.update(len.to_le_bytes());
            hasher.update(seed);
        }
        Self(hasher.finalize().into())
    }

    /// First four bytes in hex, for compact log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// OrderHash
// ---------------------------------------------------------------------------

/// SHA-256 digest of an order's signing message. Keys cumulative fill records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderHash(pub [u8; 32]);

impl OrderHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// TargetTokenId
// ---------------------------------------------------------------------------

/// Opaque id of a token that does not exist yet. Allocated by the market
/// registry when a market is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TargetTokenId(pub [u8; 32]);

impl TargetTokenId {
    /// Deterministic id from the registry's allocation sequence and the symbol.
    #[must_use]
    pub fn derive(sequence: u64, symbol: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"premarket:token_id:v1:");
        hasher.update(sequence.to_le_bytes());
        hasher.update(symbol.as_bytes());
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TargetTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// TradeId
// ---------------------------------------------------------------------------

/// Unique trade identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TradeId(pub [u8; 32]);

impl TradeId {
    /// Deterministic `TradeId` from both order hashes and the trade sequence.
    ///
    /// The sequence keeps repeated partial fills of the same order pair
    /// distinct.
    #[must_use]
    pub fn derive(buy: &OrderHash, sell: &OrderHash, sequence: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"premarket:trade_id:v1:");
        hasher.update(buy.0);
        hasher.update(sell.0);
        hasher.update(sequence.to_le_bytes());
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trade:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
