//! Pre-market order model.
//!
//! A [`PreOrder`] is agreed off-ledger and only brought on-ledger when a
//! relayer submits a matched pair. It is immutable once hashed: the hash is
//! SHA-256 over a fixed little-endian encoding, and it keys the cumulative
//! fill record for the order.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{ORDER_DOMAIN_SEPARATOR, ORDER_MESSAGE_LEN};
use crate::{Address, OrderHash, PremarketError, Result, TargetTokenId};

/// Which side of the trade this order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Wire encoding: `1` for buy, `0` for sell.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Buy => 1,
            Self::Sell => 0,
        }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// An off-ledger order for a not-yet-issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreOrder {
    /// Trader identity. Under signature authorization this is the trader's
    /// Ed25519 public key.
    pub trader: Address,
    /// Token posted as collateral.
    pub collateral_token: Address,
    /// Market the order trades in.
    pub target_token_id: TargetTokenId,
    /// Quantity of the target token, in its native unit.
    pub amount: u64,
    /// Price per unit in micro-units (`PRICE_SCALE` = 1.0).
    pub price: u64,
    pub side: OrderSide,
    /// Replay guard chosen by the trader.
    pub nonce: u64,
    /// Absolute expiry, unix seconds.
    pub deadline: i64,
}

impl PreOrder {
    /// Canonical bytes that are hashed and signed.
    ///
    /// Format: `"PreMarketOrder" || trader || collateral_token || target_token_id
    /// || amount_le || price_le || side || nonce_le || deadline_le`.
    #[must_use]
    pub fn signing_message(&self) -> Vec<u8> {
        let mut msg = Vec::with_capacity(ORDER_MESSAGE_LEN);
        msg.extend_from_slice(ORDER_DOMAIN_SEPARATOR);
        msg.extend_from_slice(self.trader.as_bytes());
        msg.extend_from_slice(self.collateral_token.as_bytes());
        msg.extend_from_slice(self.target_token_id.as_bytes());
        msg.extend_from_slice(&self.amount.to_le_bytes());
        msg.extend_from_slice(&self.price.to_le_bytes());
        msg.push(self.side.as_byte());
        msg.extend_from_slice(&self.nonce.to_le_bytes());
        msg.extend_from_slice(&self.deadline.to_le_bytes());
        msg
    }

    /// SHA-256 of [`Self::signing_message`].
    #[must_use]
    pub fn hash(&self) -> OrderHash {
        OrderHash(Sha256::digest(self.signing_message()).into())
    }

    #[must_use]
    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }

    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.deadline <= now
    }

    /// Verify an Ed25519 signature by `trader` over the signing message.
    pub fn verify_signature(&self, signature: &Signature) -> Result<()> {
        let key = VerifyingKey::from_bytes(self.trader.as_bytes()).map_err(|_| {
            PremarketError::InvalidSignature {
                reason: format!("trader {} is not a valid ed25519 public key", self.trader),
            }
        })?;
        key.verify(&self.signing_message(), signature)
            .map_err(|_| PremarketError::InvalidSignature {
                reason: format!("signature does not match order {}", self.hash()),
            })
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl PreOrder {
    /// An order one hour from expiry at `t = 0`, trading `target` for `collateral`.
    pub fn dummy(
        trader: Address,
        side: OrderSide,
        collateral_token: Address,
        target_token_id: TargetTokenId,
        amount: u64,
        price: u64,
    ) -> Self {
        Self {
            trader,
            collateral_token,
            target_token_id,
            amount,
            price,
            side,
            nonce: 0,
            deadline: 3_600,
        }
    }

    /// Deterministic signing key for fixtures; the trader address is its public key.
    pub fn keypair(seed: u8) -> (ed25519_dalek::SigningKey, Address) {
        let key = ed25519_dalek::SigningKey::from_bytes(&[seed; 32]);
        let address = Address(key.verifying_key().to_bytes());
        (key, address)
    }

    /// Random signing key for fixtures.
    pub fn random_keypair() -> (ed25519_dalek::SigningKey, Address) {
        let key = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
        let address = Address(key.verifying_key().to_bytes());
        (key, address)
    }

    /// Sign the order with `key`.
    pub fn sign(&self, key: &ed25519_dalek::SigningKey) -> Signature {
        use ed25519_dalek::Signer;
        key.sign(&self.signing_message())
    }
}
