//! Match admission.
//!
//! A matched pair is admitted in one of two ways, selected by
//! [`AuthorizationMode`]:
//!
//! - **RelayerAuthorized**: the submitter is on the trade config's relayer
//!   whitelist. Order signatures are not checked.
//! - **SignatureVerified**: each order carries an Ed25519 signature by its
//!   trader over the order's signing message. Anyone may submit.

use premarket_types::{
    Address, AuthorizationMode, PreOrder, PremarketError, Result, Signature, TradeConfig,
};
use tracing::warn;

/// Credentials accompanying a match submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchAuthorization {
    pub submitter: Address,
    pub buy_signature: Option<Signature>,
    pub sell_signature: Option<Signature>,
}

impl MatchAuthorization {
    /// Submission by a relayer, without order signatures.
    #[must_use]
    pub fn relayer(submitter: Address) -> Self {
        Self {
            submitter,
            buy_signature: None,
            sell_signature: None,
        }
    }

    /// Submission carrying both traders' signatures.
    #[must_use]
    pub fn signed(submitter: Address, buy_signature: Signature, sell_signature: Signature) -> Self {
        Self {
            submitter,
            buy_signature: Some(buy_signature),
            sell_signature: Some(sell_signature),
        }
    }
}

pub struct Authorizer;

impl Authorizer {
    /// Check who submitted the match. Runs before any order validation.
    pub fn check_submitter(config: &TradeConfig, auth: &MatchAuthorization) -> Result<()> {
        match config.authorization {
            AuthorizationMode::RelayerAuthorized => {
                if !config.is_relayer(&auth.submitter) {
                    warn!(submitter = %auth.submitter, "Match from unknown relayer rejected");
                    return Err(PremarketError::UnauthorizedRelayer(auth.submitter));
                }
                Ok(())
            }
            AuthorizationMode::SignatureVerified => Ok(()),
        }
    }

    /// Verify both traders' signatures when the mode requires them.
    pub fn check_orders(
        config: &TradeConfig,
        auth: &MatchAuthorization,
        buy: &PreOrder,
        sell: &PreOrder,
    ) -> Result<()> {
        if config.authorization != AuthorizationMode::SignatureVerified {
            return Ok(());
        }
        verify(buy, auth.buy_signature.as_ref(), "buy")?;
        verify(sell, auth.sell_signature.as_ref(), "sell")
    }

    /// Verify a single order's signature when the mode requires it.
    pub fn check_order(
        config: &TradeConfig,
        order: &PreOrder,
        signature: Option<&Signature>,
    ) -> Result<()> {
        if config.authorization != AuthorizationMode::SignatureVerified {
            return Ok(());
        }
        verify(order, signature, "order")
    }
}

fn verify(order: &PreOrder, signature: Option<&Signature>, label: &str) -> Result<()> {
    let signature = signature.ok_or_else(|| PremarketError::InvalidSignature {
        reason: format!("missing {label} signature"),
    })?;
    order.verify_signature(signature)
}
