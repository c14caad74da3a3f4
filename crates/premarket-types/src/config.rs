//! Configuration types for the trading protocol.
//!
//! [`ProtocolSettings`] is what operators load from JSON at startup.
//! [`TradeConfig`] is the live, versioned record the protocol reads at the
//! start of every operation; every successful update bumps its version.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    MAX_COLLATERAL_RATIO, MAX_ORDER_AMOUNT_CEILING, MAX_PENALTY_BPS, MAX_RELAYERS,
    MAX_REWARD_BPS, MAX_SETTLE_TIME, MIN_SETTLE_TIME,
};
use crate::{Address, PremarketError, Result};

// ---------------------------------------------------------------------------
// EconomicConfig
// ---------------------------------------------------------------------------

/// Collateral, reward, penalty, and size parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicConfig {
    /// Buyer collateral as a percentage of trade value (100 = 100%).
    pub buyer_collateral_ratio: u16,
    /// Seller collateral as a percentage of trade value (100 = 100%).
    pub seller_collateral_ratio: u16,
    /// Reward paid to a seller who delivers, in basis points of trade value.
    pub seller_reward_bps: u16,
    /// Penalty on a seller who misses the grace period, in basis points.
    pub late_penalty_bps: u16,
    /// Smallest fill a match may execute.
    pub minimum_fill_amount: u64,
    /// Largest amount a single order may carry.
    pub maximum_order_amount: u64,
}

impl Default for EconomicConfig {
    fn default() -> Self {
        Self {
            buyer_collateral_ratio: 100,
            seller_collateral_ratio: 100,
            seller_reward_bps: 0,
            late_penalty_bps: 10_000,
            minimum_fill_amount: 1_000,
            maximum_order_amount: 1_000_000_000_000,
        }
    }
}

impl EconomicConfig {
    pub fn validate(&self) -> Result<()> {
        for ratio in [self.buyer_collateral_ratio, self.seller_collateral_ratio] {
            if ratio == 0 || ratio > MAX_COLLATERAL_RATIO {
                return Err(PremarketError::InvalidCollateralRatio {
                    ratio,
                    max: MAX_COLLATERAL_RATIO,
                });
            }
        }
        if self.seller_reward_bps > MAX_REWARD_BPS {
            return Err(PremarketError::InvalidRewardParameters {
                reason: format!(
                    "seller reward {} bps exceeds {MAX_REWARD_BPS}",
                    self.seller_reward_bps
                ),
            });
        }
        if self.late_penalty_bps > MAX_PENALTY_BPS {
            return Err(PremarketError::InvalidRewardParameters {
                reason: format!(
                    "late penalty {} bps exceeds {MAX_PENALTY_BPS}",
                    self.late_penalty_bps
                ),
            });
        }
        if self.minimum_fill_amount == 0 {
            return Err(PremarketError::InvalidAmountLimits {
                reason: "minimum fill amount must be positive".into(),
            });
        }
        if self.maximum_order_amount <= self.minimum_fill_amount {
            return Err(PremarketError::InvalidAmountLimits {
                reason: format!(
                    "maximum order amount {} must exceed minimum fill {}",
                    self.maximum_order_amount, self.minimum_fill_amount
                ),
            });
        }
        if self.maximum_order_amount > MAX_ORDER_AMOUNT_CEILING {
            return Err(PremarketError::InvalidAmountLimits {
                reason: format!(
                    "maximum order amount {} exceeds ceiling {MAX_ORDER_AMOUNT_CEILING}",
                    self.maximum_order_amount
                ),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TechnicalConfig
// ---------------------------------------------------------------------------

/// Bounds on the grace period a market may be created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalConfig {
    pub min_settle_time: u32,
    pub max_settle_time: u32,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            min_settle_time: MIN_SETTLE_TIME,
            max_settle_time: MAX_SETTLE_TIME,
        }
    }
}

impl TechnicalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_settle_time < MIN_SETTLE_TIME
            || self.max_settle_time > MAX_SETTLE_TIME
            || self.max_settle_time < self.min_settle_time
        {
            return Err(PremarketError::InvalidTimeRange {
                min: self.min_settle_time,
                max: self.max_settle_time,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn allows(&self, settle_time_limit: u32) -> bool {
        (self.min_settle_time..=self.max_settle_time).contains(&settle_time_limit)
    }
}

// ---------------------------------------------------------------------------
// AuthorizationMode
// ---------------------------------------------------------------------------

/// How a matched pair is admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationMode {
    /// The submitter must be a whitelisted relayer.
    #[default]
    RelayerAuthorized,
    /// Both traders must have signed their orders with Ed25519.
    SignatureVerified,
}

impl std::fmt::Display for AuthorizationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelayerAuthorized => write!(f, "RELAYER_AUTHORIZED"),
            Self::SignatureVerified => write!(f, "SIGNATURE_VERIFIED"),
        }
    }
}

// ---------------------------------------------------------------------------
// ProtocolSettings
// ---------------------------------------------------------------------------

/// Operator-supplied settings for `initialize_trading`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolSettings {
    pub economic: EconomicConfig,
    pub technical: TechnicalConfig,
    pub authorization: AuthorizationMode,
    /// Owner of the collateral account seller rewards are paid from.
    /// Defaults to the trading admin.
    pub treasury: Option<Address>,
}

impl ProtocolSettings {
    pub fn validate(&self) -> Result<()> {
        self.economic.validate()?;
        self.technical.validate()
    }

    /// Parse and validate settings from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| PremarketError::Configuration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate settings from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

// ---------------------------------------------------------------------------
// TradeConfig
// ---------------------------------------------------------------------------

/// Live trading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeConfig {
    pub admin: Address,
    /// Identity the trading logic presents to the vault.
    pub trading_program: Address,
    pub treasury: Address,
    pub relayers: Vec<Address>,
    pub economic: EconomicConfig,
    pub technical: TechnicalConfig,
    pub authorization: AuthorizationMode,
    pub paused: bool,
    /// Bumped on every successful mutation.
    pub version: u64,
}

impl TradeConfig {
    #[must_use]
    pub fn new(admin: Address, trading_program: Address, settings: &ProtocolSettings) -> Self {
        Self {
            admin,
            trading_program,
            treasury: settings.treasury.unwrap_or(admin),
            relayers: Vec::new(),
            economic: settings.economic,
            technical: settings.technical,
            authorization: settings.authorization,
            paused: false,
            version: 0,
        }
    }

    pub fn ensure_admin(&self, caller: &Address) -> Result<()> {
        if *caller == self.admin {
            Ok(())
        } else {
            Err(PremarketError::InvalidAdmin(*caller))
        }
    }

    pub fn ensure_active(&self) -> Result<()> {
        if self.paused {
            Err(PremarketError::TradingPaused)
        } else {
            Ok(())
        }
    }

    #[must_use]
    pub fn is_relayer(&self, who: &Address) -> bool {
        self.relayers.contains(who)
    }

    pub fn add_relayer(&mut self, relayer: Address) -> Result<()> {
        if self.relayers.contains(&relayer) {
            return Err(PremarketError::RelayerAlreadyRegistered(relayer));
        }
        if self.relayers.len() >= MAX_RELAYERS {
            return Err(PremarketError::TooManyRelayers { max: MAX_RELAYERS });
        }
        self.relayers.push(relayer);
        self.version += 1;
        Ok(())
    }

    pub fn remove_relayer(&mut self, relayer: &Address) -> Result<()> {
        let pos = self
            .relayers
            .iter()
            .position(|r| r == relayer)
            .ok_or(PremarketError::RelayerNotFound(*relayer))?;
        self.relayers.remove(pos);
        self.version += 1;
        Ok(())
    }

    pub fn update_economic(&mut self, economic: EconomicConfig) -> Result<()> {
        economic.validate()?;
        self.economic = economic;
        self.version += 1;
        Ok(())
    }

    pub fn update_technical(&mut self, technical: TechnicalConfig) -> Result<()> {
        technical.validate()?;
        self.technical = technical;
        self.version += 1;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.paused {
            return Err(PremarketError::TradingPaused);
        }
        self.paused = true;
        self.version += 1;
        Ok(())
    }

    pub fn unpause(&mut self) -> Result<()> {
        if !self.paused {
            return Err(PremarketError::TradingNotPaused);
        }
        self.paused = false;
        self.version += 1;
        Ok(())
    }
}
