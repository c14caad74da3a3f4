//! Error types for the pre-market protocol.
//!
//! All errors use the `PM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order validation errors
//! - 2xx: Ledger / balance errors
//! - 3xx: Authorization errors
//! - 4xx: State conflict errors
//! - 5xx: Arithmetic errors
//! - 6xx: Market registry errors
//! - 7xx: Configuration errors
//! - 9xx: General / internal errors
//!
//! Every error aborts its operation with zero side effects. Nothing is retried
//! internally; [`PremarketError::is_retryable`] tells callers which failures
//! may succeed after re-reading state.

use thiserror::Error;

use crate::{Address, OrderHash, TargetTokenId, TradeId};

/// Coarse error category, used by callers to decide whether to resubmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed, expired, or incompatible input.
    Validation,
    /// Wrong signer, unknown relayer, or unprivileged caller.
    Authorization,
    /// The target state forbids the operation (already settled, not mapped, ...).
    StateConflict,
    /// Checked arithmetic overflowed.
    Arithmetic,
    /// Invariant breach, serialization, or I/O.
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::StateConflict => write!(f, "STATE_CONFLICT"),
            Self::Arithmetic => write!(f, "ARITHMETIC"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Central error enum for all protocol operations.
#[derive(Debug, Error)]
pub enum PremarketError {
    // =================================================================
    // Order Validation Errors (1xx)
    // =================================================================
    /// The pair is not one buy order and one sell order.
    #[error("PM_ERR_100: Orders must be one buy and one sell")]
    InvalidOrderType,

    /// Buy and sell prices are not identical.
    #[error("PM_ERR_101: Price mismatch: buy {buy_price}, sell {sell_price}")]
    PriceMismatch { buy_price: u64, sell_price: u64 },

    /// Collateral token or target token differs between the orders.
    #[error("PM_ERR_102: Token mismatch: {reason}")]
    TokenMismatch { reason: String },

    /// Buyer and seller are the same trader.
    #[error("PM_ERR_103: Self-trade prevented: buyer and seller are the same trader")]
    SelfTrade,

    /// The order's deadline is not in the future.
    #[error("PM_ERR_104: Order expired: deadline {deadline}, now {now}")]
    OrderExpired { deadline: i64, now: i64 },

    /// The order has no unfilled amount left.
    #[error("PM_ERR_105: Order already filled: {0}")]
    OrderAlreadyFilled(OrderHash),

    /// The computed fill is smaller than the configured minimum.
    #[error("PM_ERR_106: Fill amount {fill} below minimum {minimum}")]
    BelowMinimumFill { fill: u64, minimum: u64 },

    /// The order amount exceeds the configured maximum.
    #[error("PM_ERR_107: Order amount {amount} exceeds maximum {maximum}")]
    ExceedOrderAmount { amount: u64, maximum: u64 },

    /// A zero amount was supplied where a positive one is required.
    #[error("PM_ERR_108: Zero amount not allowed")]
    ZeroAmount,

    /// Price below the protocol minimum.
    #[error("PM_ERR_109: Price {price} below minimum {minimum}")]
    PriceTooLow { price: u64, minimum: u64 },

    /// Price above the protocol maximum.
    #[error("PM_ERR_110: Price {price} above maximum {maximum}")]
    PriceTooHigh { price: u64, maximum: u64 },

    /// The order was cancelled by its trader.
    #[error("PM_ERR_111: Order cancelled: {0}")]
    OrderCancelled(OrderHash),

    // =================================================================
    // Ledger / Balance Errors (2xx)
    // =================================================================
    /// Not enough available balance.
    #[error("PM_ERR_200: Insufficient available balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    /// Not enough locked balance.
    #[error("PM_ERR_201: Insufficient locked balance: need {needed}, have {locked}")]
    InsufficientLocked { needed: u64, locked: u64 },

    /// Not enough tokens in an external (non-custody) account.
    #[error("PM_ERR_202: Insufficient external token balance: need {needed}, have {available}")]
    InsufficientExternalBalance { needed: u64, available: u64 },

    /// Supply conservation invariant violated. Critical safety alert.
    #[error("PM_ERR_203: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Authorization Errors (3xx)
    // =================================================================
    /// Caller is not the configured admin.
    #[error("PM_ERR_300: Invalid admin: {0}")]
    InvalidAdmin(Address),

    /// Caller is not the configured emergency admin.
    #[error("PM_ERR_301: Invalid emergency admin: {0}")]
    InvalidEmergencyAdmin(Address),

    /// Caller may not invoke privileged ledger operations.
    #[error("PM_ERR_302: Unauthorized privileged caller: {0}")]
    UnauthorizedCaller(Address),

    /// Submitter is not a whitelisted relayer.
    #[error("PM_ERR_303: Unauthorized relayer: {0}")]
    UnauthorizedRelayer(Address),

    /// An order signature is missing or does not verify.
    #[error("PM_ERR_304: Invalid order signature: {reason}")]
    InvalidSignature { reason: String },

    /// Only the trade's seller may settle it.
    #[error("PM_ERR_305: Only the seller can settle trade {0}")]
    OnlySellerCanSettle(TradeId),

    /// Only the trade's buyer may cancel it.
    #[error("PM_ERR_306: Only the buyer can cancel trade {0}")]
    OnlyBuyerCanCancel(TradeId),

    /// Only the order's trader may cancel it.
    #[error("PM_ERR_307: Invalid order owner: {0}")]
    InvalidOrderOwner(Address),

    // =================================================================
    // State Conflict Errors (4xx)
    // =================================================================
    /// The trade is already terminal (settled or cancelled).
    #[error("PM_ERR_400: Trade already settled: {0}")]
    TradeAlreadySettled(TradeId),

    /// No trade with this id exists.
    #[error("PM_ERR_401: Trade not found: {0}")]
    TradeNotFound(TradeId),

    /// A trade with this id already exists.
    #[error("PM_ERR_402: Duplicate trade: {0}")]
    DuplicateTrade(TradeId),

    /// The market already has a real token.
    #[error("PM_ERR_403: Token already mapped: {0}")]
    TokenAlreadyMapped(TargetTokenId),

    /// The market has no real token yet.
    #[error("PM_ERR_404: Token not mapped: {0}")]
    TokenNotMapped(TargetTokenId),

    /// The real token is already mapped to another market.
    #[error("PM_ERR_405: Real token {0} already mapped to another market")]
    RealTokenInUse(Address),

    /// The settlement window has closed.
    #[error("PM_ERR_406: Grace period expired: ended at {deadline}, now {now}")]
    GracePeriodExpired { deadline: i64, now: i64 },

    /// The settlement window is still open.
    #[error("PM_ERR_407: Grace period still active until {deadline}, now {now}")]
    GracePeriodActive { deadline: i64, now: i64 },

    /// The vault is paused.
    #[error("PM_ERR_408: Vault is paused")]
    VaultPaused,

    /// The vault is not paused.
    #[error("PM_ERR_409: Vault is not paused")]
    VaultNotPaused,

    /// Trading is paused.
    #[error("PM_ERR_410: Trading is paused")]
    TradingPaused,

    /// Trading is not paused.
    #[error("PM_ERR_411: Trading is not paused")]
    TradingNotPaused,

    /// A one-time initialization was attempted twice.
    #[error("PM_ERR_412: {0} already initialized")]
    AlreadyInitialized(&'static str),

    /// An operation needs a component that has not been initialized.
    #[error("PM_ERR_413: {0} not initialized")]
    NotInitialized(&'static str),

    /// Program already on the authorized-trader whitelist.
    #[error("PM_ERR_414: Trader program already authorized: {0}")]
    TraderAlreadyAuthorized(Address),

    /// Authorized-trader whitelist is full.
    #[error("PM_ERR_415: Too many authorized trader programs (max {max})")]
    TooManyAuthorizedTraders { max: usize },

    /// Program not on the authorized-trader whitelist.
    #[error("PM_ERR_416: Trader program not found: {0}")]
    TraderNotFound(Address),

    /// Relayer already whitelisted.
    #[error("PM_ERR_417: Relayer already registered: {0}")]
    RelayerAlreadyRegistered(Address),

    /// Relayer whitelist is full.
    #[error("PM_ERR_418: Too many relayers (max {max})")]
    TooManyRelayers { max: usize },

    /// Relayer not on the whitelist.
    #[error("PM_ERR_419: Relayer not found: {0}")]
    RelayerNotFound(Address),

    // =================================================================
    // Arithmetic Errors (5xx)
    // =================================================================
    /// A checked add, subtract, multiply or narrowing overflowed.
    #[error("PM_ERR_500: Math overflow")]
    MathOverflow,

    // =================================================================
    // Market Registry Errors (6xx)
    // =================================================================
    /// No market with this target-token id.
    #[error("PM_ERR_600: Token market not found: {0}")]
    TokenNotExists(TargetTokenId),

    /// Another market already uses this symbol.
    #[error("PM_ERR_601: Duplicate symbol: {0}")]
    DuplicateSymbol(String),

    /// Symbol is longer than allowed.
    #[error("PM_ERR_602: Symbol too long: {len} chars (max {max})")]
    SymbolTooLong { len: usize, max: usize },

    /// Name is longer than allowed.
    #[error("PM_ERR_603: Name too long: {len} chars (max {max})")]
    NameTooLong { len: usize, max: usize },

    /// Symbol or name is blank.
    #[error("PM_ERR_604: Invalid market field: {reason}")]
    InvalidMarketField { reason: String },

    /// Grace period outside the allowed range.
    #[error("PM_ERR_605: Invalid settle time {value}s (allowed {min}..={max})")]
    InvalidSettleTime { value: u32, min: u32, max: u32 },

    // =================================================================
    // Configuration Errors (7xx)
    // =================================================================
    /// A collateral ratio is out of range.
    #[error("PM_ERR_700: Invalid collateral ratio {ratio}% (max {max}%)")]
    InvalidCollateralRatio { ratio: u16, max: u16 },

    /// Reward or penalty rate is out of range.
    #[error("PM_ERR_701: Invalid reward parameters: {reason}")]
    InvalidRewardParameters { reason: String },

    /// Min/max settle time bounds are inconsistent.
    #[error("PM_ERR_702: Invalid time range: min {min}s, max {max}s")]
    InvalidTimeRange { min: u32, max: u32 },

    /// Fill/order amount limits are inconsistent.
    #[error("PM_ERR_703: Invalid amount limits: {reason}")]
    InvalidAmountLimits { reason: String },

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("PM_ERR_704: Configuration error: {0}")]
    Configuration(String),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("PM_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("PM_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("PM_ERR_902: I/O error: {0}")]
    Io(String),
}

impl PremarketError {
    /// The error category this failure belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidOrderType
            | Self::PriceMismatch { .. }
            | Self::TokenMismatch { .. }
            | Self::SelfTrade
            | Self::OrderExpired { .. }
            | Self::OrderAlreadyFilled(_)
            | Self::BelowMinimumFill { .. }
            | Self::ExceedOrderAmount { .. }
            | Self::ZeroAmount
            | Self::PriceTooLow { .. }
            | Self::PriceTooHigh { .. }
            | Self::OrderCancelled(_)
            | Self::InsufficientBalance { .. }
            | Self::InsufficientLocked { .. }
            | Self::InsufficientExternalBalance { .. }
            | Self::TokenNotExists(_)
            | Self::DuplicateSymbol(_)
            | Self::SymbolTooLong { .. }
            | Self::NameTooLong { .. }
            | Self::InvalidMarketField { .. }
            | Self::InvalidSettleTime { .. }
            | Self::InvalidCollateralRatio { .. }
            | Self::InvalidRewardParameters { .. }
            | Self::InvalidTimeRange { .. }
            | Self::InvalidAmountLimits { .. }
            | Self::Configuration(_) => ErrorCategory::Validation,

            Self::InvalidAdmin(_)
            | Self::InvalidEmergencyAdmin(_)
            | Self::UnauthorizedCaller(_)
            | Self::UnauthorizedRelayer(_)
            | Self::InvalidSignature { .. }
            | Self::OnlySellerCanSettle(_)
            | Self::OnlyBuyerCanCancel(_)
            | Self::InvalidOrderOwner(_) => ErrorCategory::Authorization,

            Self::TradeAlreadySettled(_)
            | Self::TradeNotFound(_)
            | Self::DuplicateTrade(_)
            | Self::TokenAlreadyMapped(_)
            | Self::TokenNotMapped(_)
            | Self::RealTokenInUse(_)
            | Self::GracePeriodExpired { .. }
            | Self::GracePeriodActive { .. }
            | Self::VaultPaused
            | Self::VaultNotPaused
            | Self::TradingPaused
            | Self::TradingNotPaused
            | Self::AlreadyInitialized(_)
            | Self::NotInitialized(_)
            | Self::TraderAlreadyAuthorized(_)
            | Self::TooManyAuthorizedTraders { .. }
            | Self::TraderNotFound(_)
            | Self::RelayerAlreadyRegistered(_)
            | Self::TooManyRelayers { .. }
            | Self::RelayerNotFound(_) => ErrorCategory::StateConflict,

            Self::MathOverflow => ErrorCategory::Arithmetic,

            Self::SupplyInvariantViolation { .. }
            | Self::Internal(_)
            | Self::Serialization(_)
            | Self::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Whether resubmitting after re-reading state may succeed.
    ///
    /// Balances and fill records move under concurrent submissions; everything
    /// else is a property of the request itself.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MathOverflow
                | Self::InsufficientBalance { .. }
                | Self::InsufficientLocked { .. }
                | Self::InsufficientExternalBalance { .. }
                | Self::OrderAlreadyFilled(_)
                | Self::DuplicateTrade(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PremarketError>;

impl From<std::io::Error> for PremarketError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PremarketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
