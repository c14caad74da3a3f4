//! System-wide constants for the pre-market protocol.

/// Fixed-point scale for prices (6 decimal places).
pub const PRICE_SCALE: u64 = 1_000_000;

/// Lowest accepted order price (0.001 in price units).
pub const MIN_PRICE: u64 = 1_000;

/// Highest accepted order price (1e18 micro-units).
pub const MAX_PRICE: u64 = 1_000_000_000_000_000_000;

/// Denominator for collateral ratios expressed as a percentage.
pub const PERCENT_DENOMINATOR: u64 = 100;

/// Denominator for basis-point rates.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Upper bound on either side's collateral ratio (200%).
pub const MAX_COLLATERAL_RATIO: u16 = 200;

/// Upper bound on the seller reward rate (10%).
pub const MAX_REWARD_BPS: u16 = 1_000;

/// Upper bound on the late penalty rate (100%).
pub const MAX_PENALTY_BPS: u16 = 10_000;

/// Shortest grace period a market may be created with (1 hour).
pub const MIN_SETTLE_TIME: u32 = 3_600;

/// Longest grace period a market may be created with (30 days).
pub const MAX_SETTLE_TIME: u32 = 2_592_000;

/// Maximum market symbol length in characters.
pub const MAX_SYMBOL_LENGTH: usize = 10;

/// Maximum market name length in characters.
pub const MAX_NAME_LENGTH: usize = 50;

/// Maximum number of whitelisted relayers.
pub const MAX_RELAYERS: usize = 10;

/// Maximum number of programs allowed to call privileged ledger operations.
pub const MAX_AUTHORIZED_TRADERS: usize = 10;

/// Ceiling for `EconomicConfig::maximum_order_amount` (1e15).
pub const MAX_ORDER_AMOUNT_CEILING: u64 = 1_000_000_000_000_000;

/// Domain separator prefixed to every order's signing message.
pub const ORDER_DOMAIN_SEPARATOR: &[u8; 14] = b"PreMarketOrder";

/// Length of an encoded order signing message.
pub const ORDER_MESSAGE_LEN: usize = 14 + 32 * 3 + 8 + 8 + 1 + 8 + 8;

/// Seed for per-user collateral accounts: `["user_balance", user, mint]`.
pub const USER_BALANCE_SEED: &[u8] = b"user_balance";

/// Seed for per-mint custody accounts: `["vault_authority", mint]`.
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";

/// Seed for the global vault configuration.
pub const VAULT_CONFIG_SEED: &[u8] = b"vault_config";

/// Seed for the global trading configuration.
pub const TRADE_CONFIG_SEED: &[u8] = b"trade_config";

/// Seed for the trading program's identity on the ledger.
pub const TRADING_PROGRAM_SEED: &[u8] = b"premarket_trade";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
