//! Tracing subscriber setup.
//!
//! The filter defaults to `info` and is overridden by `RUST_LOG`.

use std::str::FromStr;

use premarket_types::PremarketError;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = PremarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(PremarketError::Configuration(format!(
                "unknown log format '{other}'"
            ))),
        }
    }
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = match format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
    }
    .is_ok();

    if installed {
        tracing::info!(
            version = premarket_types::constants::VERSION,
            ?format,
            "Tracing initialized"
        );
    }
    installed
}
