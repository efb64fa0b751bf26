//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `tracker.toml` and deserializes into strongly-typed structs.
//! Secrets (the index API key) are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`.
//!
//! Every section has defaults matching the production deployment, so a
//! missing file or a partial file still yields a complete configuration.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::types::{Tier, TierTable, TrackerError};

/// Largest scale `rust_decimal` can represent.
const MAX_DECIMALS: u32 = 28;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default = "default_tiers")]
    pub tiers: Vec<Tier>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            token: TokenConfig::default(),
            indexer: IndexerConfig::default(),
            tiers: default_tiers(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrackerConfig {
    pub name: String,
    /// Sleep between the end of one cycle and the start of the next.
    pub interval_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            name: "TIERDRAW-001".to_string(),
            interval_secs: 600,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TokenConfig {
    /// Mint address of the tracked token.
    pub mint: String,
    /// Decimal places used to normalize raw integer amounts.
    pub decimals: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            mint: "6rQt2W1kPAZGhuSMJmPnRgJndLb1HfK6E4cHiQTxoxzq".to_string(),
            decimals: 6,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndexerConfig {
    /// JSON-RPC endpoint of the account index.
    pub endpoint: String,
    /// Name of the env var holding the API key.
    pub api_key_env: String,
    pub page_size: u32,
    /// JSON-RPC request id sent with every page request.
    pub request_id: String,
    /// Per-request timeout. Absent means the HTTP client default (none).
    pub timeout_secs: Option<u64>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://mainnet.helius-rpc.com/".to_string(),
            api_key_env: "HELIUS_API_KEY".to_string(),
            page_size: 1000,
            request_id: "tierdraw".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub holders_file: String,
    pub tier_summary_file: String,
    pub winners_file: String,
    pub last_run_file: String,
    /// Run summary persistence is off unless a file name is given.
    pub run_summary_file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            holders_file: "output.json".to_string(),
            tier_summary_file: "tier_summary.json".to_string(),
            winners_file: "winners.json".to_string(),
            last_run_file: "last_run.json".to_string(),
            run_summary_file: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    /// Daily files are named `{file_prefix}_{YYYY-MM-DD}.log`.
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./logs"),
            file_prefix: "tracker".to_string(),
        }
    }
}

/// The production tier table.
fn default_tiers() -> Vec<Tier> {
    let tier = |id: u32, min: Decimal, max: Option<Decimal>, winners: usize| Tier {
        id,
        name: format!("Tier {id}"),
        min,
        max,
        winners,
    };
    vec![
        tier(1, dec!(10000), Some(dec!(99999)), 5),
        tier(2, dec!(100000), Some(dec!(499999)), 4),
        tier(3, dec!(500000), Some(dec!(999999)), 3),
        tier(4, dec!(1000000), Some(dec!(4999999)), 2),
        tier(5, dec!(5000000), None, 1),
    ]
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Check the configuration and build the validated tier table.
    pub fn validate(&self) -> Result<TierTable, TrackerError> {
        if self.tracker.interval_secs == 0 {
            return Err(TrackerError::Config("tracker.interval_secs must be > 0".into()));
        }
        if self.indexer.page_size == 0 {
            return Err(TrackerError::Config("indexer.page_size must be > 0".into()));
        }
        if self.token.decimals > MAX_DECIMALS {
            return Err(TrackerError::Config(format!(
                "token.decimals must be <= {MAX_DECIMALS}, got {}",
                self.token.decimals
            )));
        }
        if self.token.mint.trim().is_empty() {
            return Err(TrackerError::Config("token.mint is required".into()));
        }
        TierTable::new(self.tiers.clone())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
