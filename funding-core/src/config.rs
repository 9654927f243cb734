//! Configuration for the funding ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Bound on waiting to enter a campaign's serialized scope (ms);
    /// elapsing maps to a retryable Transient error
    pub op_timeout_ms: u64,

    /// Concurrent reconciliation operations admitted before shedding load
    pub max_in_flight: usize,

    /// Deadline sweeper period (seconds)
    pub sweep_interval_secs: u64,

    /// What happens when a pledge would push a campaign past its goal
    pub goal_cap_policy: GoalCapPolicy,

    /// RocksDB configuration
    pub rocksdb: RocksDbConfig,

    /// Provider webhook secrets
    pub providers: ProviderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/funding"),
            service_name: "funding-ledger".to_string(),
            op_timeout_ms: 5_000,
            max_in_flight: 256,
            sweep_interval_secs: 60,
            goal_cap_policy: GoalCapPolicy::AllowOverfunding,
            rocksdb: RocksDbConfig::default(),
            providers: ProviderConfig::default(),
        }
    }
}

/// Goal-cap policy applied at pledge intake
///
/// The reconciliation engine always applies a valid settlement event, even
/// past the goal; this knob only gates new pledges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCapPolicy {
    /// Accept over-goal pledges, logging a warning
    AllowOverfunding,
    /// Reject pledges that would push the raised amount past the goal
    RejectOverGoal,
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 4,
            enable_statistics: false,
        }
    }
}

/// Webhook secrets for the local provider connectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Card-checkout webhook secret
    pub card_webhook_secret: String,

    /// Wallet-network webhook secret
    pub wallet_webhook_secret: String,

    /// Crypto confirmation feed secret
    pub crypto_webhook_secret: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            card_webhook_secret: "card-secret-dev".to_string(),
            wallet_webhook_secret: "wallet-secret-dev".to_string(),
            crypto_webhook_secret: "crypto-secret-dev".to_string(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("FUNDING_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(interval) = std::env::var("FUNDING_SWEEP_INTERVAL_SECS") {
            config.sweep_interval_secs = interval
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad sweep interval: {}", e)))?;
        }

        if let Ok(timeout) = std::env::var("FUNDING_OP_TIMEOUT_MS") {
            config.op_timeout_ms = timeout
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad op timeout: {}", e)))?;
        }

        if let Ok(secret) = std::env::var("FUNDING_CARD_WEBHOOK_SECRET") {
            config.providers.card_webhook_secret = secret;
        }
        if let Ok(secret) = std::env::var("FUNDING_WALLET_WEBHOOK_SECRET") {
            config.providers.wallet_webhook_secret = secret;
        }
        if let Ok(secret) = std::env::var("FUNDING_CRYPTO_WEBHOOK_SECRET") {
            config.providers.crypto_webhook_secret = secret;
        }

        Ok(config)
    }
}
