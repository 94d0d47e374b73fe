//! # Manager Configuration
//!
//! Layered configuration for the manager.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     NHATRO_DB_PATH=/srv/nhatro/nhatro.db                               │
//! │     NHATRO_FAILURE_RATE=0.2                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/nhatro/nhatro.toml (Linux)                               │
//! │     ~/Library/Application Support/com.nhatro.manager/nhatro.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     in-memory database seeded with mock data                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/nhatro/nhatro.db"   # omit for in-memory
//! seed_mock_data = true
//! rng_seed = 42
//!
//! [bank]
//! bank_id = "970436"
//! account_number = "0123456789"
//! account_name = "NHA TRO NGOC HAU"
//!
//! [gateway]
//! min_latency_ms = 100
//! max_latency_ms = 400
//! failure_rate = 0.0
//! timeout_ms = 5000
//!
//! [gateway.retry]
//! max_attempts = 3
//! initial_backoff_ms = 200
//!
//! [billing]
//! default_flat_water_rate = 100000
//! expiring_window_days = 30
//! history_limit = 3
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use nhatro_core::{DEFAULT_FLAT_WATER_RATE, EXPIRING_CONTRACT_WINDOW_DAYS, INVOICE_HISTORY_LIMIT};
use nhatro_gateway::{BankAccount, GatewayConfig, GatewayError};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

impl From<GatewayError> for ConfigError {
    fn from(err: GatewayError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Database Section
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. `None` keeps everything in memory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Fill an empty database with generated buildings, rooms and invoices.
    #[serde(default = "default_seed_mock_data")]
    pub seed_mock_data: bool,

    #[serde(default = "default_rng_seed")]
    pub rng_seed: u64,
}

fn default_seed_mock_data() -> bool {
    true
}

fn default_rng_seed() -> u64 {
    42
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            seed_mock_data: default_seed_mock_data(),
            rng_seed: default_rng_seed(),
        }
    }
}

// =============================================================================
// Billing Section
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSettings {
    /// đ per month for a room switched to flat water without a rate.
    #[serde(default = "default_flat_water_rate")]
    pub default_flat_water_rate: i64,

    /// Dashboard counts a contract as expiring inside this many days.
    #[serde(default = "default_expiring_window")]
    pub expiring_window_days: i64,

    /// Invoices shown in the bulk-invoice detail sheet.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Pins "today" for demos and reproducible runs.
    #[serde(default)]
    pub fixed_today: Option<NaiveDate>,
}

fn default_flat_water_rate() -> i64 {
    DEFAULT_FLAT_WATER_RATE.amount()
}

fn default_expiring_window() -> i64 {
    EXPIRING_CONTRACT_WINDOW_DAYS
}

fn default_history_limit() -> u32 {
    INVOICE_HISTORY_LIMIT as u32
}

impl Default for BillingSettings {
    fn default() -> Self {
        BillingSettings {
            default_flat_water_rate: default_flat_water_rate(),
            expiring_window_days: default_expiring_window(),
            history_limit: default_history_limit(),
            fixed_today: None,
        }
    }
}

// =============================================================================
// Manager Config
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub bank: BankAccount,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub billing: BillingSettings,
}

impl ManagerConfig {
    /// Platform config path, e.g. `~/.config/nhatro/nhatro.toml`.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "nhatro", "manager")
            .map(|dirs| dirs.config_dir().join("nhatro.toml"))
    }

    /// Defaults, then the TOML file if present, then `NHATRO_*` variables.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading manager config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load manager config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Manager config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.gateway.validate()?;
        self.bank.validate()?;

        if self.billing.default_flat_water_rate < 0 {
            return Err(ConfigError::Invalid(
                "billing.default_flat_water_rate must not be negative".into(),
            ));
        }
        if self.billing.expiring_window_days <= 0 {
            return Err(ConfigError::Invalid(
                "billing.expiring_window_days must be greater than 0".into(),
            ));
        }
        if self.billing.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "billing.history_limit must be greater than 0".into(),
            ));
        }
        if let Some(path) = &self.database.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("database.path must not be empty".into()));
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("NHATRO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = if path == ":memory:" {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }

        if let Ok(seed) = std::env::var("NHATRO_SEED") {
            if let Ok(s) = seed.parse::<u64>() {
                self.database.rng_seed = s;
            }
        }

        if let Ok(flag) = std::env::var("NHATRO_SEED_MOCK_DATA") {
            self.database.seed_mock_data = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        if let Ok(rate) = std::env::var("NHATRO_FAILURE_RATE") {
            if let Ok(r) = rate.parse::<f64>() {
                debug!(failure_rate = r, "Overriding gateway failure rate from environment");
                self.gateway.failure_rate = r;
            }
        }

        if let Ok(account) = std::env::var("NHATRO_BANK_ACCOUNT") {
            self.bank.account_number = account;
        }

        if let Ok(today) = std::env::var("NHATRO_TODAY") {
            match today.parse::<NaiveDate>() {
                Ok(date) => self.billing.fixed_today = Some(date),
                Err(e) => warn!(value = %today, error = %e, "Ignoring invalid NHATRO_TODAY"),
            }
        }
    }
}
