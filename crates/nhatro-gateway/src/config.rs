//! # Gateway Configuration
//!
//! Serde sections embedded in the manager's `nhatro.toml`.
//!
//! ```toml
//! [gateway]
//! min_latency_ms = 100
//! max_latency_ms = 400
//! failure_rate = 0.05
//! timeout_ms = 5000
//!
//! [gateway.retry]
//! max_attempts = 3
//! initial_backoff_ms = 200
//! max_backoff_ms = 2000
//! multiplier = 2.0
//!
//! [bank]
//! bank_id = "970436"
//! account_number = "0123456789"
//! account_name = "NHA TRO NGOC HAU"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{GatewayError, GatewayResult};

// =============================================================================
// Retry Policy
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Jitter applied by the backoff schedule (0.0 = none).
    #[serde(default)]
    pub randomization_factor: f64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    200
}
fn default_max_backoff() -> u64 {
    2_000
}
fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            multiplier: default_multiplier(),
            randomization_factor: 0.0,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

// =============================================================================
// Gateway Settings
// =============================================================================

/// Latency and failure injection for the simulated collaborators, plus the
/// per-call timeout and retry schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_min_latency")]
    pub min_latency_ms: u64,

    #[serde(default = "default_max_latency")]
    pub max_latency_ms: u64,

    /// Probability in `[0, 1]` that a simulated call fails transiently.
    #[serde(default)]
    pub failure_rate: f64,

    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_min_latency() -> u64 {
    100
}
fn default_max_latency() -> u64 {
    400
}
fn default_timeout() -> u64 {
    5_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            min_latency_ms: default_min_latency(),
            max_latency_ms: default_max_latency(),
            failure_rate: 0.0,
            timeout_ms: default_timeout(),
            retry: RetryPolicy::default(),
        }
    }
}

impl GatewayConfig {
    /// No latency, no failures. Used by tests and the demo.
    pub fn instant() -> Self {
        GatewayConfig {
            min_latency_ms: 0,
            max_latency_ms: 0,
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> GatewayResult<()> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(GatewayError::InvalidConfig(format!(
                "failure_rate must be between 0 and 1, got {}",
                self.failure_rate
            )));
        }
        if self.min_latency_ms > self.max_latency_ms {
            return Err(GatewayError::InvalidConfig(
                "min_latency_ms must not exceed max_latency_ms".into(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(GatewayError::InvalidConfig(
                "timeout_ms must be greater than 0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(GatewayError::InvalidConfig(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.retry.multiplier < 1.0 {
            return Err(GatewayError::InvalidConfig(
                "retry.multiplier must be at least 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.randomization_factor) {
            return Err(GatewayError::InvalidConfig(
                "retry.randomization_factor must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Bank Account
// =============================================================================

/// Receiving account printed on payment QR codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// VietQR bank BIN or short code (e.g. `970436`, `vcb`).
    pub bank_id: String,
    pub account_number: String,
    pub account_name: String,
}

impl Default for BankAccount {
    fn default() -> Self {
        BankAccount {
            bank_id: "970436".to_string(),
            account_number: "0123456789".to_string(),
            account_name: "NHA TRO NGOC HAU".to_string(),
        }
    }
}

impl BankAccount {
    pub fn validate(&self) -> GatewayResult<()> {
        if self.bank_id.trim().is_empty() {
            return Err(GatewayError::InvalidConfig("bank.bank_id is required".into()));
        }
        if self.account_number.is_empty() || !self.account_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(GatewayError::InvalidConfig(format!(
                "bank.account_number must be digits, got '{}'",
                self.account_number
            )));
        }
        Ok(())
    }
}
