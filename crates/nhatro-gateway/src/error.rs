//! # Gateway Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Gateway Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transient     │  │     Permanent           │ │
//! │  │                 │  │  (retryable)    │  │                         │ │
//! │  │  InvalidConfig  │  │  Unavailable    │  │  InvalidRecipient       │ │
//! │  │                 │  │  Timeout        │  │  InvalidUpload          │ │
//! │  │                 │  │  DeliveryFailed │  │  NotFound               │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Terminal: Cancelled, RetriesExhausted                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid gateway configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // Transient Errors
    // =========================================================================
    /// The collaborator could not be reached.
    #[error("{service} unavailable: {reason}")]
    Unavailable { service: String, reason: String },

    #[error("{service} did not answer within {millis} ms")]
    Timeout { service: String, millis: u64 },

    /// Reached the collaborator but it refused the message.
    #[error("Delivery to {recipient} failed: {reason}")]
    DeliveryFailed { recipient: String, reason: String },

    // =========================================================================
    // Permanent Errors
    // =========================================================================
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Stored object not found: {0}")]
    NotFound(String),

    // =========================================================================
    // Terminal
    // =========================================================================
    #[error("Operation cancelled")]
    Cancelled,

    #[error("{operation} gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },
}

impl GatewayError {
    pub fn unavailable(service: impl Into<String>, reason: impl Into<String>) -> Self {
        GatewayError::Unavailable {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the same call may succeed when tried again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Unavailable { .. }
                | GatewayError::Timeout { .. }
                | GatewayError::DeliveryFailed { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, GatewayError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(GatewayError::unavailable("zalo", "connection reset").is_retryable());
        assert!(GatewayError::Timeout {
            service: "zalo".into(),
            millis: 5_000
        }
        .is_retryable());

        assert!(!GatewayError::InvalidRecipient("".into()).is_retryable());
        assert!(!GatewayError::Cancelled.is_retryable());
        assert!(GatewayError::Cancelled.is_cancelled());
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::RetriesExhausted {
            operation: "zalo.send".into(),
            attempts: 3,
            last_error: "timeout".into(),
        };
        assert_eq!(err.to_string(), "zalo.send gave up after 3 attempts: timeout");
    }
}
