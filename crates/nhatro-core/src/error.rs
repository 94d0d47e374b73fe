//! # Error Types
//!
//! Domain-specific error types for nhatro-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  nhatro-core errors (this file)                                        │
//! │  ├── CoreError        - Billing rule and lifecycle violations          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  nhatro-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  nhatro-gateway errors (separate crate)                                │
//! │  └── GatewayError     - Messaging / storage delivery failures          │
//! │                                                                         │
//! │  Manager API errors (in app)                                           │
//! │  └── ApiError         - What the dashboard sees (serialized)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Dashboard toast        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is recoverable: the action that raised it is aborted
/// before any state is mutated and the operator may retry.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Room does not exist.
    #[error("Room not found: {0}")]
    RoomNotFound(i64),

    /// Invoice does not exist.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Customer request does not exist.
    #[error("Request not found: {0}")]
    RequestNotFound(String),

    /// Room has no tenant but the operation needs one.
    ///
    /// ## When This Occurs
    /// - Checking out an empty room
    /// - Previewing an invoice for an empty room
    /// - Uploading a tenant document to an empty room
    #[error("Room {room_id} has no tenant")]
    RoomNotOccupied { room_id: i64 },

    /// Room already has a tenant.
    #[error("Room {room_id} is already occupied")]
    RoomOccupied { room_id: i64 },

    /// A room's stored state breaks the status/tenant invariant.
    #[error("Room {room_id} is inconsistent: {reason}")]
    RoomInconsistent { room_id: i64, reason: String },

    /// No draft exists for the room in the current session.
    #[error("No draft invoice for room {room_id}")]
    DraftNotFound { room_id: i64 },

    /// The draft has been sent and can no longer change.
    ///
    /// ## When This Occurs
    /// - Editing a meter value on a sent row
    /// - Publishing the same row twice
    #[error("Draft invoice for room {room_id} has already been sent")]
    DraftLocked { room_id: i64 },

    /// Publishing requires a `ready` draft.
    #[error("Draft invoice for room {room_id} is {status}, not ready")]
    DraftNotReady { room_id: i64, status: String },

    /// No draft session has been initialized.
    #[error("Draft invoices have not been initialized")]
    DraftsNotInitialized,

    /// Publish-all was requested with an empty ready set.
    #[error("No draft invoices are ready to send")]
    NothingToPublish,

    /// The room's tenant changed (or moved out) after the draft was built.
    ///
    /// ## User Workflow
    /// ```text
    /// Initialize drafts (tenant A in P.101)
    ///      │
    ///      ▼
    /// Tenant A checks out / tenant B checks in
    ///      │
    ///      ▼
    /// Publish P.101 → TenantChanged { room_id: 101 }
    ///      │
    ///      ▼
    /// Operator re-initializes the session
    /// ```
    #[error("Tenant of room {room_id} changed since the draft was created")]
    TenantChanged { room_id: i64 },

    /// Invoice is already paid.
    #[error("Invoice {0} is already paid")]
    InvoiceAlreadyPaid(String),

    /// Checkout refused while invoices are unpaid.
    #[error("Room {room_id} has {count} unpaid invoice(s)")]
    OutstandingInvoices { room_id: i64, count: usize },

    /// Request lifecycle transition is not allowed.
    #[error("Request {request_id} is {from}, cannot {action}")]
    InvalidRequestTransition {
        request_id: String,
        from: String,
        action: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before business logic runs; nothing has been mutated.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Amount or reading must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value exceeds an upper bound.
    #[error("{field} is too large: {actual} > {max}")]
    TooLarge { field: String, max: i64, actual: i64 },

    /// Invalid format (e.g., month string, phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Meter history would lose continuity.
    #[error("meter reading for {month} is out of order: {reason}")]
    MeterOutOfOrder { month: String, reason: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn negative(field: impl Into<String>) -> Self {
        ValidationError::Negative {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::DraftNotReady {
            room_id: 7,
            status: "pending".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Draft invoice for room 7 is pending, not ready"
        );

        let err = CoreError::OutstandingInvoices {
            room_id: 3,
            count: 2,
        };
        assert_eq!(err.to_string(), "Room 3 has 2 unpaid invoice(s)");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("tenant name").to_string(),
            "tenant name is required"
        );
        assert_eq!(
            ValidationError::negative("deposit").to_string(),
            "deposit must not be negative"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("phone").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
