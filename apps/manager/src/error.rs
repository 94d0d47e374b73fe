//! # Command Errors
//!
//! Every command returns `Result<T, ApiError>`. Lower layers keep their own
//! error enums and are folded in here:
//!
//! ```text
//!   DbError       NotFound ─────────────► NOT_FOUND
//!                 UniqueViolation ──────► VALIDATION_ERROR
//!                 Rule(CoreError) ──┐
//!                 anything else ────┼───► DATABASE_ERROR (details logged)
//!   CoreError ──────────────────────┘───► BUSINESS_LOGIC / CONFLICT / ...
//!   GatewayError  Cancelled ────────────► CANCELLED
//!                 Unavailable, .. ──────► GATEWAY_ERROR
//! ```
//!
//! The dashboard branches on `code` and shows `message` as is.

use serde::Serialize;

use nhatro_core::{CoreError, ValidationError};
use nhatro_db::DbError;
use nhatro_gateway::GatewayError;

/// API error returned from manager commands.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Invoice not found: INV-2025060001"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Database operation failed (500)
    DatabaseError,

    /// Business rule rejected the operation (422)
    BusinessLogic,

    /// State changed underneath the operation (409)
    Conflict,

    /// Zalo or image storage failed
    GatewayError,

    /// Operation was cancelled by the user
    Cancelled,

    /// Internal error (500)
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::validation(format!("{} '{}' already exists", field, value))
            }
            DbError::Rule(e) => ApiError::from(e),
            DbError::Busy => ApiError::new(ErrorCode::DatabaseError, "Database is busy, try again"),
            // Details go to the log only
            other => {
                tracing::error!(error = %other, "Database failure");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::RoomNotFound(id) => ApiError::not_found("Room", &id.to_string()),
            CoreError::InvoiceNotFound(id) => ApiError::not_found("Invoice", &id),
            CoreError::RequestNotFound(id) => ApiError::not_found("Request", &id),
            CoreError::DraftNotFound { .. } => ApiError::new(ErrorCode::NotFound, message),
            CoreError::TenantChanged { .. } | CoreError::RoomInconsistent { .. } => {
                ApiError::new(ErrorCode::Conflict, message)
            }
            CoreError::NothingToPublish | CoreError::Validation(_) => {
                ApiError::new(ErrorCode::ValidationError, message)
            }
            CoreError::RoomNotOccupied { .. }
            | CoreError::RoomOccupied { .. }
            | CoreError::DraftLocked { .. }
            | CoreError::DraftNotReady { .. }
            | CoreError::DraftsNotInitialized
            | CoreError::InvoiceAlreadyPaid(_)
            | CoreError::OutstandingInvoices { .. }
            | CoreError::InvalidRequestTransition { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, message)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Cancelled => ApiError::new(ErrorCode::Cancelled, "Operation cancelled"),
            GatewayError::InvalidUpload(_) | GatewayError::InvalidRecipient(_) => {
                ApiError::validation(err.to_string())
            }
            GatewayError::NotFound(key) => ApiError::not_found("Document", &key),
            GatewayError::InvalidConfig(_) => ApiError::internal(err.to_string()),
            other => {
                tracing::warn!(error = %other, "Gateway call failed");
                ApiError::new(ErrorCode::GatewayError, other.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
