//! # Storage Errors
//!
//! ```text
//!   sqlx::Error ──────┐
//!   MigrateError ─────┤
//!   serde_json ───────┼──► DbError ──► ApiError (manager)
//!   CoreError ────────┘      │
//!   (billing rules)          └── Rule(..) passes the rule through untouched
//! ```
//!
//! SQLite reports constraint failures as text, so the unique-key case is
//! recognised from the message. Everything else SQLite says ends up in
//! [`DbError::Sqlite`] for logging.

use nhatro_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row for this id, or an `UPDATE` matched nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the insert. Repositories usually turn this
    /// into a rule error (room already occupied, duplicate building id).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A billing rule rejected the write.
    #[error(transparent)]
    Rule(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value no longer parses (bad enum text, broken JSON column).
    #[error("Corrupt {field}: {reason}")]
    Corrupt { field: String, reason: String },

    /// Every connection stayed busy past the acquire timeout.
    #[error("Database busy")]
    Busy,

    #[error("SQLite error: {0}")]
    Sqlite(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn corrupt(field: impl Into<String>, reason: impl ToString) -> Self {
        DbError::Corrupt {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                // "UNIQUE constraint failed: rooms.number, rooms.building_id"
                match msg.find(UNIQUE_PREFIX) {
                    Some(at) => DbError::duplicate(&msg[at + UNIQUE_PREFIX.len()..], "unknown"),
                    None => DbError::Sqlite(msg.to_string()),
                }
            }
            sqlx::Error::PoolTimedOut => DbError::Busy,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            sqlx::Error::ColumnDecode { index, source } => DbError::corrupt(index, source),
            other => DbError::Sqlite(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Rule(CoreError::Validation(err))
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::corrupt("json", err)
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Room", 42);
        assert_eq!(err.to_string(), "Room not found: 42");
    }

    #[test]
    fn test_rule_errors_pass_through() {
        let err: DbError = CoreError::InvoiceAlreadyPaid("INV-2025060001".to_string()).into();
        assert_eq!(err.to_string(), "Invoice INV-2025060001 is already paid");

        let err: DbError = ValidationError::required("name").into();
        assert!(matches!(err, DbError::Rule(CoreError::Validation(_))));
    }

    #[test]
    fn test_pool_errors() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::Busy));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }
}
