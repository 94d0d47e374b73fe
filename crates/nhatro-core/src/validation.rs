//! # Validation Module
//!
//! Input rules checked before any state changes.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Manager command                                              │
//! │  ├── Type validation (deserialization, BillingMonth parsing)           │
//! │  └── THIS MODULE: tenant fields, amounts, meter values, uploads        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Core state machines                                          │
//! │  └── Draft / invoice / request transitions (CoreError)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE(room_id, month) on invoices and meter readings             │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use nhatro_core::validation::{validate_phone, validate_tenant_name};
//!
//! assert!(validate_tenant_name("Nguyễn Văn An").is_ok());
//! assert!(validate_phone("0901234567").is_ok());
//! assert!(validate_phone("12345").is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Dong;
use crate::types::BusinessProfile;
use crate::{MAX_DOCUMENT_BYTES, MAX_METER_VALUE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Tenant Fields
// =============================================================================

/// Name: required, at most 100 characters.
pub fn validate_tenant_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }
    if name.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 100,
        });
    }
    Ok(())
}

/// Vietnamese mobile number: 10 digits starting with `0`.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(ValidationError::required("phone"));
    }
    if phone.len() != 10 || !phone.starts_with('0') || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format(
            "phone",
            "expected 10 digits starting with 0",
        ));
    }
    Ok(())
}

/// Citizen identity card (CCCD): 12 digits.
pub fn validate_id_number(id_number: &str) -> ValidationResult<()> {
    let id_number = id_number.trim();
    if id_number.is_empty() {
        return Err(ValidationError::required("id_number"));
    }
    if id_number.len() != 12 || !id_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format("id_number", "expected 12 digits"));
    }
    Ok(())
}

// =============================================================================
// Amounts
// =============================================================================

/// Any money field that must be ≥ 0 (deposit, fees, rates).
pub fn validate_amount(field: &str, amount: Dong) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::negative(field));
    }
    Ok(())
}

/// Monthly rent: strictly positive.
pub fn validate_rent(rent: Dong) -> ValidationResult<()> {
    if rent.amount() <= 0 {
        return Err(ValidationError::OutOfRange {
            field: "monthly_rent".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// A typed meter value: `0..=MAX_METER_VALUE`.
pub fn validate_meter_value(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::negative(field));
    }
    if value > MAX_METER_VALUE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_METER_VALUE,
        });
    }
    Ok(())
}

// =============================================================================
// Uploads
// =============================================================================

/// Document images: `image/*`, at most [`MAX_DOCUMENT_BYTES`].
///
/// ```rust
/// use nhatro_core::validation::validate_document_upload;
///
/// assert!(validate_document_upload("image/jpeg", 200_000).is_ok());
/// assert!(validate_document_upload("application/pdf", 200_000).is_err());
/// assert!(validate_document_upload("image/png", 6 * 1024 * 1024).is_err());
/// ```
pub fn validate_document_upload(content_type: &str, size_bytes: i64) -> ValidationResult<()> {
    if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
        return Err(ValidationError::NotAllowed {
            field: "content_type".to_string(),
            allowed: vec!["image/*".to_string()],
        });
    }
    if size_bytes <= 0 {
        return Err(ValidationError::required("file"));
    }
    if size_bytes > MAX_DOCUMENT_BYTES {
        return Err(ValidationError::TooLarge {
            field: "file".to_string(),
            max: MAX_DOCUMENT_BYTES,
            actual: size_bytes,
        });
    }
    Ok(())
}

// =============================================================================
// Settings
// =============================================================================

pub fn validate_business_profile(profile: &BusinessProfile) -> ValidationResult<()> {
    if profile.name.trim().is_empty() {
        return Err(ValidationError::required("business name"));
    }
    validate_phone(&profile.phone)?;
    let email = profile.email.trim();
    if !email.is_empty() {
        match email.split_once('@') {
            Some((user, domain)) if !user.is_empty() && domain.contains('.') => {}
            _ => return Err(ValidationError::invalid_format("email", "expected name@domain")),
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
