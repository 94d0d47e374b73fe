//! # nhatro-core: Pure Billing Logic for the Nhà Trọ Manager
//!
//! This crate holds the rental-property business rules as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Nhà Trọ Manager Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Manager Commands                             │   │
//! │  │    initialize_drafts, publish_all, mark_paid, check_in, ...     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ nhatro-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌──────────┐  │   │
//! │  │   │  pricing  │─►│calculator │─►│   draft    │─►│ invoice  │  │   │
//! │  │   │ template/ │  │ usage ×   │  │ pending →  │  │ derived  │  │   │
//! │  │   │ override  │  │ rate+fees │  │ ready→sent │  │ status   │  │   │
//! │  │   └───────────┘  └─────▲─────┘  └────────────┘  └──────────┘  │   │
//! │  │                  ┌─────┴─────┐                                  │   │
//! │  │                  │   meter   │   request • notification • stats │   │
//! │  │                  │ baseline  │   messaging • validation         │   │
//! │  │                  └───────────┘                                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              nhatro-db (SQLite repositories)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Buildings, rooms, tenants, meter readings
//! - [`money`] - `Dong` amounts
//! - [`pricing`] - Template/override resolution
//! - [`meter`] - Baselines and append rules
//! - [`calculator`] - Invoice line items and totals
//! - [`draft`] - Bulk draft-invoice session
//! - [`invoice`] - Finalized invoices, filters and aggregates
//! - [`messaging`] - Tenant-facing message payloads
//! - [`request`], [`notification`] - Customer requests and the notification feed
//! - [`stats`] - Dashboard and listing aggregates
//! - [`validation`] - Input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use nhatro_core::calculator::{compute_invoice, CalculationInput};
//! use nhatro_core::meter::Baseline;
//! use nhatro_core::pricing::{PricingTemplate, ResolvedPricing};
//! use nhatro_core::{Dong, WaterBilling};
//!
//! let mut pricing = ResolvedPricing::from(&PricingTemplate::default());
//! pricing.parking_fee = Dong::zero();
//!
//! let result = compute_invoice(&CalculationInput {
//!     baseline: Baseline { electricity: 1000, water: 50 },
//!     pricing: &pricing,
//!     new_electricity: Some(1120),
//!     new_water: Some(55),
//!     water_billing: WaterBilling::Metered,
//!     monthly_rent: Dong::new(5_000_000),
//! });
//!
//! assert_eq!(result.total, Dong::new(5_625_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod draft;
pub mod error;
pub mod invoice;
pub mod messaging;
pub mod meter;
pub mod money;
pub mod notification;
pub mod pricing;
pub mod request;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Dong;
pub use pricing::{resolve_pricing, PricingTemplate, ResolvedPricing};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Monthly water charge for flat-billed rooms when none is configured.
pub const DEFAULT_FLAT_WATER_RATE: Dong = Dong::new(100_000);

/// Invoices fall due on this day of the month after the billing month.
pub const INVOICE_DUE_DAY: u32 = 10;

/// Length of a tenancy contract term, renewed automatically.
pub const CONTRACT_TERM_DAYS: i64 = 365;

/// A contract counts as "expiring" when its term ends within this window.
pub const EXPIRING_CONTRACT_WINDOW_DAYS: i64 = 30;

/// Largest meter value accepted: an 8-digit register.
pub const MAX_METER_VALUE: i64 = 99_999_999;

/// Upper bound for an uploaded document image (5 MiB).
pub const MAX_DOCUMENT_BYTES: i64 = 5 * 1024 * 1024;

/// Invoices shown in the bulk-invoice detail sheet.
pub const INVOICE_HISTORY_LIMIT: usize = 3;
