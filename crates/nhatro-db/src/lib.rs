//! # nhatro-db: Database Layer for the Nhà Trọ manager
//!
//! Persistence for buildings, rooms, tenants, meter readings, invoices,
//! requests, notifications and settings. SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Nhà Trọ Data Flow                                │
//! │                                                                         │
//! │  Manager command (publish_single)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     nhatro-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (room.rs)    │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ RoomRepo      │    │ 001_initial  │  │   │
//! │  │   │ in-memory or  │◄───│ InvoiceRepo   │    │ _schema.sql  │  │   │
//! │  │   │ WAL file      │    │ SettingsRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite: `sqlite::memory:` (default) or a file from config      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per aggregate
//! - [`seed`] - Deterministic mock data
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nhatro_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::in_memory()).await?;
//! let rooms = db.rooms().list_occupied().await?;
//! let invoice = db.invoices().publish_draft(&draft, &reading, Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};
pub use seed::{seed, seed_if_empty, SeedOptions, SeedSummary};

// Repository re-exports for convenience
pub use repository::building::BuildingRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::notification::NotificationRepository;
pub use repository::request::RequestRepository;
pub use repository::room::RoomRepository;
pub use repository::settings::SettingsRepository;
