//! # Database Handle
//!
//! Opens the SQLite pool and hands out one repository per table group.
//!
//! ```text
//!   DbConfig { location, .. }
//!        │
//!        ├── Memory ───► 1 pinned connection, never recycled
//!        └── File(p) ──► WAL, synchronous=NORMAL, up to max_connections
//!        │
//!        ▼
//!   Database::new ──► migrations ──► buildings() rooms() invoices()
//!                                    requests() notifications() settings()
//! ```
//!
//! The dashboard normally runs on memory seeded with mock data. Setting a
//! file path keeps data between runs.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::building::BuildingRepository;
use crate::repository::invoice::InvoiceRepository;
use crate::repository::notification::NotificationRepository;
use crate::repository::request::RequestRepository;
use crate::repository::room::RoomRepository;
use crate::repository::settings::SettingsRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// One private SQLite memory database; gone when the pool closes.
    Memory,
    /// A database file, created on first open.
    File(PathBuf),
}

/// How to open the manager database.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("/srv/nhatro/nhatro.db").max_connections(4)).await?;
/// let scratch = Database::new(DbConfig::in_memory()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,

    /// Pool size for file databases. Memory databases always use one.
    pub max_connections: u32,

    /// How long a command waits for a free connection.
    pub acquire_timeout: Duration,

    /// Idle file connections are closed after this long.
    pub idle_timeout: Duration,

    /// Apply embedded migrations on open (default on).
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed database at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 4,
            acquire_timeout: Duration::from_secs(15),
            idle_timeout: Duration::from_secs(300),
            run_migrations: true,
        }
    }

    /// In-memory database, the dashboard default.
    ///
    /// Each SQLite memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(15),
            idle_timeout: Duration::from_secs(300),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.location == DbLocation::Memory
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = match &self.location {
            DbLocation::Memory => SqliteConnectOptions::new().in_memory(true),
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
        };
        // Off by default in SQLite; the schema relies on ON DELETE CASCADE
        options.foreign_keys(true)
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(self.acquire_timeout);
        match self.location {
            DbLocation::Memory => options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
            DbLocation::File(_) => options
                .max_connections(self.max_connections.max(1))
                .idle_timeout(Some(self.idle_timeout)),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig::in_memory()
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone; every repository accessor hands out its own clone of
/// the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Creates the connection pool and runs migrations (if enabled).
    ///
    /// Every connection enforces foreign keys. File databases also use WAL
    /// with NORMAL synchronous.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(location = ?config.location, "Opening database");

        let pool = config
            .pool_options()
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(in_memory = config.is_in_memory(), "Pool ready");

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn buildings(&self) -> BuildingRepository {
        BuildingRepository::new(self.pool.clone())
    }

    /// Rooms with their tenant, readings and pricing.
    pub fn rooms(&self) -> RoomRepository {
        RoomRepository::new(self.pool.clone())
    }

    /// Invoices, including the publish and payment transactions.
    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.pool.clone())
    }

    pub fn requests(&self) -> RequestRepository {
        RequestRepository::new(self.pool.clone())
    }

    pub fn notifications(&self) -> NotificationRepository {
        NotificationRepository::new(self.pool.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database closed");
    }

    /// `true` when the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
