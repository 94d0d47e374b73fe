//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite` are compiled into the binary and
//! applied on open, so a fresh in-memory database and a years-old file
//! database end up on the same schema.
//!
//! ```text
//!   migrations/sqlite/001_initial_schema.sql
//!            │  sqlx::migrate! (compile time)
//!            ▼
//!   SCHEMA ──run()──► _sqlx_migrations  (version, checksum, applied_on)
//! ```
//!
//! Applied files are checksummed; edit history by adding a new numbered
//! file, never by changing an old one.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static SCHEMA: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the schema up to date. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (known, before) = migration_status(pool).await?;
    debug!(known, applied = before, "Schema check");

    SCHEMA.run(pool).await?;

    if before < known {
        info!(applied = known - before, "Schema migrated");
    }
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = SCHEMA.migrations.len();

    // The bookkeeping table only exists after the first run
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((embedded, applied.max(0) as usize))
}
