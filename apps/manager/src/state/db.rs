//! # Database State
//!
//! Wraps the `Database` handle for use in commands. The inner `SqlitePool`
//! is thread-safe, so commands query concurrently without extra locking.

use nhatro_db::Database;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// ```rust,ignore
    /// let rooms = db_state.inner().rooms().list().await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
