//! # Notification Repository
//!
//! The operator's feed. Metadata is stored as a JSON column.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use nhatro_core::notification::{
    Notification, NotificationKind, NotificationMetadata, NotificationPriority,
};

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: String,
    title: String,
    message: String,
    priority: NotificationPriority,
    kind: NotificationKind,
    created_at: DateTime<Utc>,
    is_read: bool,
    link: Option<String>,
    metadata: String,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DbError;

    fn try_from(row: NotificationRow) -> DbResult<Self> {
        let metadata: NotificationMetadata = serde_json::from_str(&row.metadata)
            .map_err(|e| DbError::corrupt("notifications.metadata", e))?;
        Ok(Notification {
            id: row.id,
            title: row.title,
            message: row.message,
            priority: row.priority,
            kind: row.kind,
            created_at: row.created_at,
            is_read: row.is_read,
            link: row.link,
            metadata,
        })
    }
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Newest first.
    pub async fn list(&self) -> DbResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, title, message, priority, kind, created_at, is_read, link, metadata
            FROM notifications
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    pub async fn insert(&self, notification: &Notification) -> DbResult<()> {
        let metadata = serde_json::to_string(&notification.metadata)?;
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, title, message, priority, kind, created_at, is_read, link, metadata
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.priority)
        .bind(notification.kind)
        .bind(notification.created_at)
        .bind(notification.is_read)
        .bind(&notification.link)
        .bind(metadata)
        .execute(&self.pool)
        .await?;

        debug!(id = %notification.id, kind = ?notification.kind, "Notification added");
        Ok(())
    }

    pub async fn mark_read(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }
        Ok(())
    }

    /// Returns how many were unread.
    pub async fn mark_all_read(&self) -> DbResult<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE is_read = 0")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }
        Ok(())
    }

    /// Returns the number removed.
    pub async fn delete_read(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE is_read = 1")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
