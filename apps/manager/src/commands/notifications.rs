//! # Notification Commands
//!
//! The operator's feed. Stats are always counted over the whole feed so the
//! filter tabs keep showing their totals.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use nhatro_core::notification::{
    relative_time, Notification, NotificationFilter, NotificationKind, NotificationMetadata,
    NotificationPriority, NotificationStats,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: String,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    /// "5 phút trước", "2 ngày trước", ...
    pub relative_time: String,
    pub is_read: bool,
    pub link: Option<String>,
    pub metadata: NotificationMetadata,
}

impl NotificationDto {
    fn from_notification(n: Notification, now: DateTime<Utc>) -> Self {
        NotificationDto {
            relative_time: relative_time(n.created_at, now),
            id: n.id,
            title: n.title,
            message: n.message,
            priority: n.priority,
            kind: n.kind,
            created_at: n.created_at,
            is_read: n.is_read,
            link: n.link,
            metadata: n.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub items: Vec<NotificationDto>,
    pub stats: NotificationStats,
}

pub async fn list_notifications(
    db: &DbState,
    config: &ConfigState,
    filter: &NotificationFilter,
) -> Result<NotificationFeed, ApiError> {
    let feed = db.inner().notifications().list().await?;
    let stats = NotificationStats::count(&feed);
    let now = config.now();

    let items = feed
        .into_iter()
        .filter(|n| filter.matches(n))
        .map(|n| NotificationDto::from_notification(n, now))
        .collect();

    Ok(NotificationFeed { items, stats })
}

pub async fn mark_notification_read(db: &DbState, id: &str) -> Result<(), ApiError> {
    db.inner().notifications().mark_read(id).await?;
    Ok(())
}

/// Returns how many were unread.
pub async fn mark_all_notifications_read(db: &DbState) -> Result<u64, ApiError> {
    let count = db.inner().notifications().mark_all_read().await?;
    info!(count, "Notifications marked read");
    Ok(count)
}

pub async fn delete_notification(db: &DbState, id: &str) -> Result<(), ApiError> {
    db.inner().notifications().delete(id).await?;
    Ok(())
}

/// Clears every read notification. Returns the number removed.
pub async fn delete_read_notifications(db: &DbState) -> Result<u64, ApiError> {
    let count = db.inner().notifications().delete_read().await?;
    info!(count, "Read notifications deleted");
    Ok(count)
}
