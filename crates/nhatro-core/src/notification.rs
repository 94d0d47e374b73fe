//! # Notification Feed
//!
//! Operator-facing notifications (overdue invoices, payments, contract
//! renewals, maintenance alerts) with read state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::invoice::Invoice;
use crate::money::Dong;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Important,
    Priority,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Invoice,
    Contract,
    Payment,
    Maintenance,
    System,
    Tenant,
}

/// Context shown under a notification. Stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NotificationMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Dong>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notification {
    /// UUID v4.
    pub id: String,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub kind: NotificationKind,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    /// Dashboard route to open on click.
    pub link: Option<String>,
    #[serde(default)]
    pub metadata: NotificationMetadata,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        priority: NotificationPriority,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Notification {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            message: message.into(),
            priority,
            kind,
            created_at,
            is_read: false,
            link: None,
            metadata: NotificationMetadata::default(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_metadata(mut self, metadata: NotificationMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Raised after an invoice is published to the tenant.
    pub fn invoice_published(invoice: &Invoice, building_name: &str, now: DateTime<Utc>) -> Self {
        Notification::new(
            NotificationKind::Invoice,
            NotificationPriority::Normal,
            "Đã gửi hóa đơn",
            format!(
                "Hóa đơn tháng {} đã được gửi cho {} (P.{} - {})",
                invoice.month.label(),
                invoice.tenant_name,
                invoice.room_number,
                building_name
            ),
            now,
        )
        .with_link("/dashboard/invoices")
        .with_metadata(NotificationMetadata {
            room_number: Some(invoice.room_number.clone()),
            building_name: Some(building_name.to_string()),
            tenant_name: Some(invoice.tenant_name.clone()),
            amount: Some(invoice.total_amount),
        })
    }

    /// Raised when a payment is confirmed.
    pub fn payment_received(invoice: &Invoice, building_name: &str, now: DateTime<Utc>) -> Self {
        Notification::new(
            NotificationKind::Payment,
            NotificationPriority::Priority,
            "Thanh toán thành công",
            format!(
                "{} đã thanh toán hóa đơn tháng {} - P.{} {}",
                invoice.tenant_name,
                invoice.month.label(),
                invoice.room_number,
                building_name
            ),
            now,
        )
        .with_link("/dashboard/invoices")
        .with_metadata(NotificationMetadata {
            room_number: Some(invoice.room_number.clone()),
            building_name: Some(building_name.to_string()),
            tenant_name: Some(invoice.tenant_name.clone()),
            amount: Some(invoice.total_amount),
        })
    }
}

// =============================================================================
// Filter & Stats
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReadState {
    #[default]
    All,
    Unread,
    Read,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NotificationFilter {
    pub priority: Option<NotificationPriority>,
    pub kind: Option<NotificationKind>,
    #[serde(default)]
    pub read: ReadState,
}

impl NotificationFilter {
    pub fn matches(&self, n: &Notification) -> bool {
        let read_ok = match self.read {
            ReadState::All => true,
            ReadState::Unread => !n.is_read,
            ReadState::Read => n.is_read,
        };
        read_ok
            && self.priority.map_or(true, |p| n.priority == p)
            && self.kind.map_or(true, |k| n.kind == k)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NotificationStats {
    pub unread: usize,
    pub important: usize,
    pub priority: usize,
    pub normal: usize,
}

impl NotificationStats {
    pub fn count<'a, I>(feed: I) -> Self
    where
        I: IntoIterator<Item = &'a Notification>,
    {
        let mut stats = NotificationStats::default();
        for n in feed {
            if !n.is_read {
                stats.unread += 1;
            }
            match n.priority {
                NotificationPriority::Important => stats.important += 1,
                NotificationPriority::Priority => stats.priority += 1,
                NotificationPriority::Normal => stats.normal += 1,
            }
        }
        stats
    }
}

/// "5 phút trước", "3 giờ trước", "2 ngày trước", then a plain date.
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);
    let minutes = elapsed.num_minutes().max(0);
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 60 {
        format!("{} phút trước", minutes)
    } else if hours < 24 {
        format!("{} giờ trước", hours)
    } else if days < 7 {
        format!("{} ngày trước", days)
    } else {
        at.format("%d/%m/%Y").to_string()
    }
}
