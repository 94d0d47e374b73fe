//! # Customer Requests
//!
//! Maintenance and service requests raised by tenants.
//!
//! ## Lifecycle
//! ```text
//!                 start_progress
//!   ┌─────────┐ ───────────────► ┌─────────────┐
//!   │ Pending │                  │ InProgress  │
//!   └────┬────┘                  └──────┬──────┘
//!        │  complete / reject           │  complete / reject
//!        └──────────────┬───────────────┘
//!                       ▼
//!           ┌──────────────────────┐
//!           │ Completed | Rejected │  terminal
//!           └──────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RequestCategory {
    Maintenance,
    Plumbing,
    Electrical,
    Internet,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RequestPriority {
    Important,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Rejected)
    }
}

/// A tenant's request, with a snapshot of who raised it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerRequest {
    /// UUID v4.
    pub id: String,
    pub room_id: i64,
    pub tenant_name: String,
    pub tenant_phone: String,
    pub room_number: String,
    pub building_name: String,
    pub category: RequestCategory,
    pub priority: RequestPriority,
    pub title: String,
    pub description: String,
    pub status: RequestStatus,
    pub response: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CustomerRequest {
    fn invalid(&self, action: &str) -> CoreError {
        CoreError::InvalidRequestTransition {
            request_id: self.id.clone(),
            from: self.status.as_str().to_string(),
            action: action.to_string(),
        }
    }

    /// pending → in_progress
    pub fn start_progress(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status != RequestStatus::Pending {
            return Err(self.invalid("start"));
        }
        self.status = RequestStatus::InProgress;
        self.updated_at = now;
        Ok(())
    }

    pub fn complete(&mut self, response: Option<String>, now: DateTime<Utc>) -> CoreResult<()> {
        self.close(RequestStatus::Completed, "complete", response, now)
    }

    pub fn reject(&mut self, response: Option<String>, now: DateTime<Utc>) -> CoreResult<()> {
        self.close(RequestStatus::Rejected, "reject", response, now)
    }

    fn close(
        &mut self,
        to: RequestStatus,
        action: &str,
        response: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(self.invalid(action));
        }
        self.status = to;
        self.response = normalize(response);
        self.updated_at = now;
        Ok(())
    }

    /// Updates the reply without changing status. Closed requests are frozen.
    pub fn save_response(&mut self, response: Option<String>, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(self.invalid("edit response"));
        }
        self.response = normalize(response);
        self.updated_at = now;
        Ok(())
    }
}

fn normalize(response: Option<String>) -> Option<String> {
    response
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}

// =============================================================================
// Filter & Stats
// =============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub category: Option<RequestCategory>,
}

impl RequestFilter {
    pub fn matches(&self, request: &CustomerRequest) -> bool {
        self.status.map_or(true, |s| request.status == s)
            && self.category.map_or(true, |c| request.category == c)
    }
}

/// Count per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RequestStats {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub rejected: usize,
}

impl RequestStats {
    pub fn count<'a, I>(requests: I) -> Self
    where
        I: IntoIterator<Item = &'a CustomerRequest>,
    {
        let mut stats = RequestStats::default();
        for r in requests {
            match r.status {
                RequestStatus::Pending => stats.pending += 1,
                RequestStatus::InProgress => stats.in_progress += 1,
                RequestStatus::Completed => stats.completed += 1,
                RequestStatus::Rejected => stats.rejected += 1,
            }
        }
        stats
    }
}
