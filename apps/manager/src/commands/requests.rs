//! # Customer Request Commands
//!
//! ```text
//!   pending ──start──► in_progress
//!      │                    │
//!      └──complete/reject───┴──► completed | rejected   (terminal)
//! ```

use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use nhatro_core::request::{CustomerRequest, RequestFilter, RequestStats};
use nhatro_core::CoreResult;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBoard {
    pub requests: Vec<CustomerRequest>,
    /// Over every request, regardless of the filter.
    pub stats: RequestStats,
}

pub async fn list_requests(db: &DbState, filter: &RequestFilter) -> Result<RequestBoard, ApiError> {
    let all = db.inner().requests().list().await?;
    let stats = RequestStats::count(&all);
    let requests = all.into_iter().filter(|r| filter.matches(r)).collect();
    Ok(RequestBoard { requests, stats })
}

pub async fn get_request(db: &DbState, id: &str) -> Result<CustomerRequest, ApiError> {
    Ok(db.inner().requests().get(id).await?)
}

/// Load, apply one transition, save.
async fn transition<F>(db: &DbState, id: &str, action: &str, apply: F) -> Result<CustomerRequest, ApiError>
where
    F: FnOnce(&mut CustomerRequest) -> CoreResult<()>,
{
    let mut request = db.inner().requests().get(id).await?;
    apply(&mut request)?;
    db.inner().requests().save(&request).await?;

    info!(request_id = %id, action, status = request.status.as_str(), "Request updated");
    Ok(request)
}

pub async fn start_request(db: &DbState, config: &ConfigState, id: &str) -> Result<CustomerRequest, ApiError> {
    let now = config.now();
    transition(db, id, "start", |r| r.start_progress(now)).await
}

pub async fn complete_request(
    db: &DbState,
    config: &ConfigState,
    id: &str,
    response: Option<String>,
) -> Result<CustomerRequest, ApiError> {
    let now = config.now();
    transition(db, id, "complete", |r| r.complete(response, now)).await
}

pub async fn reject_request(
    db: &DbState,
    config: &ConfigState,
    id: &str,
    response: Option<String>,
) -> Result<CustomerRequest, ApiError> {
    let now = config.now();
    transition(db, id, "reject", |r| r.reject(response, now)).await
}

/// Edits the reply without changing status.
pub async fn save_request_response(
    db: &DbState,
    config: &ConfigState,
    id: &str,
    response: Option<String>,
) -> Result<CustomerRequest, ApiError> {
    let now = config.now();
    transition(db, id, "respond", |r| r.save_response(response, now)).await
}
