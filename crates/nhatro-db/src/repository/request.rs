//! # Customer Request Repository
//!
//! Persists tenant requests. Status changes go through the transition
//! methods on [`CustomerRequest`]; this repository only loads and saves.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use nhatro_core::request::{CustomerRequest, RequestCategory, RequestPriority, RequestStatus};
use nhatro_core::CoreError;

#[derive(Debug, Clone)]
pub struct RequestRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct RequestRow {
    id: String,
    room_id: i64,
    tenant_name: String,
    tenant_phone: String,
    room_number: String,
    building_name: String,
    category: RequestCategory,
    priority: RequestPriority,
    title: String,
    description: String,
    status: RequestStatus,
    response: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RequestRow> for CustomerRequest {
    fn from(row: RequestRow) -> Self {
        CustomerRequest {
            id: row.id,
            room_id: row.room_id,
            tenant_name: row.tenant_name,
            tenant_phone: row.tenant_phone,
            room_number: row.room_number,
            building_name: row.building_name,
            category: row.category,
            priority: row.priority,
            title: row.title,
            description: row.description,
            status: row.status,
            response: row.response,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const REQUEST_SELECT: &str = r#"
    SELECT id, room_id, tenant_name, tenant_phone, room_number, building_name,
           category, priority, title, description, status, response,
           created_at, updated_at
    FROM requests
"#;

impl RequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RequestRepository { pool }
    }

    /// Newest first.
    pub async fn list(&self) -> DbResult<Vec<CustomerRequest>> {
        let sql = format!("{} ORDER BY created_at DESC", REQUEST_SELECT);
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CustomerRequest::from).collect())
    }

    pub async fn get(&self, id: &str) -> DbResult<CustomerRequest> {
        let sql = format!("{} WHERE id = ?1", REQUEST_SELECT);
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::from(CoreError::RequestNotFound(id.to_string())))?;
        Ok(row.into())
    }

    pub async fn insert(&self, request: &CustomerRequest) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO requests (
                id, room_id, tenant_name, tenant_phone, room_number, building_name,
                category, priority, title, description, status, response,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&request.id)
        .bind(request.room_id)
        .bind(&request.tenant_name)
        .bind(&request.tenant_phone)
        .bind(&request.room_number)
        .bind(&request.building_name)
        .bind(request.category)
        .bind(request.priority)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.status)
        .bind(&request.response)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Saves status, response and `updated_at` after a transition.
    pub async fn save(&self, request: &CustomerRequest) -> DbResult<()> {
        debug!(request_id = %request.id, status = request.status.as_str(), "Saving request");

        let result = sqlx::query(
            "UPDATE requests SET status = ?1, response = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(request.status)
        .bind(&request.response)
        .bind(request.updated_at)
        .bind(&request.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::RequestNotFound(request.id.clone()).into());
        }
        Ok(())
    }
}
