//! # Tenant Commands
//!
//! Check-in, checkout, contact updates and the tenant directory.
//!
//! ```text
//!   empty ──check_in──► paid ◄──mark_invoice_paid── debt
//!     ▲                  │                            ▲
//!     └───check_out──────┘ (rejected while unpaid)    └── publish
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::commands::rooms::RoomDto;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use nhatro_core::stats::{TenantEntry, TenantFilter, TenantStats};
use nhatro_core::validation::{validate_amount, validate_id_number, validate_phone, validate_tenant_name};
use nhatro_core::{Dong, Tenant, TenantDocuments};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantForm {
    pub name: String,
    pub phone: String,
    pub id_number: String,
    pub move_in_date: NaiveDate,
    pub deposit: i64,
    pub notes: Option<String>,
}

impl TenantForm {
    fn validate(&self) -> Result<(), ApiError> {
        validate_tenant_name(&self.name)?;
        validate_phone(&self.phone)?;
        validate_id_number(&self.id_number)?;
        validate_amount("deposit", Dong::new(self.deposit))?;
        Ok(())
    }
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDirectory {
    pub entries: Vec<TenantEntry>,
    /// Counts over the filtered entries.
    pub stats: TenantStats,
}

pub async fn check_in(db: &DbState, room_id: i64, form: TenantForm) -> Result<RoomDto, ApiError> {
    form.validate()?;

    let tenant = Tenant {
        id: Uuid::new_v4().to_string(),
        name: form.name.trim().to_string(),
        phone: form.phone.trim().to_string(),
        id_number: form.id_number.trim().to_string(),
        move_in_date: form.move_in_date,
        deposit: Dong::new(form.deposit),
        notes: clean_notes(form.notes),
        documents: TenantDocuments::default(),
    };

    let room = db.inner().rooms().check_in(room_id, &tenant).await?;
    Ok(RoomDto::from(&room))
}

/// Removes the tenant. Fails while the room has unpaid invoices.
pub async fn check_out(db: &DbState, room_id: i64) -> Result<Tenant, ApiError> {
    let tenant = db.inner().rooms().check_out(room_id).await?;
    Ok(tenant)
}

/// Updates contact details; move-in date and documents are kept.
pub async fn update_tenant(db: &DbState, room_id: i64, form: TenantForm) -> Result<Tenant, ApiError> {
    form.validate()?;

    let room = db.inner().rooms().get(room_id).await?;
    let mut tenant = room.occupant()?.clone();
    tenant.name = form.name.trim().to_string();
    tenant.phone = form.phone.trim().to_string();
    tenant.id_number = form.id_number.trim().to_string();
    tenant.deposit = Dong::new(form.deposit);
    tenant.notes = clean_notes(form.notes);

    db.inner().rooms().update_tenant(room_id, &tenant).await?;
    info!(room_id, tenant_id = %tenant.id, "Tenant updated");
    Ok(tenant)
}

pub async fn list_tenants(
    db: &DbState,
    config: &ConfigState,
    filter: &TenantFilter,
) -> Result<TenantDirectory, ApiError> {
    let today = config.today();
    let rooms = db.inner().rooms().list_occupied().await?;

    let entries: Vec<TenantEntry> = rooms
        .iter()
        .filter_map(|r| TenantEntry::from_room(r, today))
        .filter(|e| filter.matches(e))
        .collect();
    let stats = TenantStats::count(&entries);

    debug!(count = entries.len(), "list_tenants command");
    Ok(TenantDirectory { entries, stats })
}

/// Tenants whose contract term ends within the configured window, soonest first.
pub async fn list_expiring_contracts(db: &DbState, config: &ConfigState) -> Result<Vec<TenantEntry>, ApiError> {
    let today = config.today();
    let rooms = db.inner().rooms().list_occupied().await?;

    let mut entries: Vec<TenantEntry> = rooms
        .iter()
        .filter(|r| {
            r.tenant
                .as_ref()
                .is_some_and(|t| t.contract_expiring(today, config.expiring_window_days))
        })
        .filter_map(|r| TenantEntry::from_room(r, today))
        .collect();
    entries.sort_by_key(|e| e.end_date);
    Ok(entries)
}
