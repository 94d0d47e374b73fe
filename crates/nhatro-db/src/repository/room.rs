//! # Room Repository
//!
//! Rooms are loaded as full aggregates: the room row, its tenant (if any)
//! and its chronological meter readings.
//!
//! ## Occupancy Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌────────┐   check_in(tenant)    ┌────────┐   unpaid invoice ┌──────┐ │
//! │   │ empty  │ ────────────────────► │  paid  │ ◄──────────────► │ debt │ │
//! │   └────────┘                       └────────┘  refresh_balance └──────┘ │
//! │        ▲                                │                               │
//! │        └──────── check_out ─────────────┘  (no unpaid invoices)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use nhatro_core::meter::MeterHistory;
use nhatro_core::{
    BillingMonth, CoreError, DocumentSlot, Dong, MeterReading, Room, RoomPricing, RoomStatus,
    Tenant, TenantDocuments, WaterBilling, WaterMode,
};

/// Repository for rooms, their tenants and meter readings.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

// =============================================================================
// Row Types
// =============================================================================

const ROOM_SELECT: &str = r#"
    SELECT
        r.id, r.building_id, r.room_number, r.room_code, r.floor, r.status,
        r.monthly_rent, r.area, r.debt_amount,
        r.use_custom_pricing, r.custom_electricity_rate, r.custom_water_rate,
        r.custom_wifi_fee, r.custom_trash_fee, r.custom_parking_fee,
        r.water_billing_mode, r.flat_water_rate,
        t.id AS tenant_id, t.name AS tenant_name, t.phone AS tenant_phone,
        t.id_number AS tenant_id_number, t.move_in_date AS tenant_move_in_date,
        t.deposit AS tenant_deposit, t.notes AS tenant_notes,
        t.doc_id_front, t.doc_id_back, t.doc_vehicle, t.doc_contract
    FROM rooms r
    LEFT JOIN tenants t ON t.room_id = r.id
"#;

#[derive(Debug, sqlx::FromRow)]
struct RoomRow {
    id: i64,
    building_id: String,
    room_number: String,
    room_code: Option<String>,
    floor: Option<i64>,
    status: RoomStatus,
    monthly_rent: i64,
    area: Option<i64>,
    debt_amount: Option<i64>,
    use_custom_pricing: bool,
    custom_electricity_rate: Option<i64>,
    custom_water_rate: Option<i64>,
    custom_wifi_fee: Option<i64>,
    custom_trash_fee: Option<i64>,
    custom_parking_fee: Option<i64>,
    water_billing_mode: WaterMode,
    flat_water_rate: Option<i64>,
    tenant_id: Option<String>,
    tenant_name: Option<String>,
    tenant_phone: Option<String>,
    tenant_id_number: Option<String>,
    tenant_move_in_date: Option<NaiveDate>,
    tenant_deposit: Option<i64>,
    tenant_notes: Option<String>,
    doc_id_front: Option<String>,
    doc_id_back: Option<String>,
    doc_vehicle: Option<String>,
    doc_contract: Option<String>,
}

impl RoomRow {
    fn into_room(self, meter_readings: Vec<MeterReading>) -> Room {
        let overrides = [
            self.custom_electricity_rate,
            self.custom_water_rate,
            self.custom_wifi_fee,
            self.custom_trash_fee,
            self.custom_parking_fee,
        ];
        let custom_pricing = (self.use_custom_pricing || overrides.iter().any(Option::is_some))
            .then(|| RoomPricing {
                use_custom_pricing: self.use_custom_pricing,
                electricity_rate: self.custom_electricity_rate.map(Dong::new),
                water_rate: self.custom_water_rate.map(Dong::new),
                wifi_fee: self.custom_wifi_fee.map(Dong::new),
                trash_fee: self.custom_trash_fee.map(Dong::new),
                parking_fee: self.custom_parking_fee.map(Dong::new),
            });

        let tenant = match (self.tenant_id, self.tenant_move_in_date) {
            (Some(id), Some(move_in_date)) => Some(Tenant {
                id,
                name: self.tenant_name.unwrap_or_default(),
                phone: self.tenant_phone.unwrap_or_default(),
                id_number: self.tenant_id_number.unwrap_or_default(),
                move_in_date,
                deposit: Dong::new(self.tenant_deposit.unwrap_or(0)),
                notes: self.tenant_notes,
                documents: TenantDocuments {
                    id_front: self.doc_id_front,
                    id_back: self.doc_id_back,
                    vehicle: self.doc_vehicle,
                    contract: self.doc_contract,
                },
            }),
            _ => None,
        };

        Room {
            id: self.id,
            building_id: self.building_id,
            room_number: self.room_number,
            room_code: self.room_code,
            floor: self.floor,
            status: self.status,
            monthly_rent: Dong::new(self.monthly_rent),
            area: self.area,
            debt_amount: self.debt_amount.map(Dong::new),
            tenant,
            meter_readings,
            custom_pricing,
            water_billing: WaterBilling::from_parts(
                self.water_billing_mode,
                self.flat_water_rate.map(Dong::new),
            ),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReadingRow {
    room_id: i64,
    month: String,
    electricity_prev: i64,
    electricity_curr: i64,
    water_prev: i64,
    water_curr: i64,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<ReadingRow> for MeterReading {
    type Error = DbError;

    fn try_from(row: ReadingRow) -> DbResult<Self> {
        let month: BillingMonth = row
            .month
            .parse()
            .map_err(|e| DbError::corrupt("meter_readings.month", e))?;
        Ok(MeterReading {
            month,
            electricity_prev: row.electricity_prev,
            electricity_curr: row.electricity_curr,
            water_prev: row.water_prev,
            water_curr: row.water_curr,
            recorded_at: row.recorded_at,
        })
    }
}

// =============================================================================
// Shared Helpers (used inside other repositories' transactions)
// =============================================================================

/// Chronological readings of one room.
pub(crate) async fn load_readings(
    conn: &mut SqliteConnection,
    room_id: i64,
) -> DbResult<Vec<MeterReading>> {
    let rows = sqlx::query_as::<_, ReadingRow>(
        r#"
        SELECT room_id, month, electricity_prev, electricity_curr,
               water_prev, water_curr, recorded_at
        FROM meter_readings
        WHERE room_id = ?1
        ORDER BY month
        "#,
    )
    .bind(room_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(MeterReading::try_from).collect()
}

/// Appends a reading, or replaces the one already recorded for its month.
///
/// The reading is checked against the room's history first.
pub(crate) async fn record_reading(
    conn: &mut SqliteConnection,
    room_id: i64,
    reading: &MeterReading,
) -> DbResult<()> {
    let history = load_readings(&mut *conn, room_id).await?;
    MeterHistory::new(&history).validate_append(reading)?;

    sqlx::query(
        r#"
        INSERT INTO meter_readings (
            room_id, month, electricity_prev, electricity_curr,
            water_prev, water_curr, recorded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT (room_id, month) DO UPDATE SET
            electricity_prev = excluded.electricity_prev,
            electricity_curr = excluded.electricity_curr,
            water_prev = excluded.water_prev,
            water_curr = excluded.water_curr,
            recorded_at = excluded.recorded_at
        "#,
    )
    .bind(room_id)
    .bind(reading.month.to_string())
    .bind(reading.electricity_prev)
    .bind(reading.electricity_curr)
    .bind(reading.water_prev)
    .bind(reading.water_curr)
    .bind(reading.recorded_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Recomputes an occupied room's payment status from its unpaid invoices.
///
/// ```text
/// no unpaid invoices → status = paid, debt_amount = NULL
/// otherwise          → status = debt, debt_amount = Σ unpaid totals
/// ```
/// Empty rooms are left as they are.
pub(crate) async fn refresh_balance(conn: &mut SqliteConnection, room_id: i64) -> DbResult<RoomStatus> {
    let (status,): (RoomStatus,) = sqlx::query_as("SELECT status FROM rooms WHERE id = ?1")
        .bind(room_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Room", room_id))?;

    if status == RoomStatus::Empty {
        return Ok(status);
    }

    let (count, outstanding): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(SUM(total_amount), 0)
        FROM invoices
        WHERE room_id = ?1 AND paid_date IS NULL
        "#,
    )
    .bind(room_id)
    .fetch_one(&mut *conn)
    .await?;

    let (status, debt) = if count == 0 {
        (RoomStatus::Paid, None)
    } else {
        (RoomStatus::Debt, Some(outstanding))
    };

    sqlx::query("UPDATE rooms SET status = ?1, debt_amount = ?2 WHERE id = ?3")
        .bind(status)
        .bind(debt)
        .bind(room_id)
        .execute(&mut *conn)
        .await?;

    debug!(room_id, status = status.as_str(), debt = ?debt, "Room balance refreshed");
    Ok(status)
}

// =============================================================================
// Repository
// =============================================================================

impl RoomRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RoomRepository { pool }
    }

    /// Every room, in insertion order, with tenant and readings.
    pub async fn list(&self) -> DbResult<Vec<Room>> {
        let sql = format!("{} ORDER BY r.id", ROOM_SELECT);
        let rows = sqlx::query_as::<_, RoomRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let mut readings = self.readings_by_room().await?;
        let rooms: Vec<Room> = rows
            .into_iter()
            .map(|row| {
                let history = readings.remove(&row.id).unwrap_or_default();
                row.into_room(history)
            })
            .collect();

        debug!(count = rooms.len(), "Loaded rooms");
        Ok(rooms)
    }

    pub async fn list_by_building(&self, building_id: &str) -> DbResult<Vec<Room>> {
        let rooms = self.list().await?;
        Ok(rooms
            .into_iter()
            .filter(|r| r.building_id == building_id)
            .collect())
    }

    /// Occupied rooms only, in insertion order.
    pub async fn list_occupied(&self) -> DbResult<Vec<Room>> {
        let rooms = self.list().await?;
        Ok(rooms.into_iter().filter(Room::is_occupied).collect())
    }

    /// Returns `DbError::NotFound` for an unknown id.
    pub async fn get(&self, room_id: i64) -> DbResult<Room> {
        let sql = format!("{} WHERE r.id = ?1", ROOM_SELECT);
        let row = sqlx::query_as::<_, RoomRow>(&sql)
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Room", room_id))?;

        let mut conn = self.pool.acquire().await?;
        let readings = load_readings(&mut *conn, room_id).await?;
        Ok(row.into_room(readings))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn readings_by_room(&self) -> DbResult<HashMap<i64, Vec<MeterReading>>> {
        let rows = sqlx::query_as::<_, ReadingRow>(
            r#"
            SELECT room_id, month, electricity_prev, electricity_curr,
                   water_prev, water_curr, recorded_at
            FROM meter_readings
            ORDER BY room_id, month
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_room: HashMap<i64, Vec<MeterReading>> = HashMap::new();
        for row in rows {
            let room_id = row.room_id;
            by_room
                .entry(room_id)
                .or_default()
                .push(MeterReading::try_from(row)?);
        }
        Ok(by_room)
    }

    /// Inserts a complete room aggregate in one transaction.
    ///
    /// Used by the seeder; readings are validated in order like any append.
    pub async fn insert(&self, room: &Room) -> DbResult<()> {
        room.check_invariants()?;
        let pricing = room.custom_pricing.clone().unwrap_or_default();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO rooms (
                id, building_id, room_number, room_code, floor, status,
                monthly_rent, area, debt_amount,
                use_custom_pricing, custom_electricity_rate, custom_water_rate,
                custom_wifi_fee, custom_trash_fee, custom_parking_fee,
                water_billing_mode, flat_water_rate
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(room.id)
        .bind(&room.building_id)
        .bind(&room.room_number)
        .bind(&room.room_code)
        .bind(room.floor)
        .bind(room.status)
        .bind(room.monthly_rent.amount())
        .bind(room.area)
        .bind(room.debt_amount.map(|d| d.amount()))
        .bind(pricing.use_custom_pricing)
        .bind(pricing.electricity_rate.map(|d| d.amount()))
        .bind(pricing.water_rate.map(|d| d.amount()))
        .bind(pricing.wifi_fee.map(|d| d.amount()))
        .bind(pricing.trash_fee.map(|d| d.amount()))
        .bind(pricing.parking_fee.map(|d| d.amount()))
        .bind(room.water_billing.mode())
        .bind(flat_rate_column(room.water_billing))
        .execute(&mut *tx)
        .await?;

        if let Some(tenant) = &room.tenant {
            insert_tenant(&mut *tx, room.id, tenant).await?;
        }

        for reading in &room.meter_readings {
            record_reading(&mut *tx, room.id, reading).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Occupancy
    // =========================================================================

    /// Moves a tenant into an empty room. The room becomes `paid`.
    pub async fn check_in(&self, room_id: i64, tenant: &Tenant) -> DbResult<Room> {
        let mut tx = self.pool.begin().await?;

        let (status,): (RoomStatus,) = sqlx::query_as("SELECT status FROM rooms WHERE id = ?1")
            .bind(room_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Room", room_id))?;
        if status != RoomStatus::Empty {
            return Err(CoreError::RoomOccupied { room_id }.into());
        }

        insert_tenant(&mut *tx, room_id, tenant).await?;

        sqlx::query("UPDATE rooms SET status = 'paid', debt_amount = NULL WHERE id = ?1")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(room_id, tenant = %tenant.name, "Tenant checked in");
        self.get(room_id).await
    }

    /// Removes the tenant. Rejected while the room has unpaid invoices.
    pub async fn check_out(&self, room_id: i64) -> DbResult<Tenant> {
        let room = self.get(room_id).await?;
        let tenant = room.occupant()?.clone();

        let mut tx = self.pool.begin().await?;

        let unpaid: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invoices WHERE room_id = ?1 AND paid_date IS NULL",
        )
        .bind(room_id)
        .fetch_one(&mut *tx)
        .await?;
        if unpaid > 0 {
            return Err(CoreError::OutstandingInvoices {
                room_id,
                count: unpaid as usize,
            }
            .into());
        }

        sqlx::query("DELETE FROM tenants WHERE room_id = ?1")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE rooms SET status = 'empty', debt_amount = NULL WHERE id = ?1")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(room_id, tenant = %tenant.name, "Tenant checked out");
        Ok(tenant)
    }

    /// Updates contact details and notes of the current tenant.
    pub async fn update_tenant(&self, room_id: i64, tenant: &Tenant) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET name = ?1, phone = ?2, id_number = ?3, deposit = ?4, notes = ?5
            WHERE room_id = ?6
            "#,
        )
        .bind(&tenant.name)
        .bind(&tenant.phone)
        .bind(&tenant.id_number)
        .bind(tenant.deposit.amount())
        .bind(&tenant.notes)
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::RoomNotOccupied { room_id }.into());
        }
        Ok(())
    }

    // =========================================================================
    // Pricing & Billing Mode
    // =========================================================================

    /// Replaces the room's pricing override. `None` clears it.
    pub async fn update_pricing(&self, room_id: i64, pricing: Option<&RoomPricing>) -> DbResult<()> {
        let pricing = pricing.cloned().unwrap_or_default();
        debug!(room_id, custom = pricing.use_custom_pricing, "Updating room pricing");

        let result = sqlx::query(
            r#"
            UPDATE rooms SET
                use_custom_pricing = ?1,
                custom_electricity_rate = ?2,
                custom_water_rate = ?3,
                custom_wifi_fee = ?4,
                custom_trash_fee = ?5,
                custom_parking_fee = ?6
            WHERE id = ?7
            "#,
        )
        .bind(pricing.use_custom_pricing)
        .bind(pricing.electricity_rate.map(|d| d.amount()))
        .bind(pricing.water_rate.map(|d| d.amount()))
        .bind(pricing.wifi_fee.map(|d| d.amount()))
        .bind(pricing.trash_fee.map(|d| d.amount()))
        .bind(pricing.parking_fee.map(|d| d.amount()))
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Room", room_id));
        }
        Ok(())
    }

    pub async fn set_water_billing(&self, room_id: i64, billing: WaterBilling) -> DbResult<()> {
        debug!(room_id, mode = ?billing.mode(), "Updating water billing");

        let result = sqlx::query(
            "UPDATE rooms SET water_billing_mode = ?1, flat_water_rate = ?2 WHERE id = ?3",
        )
        .bind(billing.mode())
        .bind(flat_rate_column(billing))
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Room", room_id));
        }
        Ok(())
    }

    // =========================================================================
    // Tenant Documents
    // =========================================================================

    /// Stores (or clears) the image key for one document slot.
    ///
    /// Returns the key that was there before.
    pub async fn set_document(
        &self,
        room_id: i64,
        slot: DocumentSlot,
        key: Option<&str>,
    ) -> DbResult<Option<String>> {
        let column = document_column(slot);
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {} FROM tenants WHERE room_id = ?1", column);
        let previous: Option<Option<String>> = sqlx::query_scalar(&select)
            .bind(room_id)
            .fetch_optional(&mut *tx)
            .await?;
        let previous = previous.ok_or(CoreError::RoomNotOccupied { room_id })?;

        let update = format!("UPDATE tenants SET {} = ?1 WHERE room_id = ?2", column);
        sqlx::query(&update)
            .bind(key)
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(room_id, slot = slot.as_str(), stored = key.is_some(), "Document slot updated");
        Ok(previous)
    }
}

async fn insert_tenant(conn: &mut SqliteConnection, room_id: i64, tenant: &Tenant) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO tenants (
            id, room_id, name, phone, id_number, move_in_date, deposit, notes,
            doc_id_front, doc_id_back, doc_vehicle, doc_contract, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&tenant.id)
    .bind(room_id)
    .bind(&tenant.name)
    .bind(&tenant.phone)
    .bind(&tenant.id_number)
    .bind(tenant.move_in_date)
    .bind(tenant.deposit.amount())
    .bind(&tenant.notes)
    .bind(&tenant.documents.id_front)
    .bind(&tenant.documents.id_back)
    .bind(&tenant.documents.vehicle)
    .bind(&tenant.documents.contract)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { .. } => DbError::Rule(CoreError::RoomOccupied { room_id }),
        other => other,
    })?;
    Ok(())
}

fn flat_rate_column(billing: WaterBilling) -> Option<i64> {
    match billing {
        WaterBilling::Metered => None,
        WaterBilling::Flat { rate } => Some(rate.amount()),
    }
}

fn document_column(slot: DocumentSlot) -> &'static str {
    match slot {
        DocumentSlot::IdFront => "doc_id_front",
        DocumentSlot::IdBack => "doc_id_back",
        DocumentSlot::Vehicle => "doc_vehicle",
        DocumentSlot::Contract => "doc_contract",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{building, empty_room, occupied_room, setup};

    #[tokio::test]
    async fn test_insert_and_load_aggregate() {
        let db = setup().await;
        db.buildings().insert(&building("hagl3")).await.unwrap();

        let mut room = occupied_room(1, "hagl3", "101");
        room.custom_pricing = Some(RoomPricing {
            use_custom_pricing: true,
            electricity_rate: Some(Dong::new(4_000)),
            ..Default::default()
        });
        room.water_billing = WaterBilling::Flat {
            rate: Dong::new(120_000),
        };
        db.rooms().insert(&room).await.unwrap();
        db.rooms().insert(&empty_room(2, "hagl3", "102")).await.unwrap();

        let loaded = db.rooms().get(1).await.unwrap();
        assert_eq!(loaded, room);

        let all = db.rooms().list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(db.rooms().list_occupied().await.unwrap().len(), 1);
        assert_eq!(db.rooms().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_get_unknown_room() {
        let db = setup().await;
        assert!(matches!(
            db.rooms().get(999).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_check_in_and_out() {
        let db = setup().await;
        db.buildings().insert(&building("pha")).await.unwrap();
        db.rooms().insert(&empty_room(5, "pha", "201")).await.unwrap();

        let tenant = occupied_room(0, "pha", "x").tenant.unwrap();
        let room = db.rooms().check_in(5, &tenant).await.unwrap();
        assert_eq!(room.status, RoomStatus::Paid);
        assert_eq!(room.tenant.as_ref().map(|t| t.name.as_str()), Some(tenant.name.as_str()));

        // Second check-in is rejected
        assert!(matches!(
            db.rooms().check_in(5, &tenant).await,
            Err(DbError::Rule(CoreError::RoomOccupied { room_id: 5 }))
        ));

        let left = db.rooms().check_out(5).await.unwrap();
        assert_eq!(left.id, tenant.id);
        let room = db.rooms().get(5).await.unwrap();
        assert_eq!(room.status, RoomStatus::Empty);
        assert!(room.tenant.is_none());

        // Nobody left to check out
        assert!(matches!(
            db.rooms().check_out(5).await,
            Err(DbError::Rule(CoreError::RoomNotOccupied { .. }))
        ));
    }

    #[tokio::test]
    async fn test_pricing_and_water_billing_updates() {
        let db = setup().await;
        db.buildings().insert(&building("ssr")).await.unwrap();
        db.rooms().insert(&occupied_room(3, "ssr", "301")).await.unwrap();

        let pricing = RoomPricing {
            use_custom_pricing: true,
            wifi_fee: Some(Dong::zero()),
            ..Default::default()
        };
        db.rooms().update_pricing(3, Some(&pricing)).await.unwrap();
        db.rooms()
            .set_water_billing(3, WaterBilling::Flat { rate: Dong::new(90_000) })
            .await
            .unwrap();

        let room = db.rooms().get(3).await.unwrap();
        assert_eq!(room.custom_pricing, Some(pricing));
        assert_eq!(room.water_billing.flat_rate(), Dong::new(90_000));

        db.rooms().update_pricing(3, None).await.unwrap();
        db.rooms().set_water_billing(3, WaterBilling::Metered).await.unwrap();
        let room = db.rooms().get(3).await.unwrap();
        assert_eq!(room.custom_pricing, None);
        assert_eq!(room.water_billing, WaterBilling::Metered);

        assert!(db.rooms().set_water_billing(404, WaterBilling::Metered).await.is_err());
    }

    #[tokio::test]
    async fn test_document_slots() {
        let db = setup().await;
        db.buildings().insert(&building("mp6")).await.unwrap();
        db.rooms().insert(&occupied_room(7, "mp6", "MP-1-01")).await.unwrap();

        let prev = db
            .rooms()
            .set_document(7, DocumentSlot::IdFront, Some("tenants/7/id_front.jpg"))
            .await
            .unwrap();
        assert!(prev.is_none());

        let prev = db
            .rooms()
            .set_document(7, DocumentSlot::IdFront, None)
            .await
            .unwrap();
        assert_eq!(prev.as_deref(), Some("tenants/7/id_front.jpg"));

        let room = db.rooms().get(7).await.unwrap();
        assert!(room.tenant.unwrap().documents.id_front.is_none());
    }

    #[tokio::test]
    async fn test_out_of_order_reading_rejected() {
        let db = setup().await;
        db.buildings().insert(&building("hagl3")).await.unwrap();
        let mut room = occupied_room(8, "hagl3", "108");
        // April closes at 1100, but May claims to start at 1000
        let april = room.meter_readings[0].clone();
        let mut may = april.clone();
        may.month = april.month.next();
        may.electricity_prev = 1000;
        room.meter_readings.push(may);

        assert!(matches!(
            db.rooms().insert(&room).await,
            Err(DbError::Rule(CoreError::Validation(_)))
        ));
        // Nothing was written
        assert_eq!(db.rooms().count().await.unwrap(), 0);
    }
}
