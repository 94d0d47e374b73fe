//! # Invoice Repository
//!
//! Invoice records plus the two transactions that move money state.
//!
//! ## Publish Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  publish_draft(draft, reading)                      ONE TRANSACTION     │
//! │                                                                         │
//! │  1. Tenant on the room still the draft's tenant?   else TenantChanged  │
//! │  2. Invoice for (room, month) exists?                                  │
//! │       ├── paid     → InvoiceAlreadyPaid (nothing written)              │
//! │       ├── unpaid   → update amounts, keep id and created_at            │
//! │       └── missing  → insert with next INV-YYYYMM#### id                │
//! │  3. Record the month's meter reading (validated against history)       │
//! │  4. Refresh room balance (paid / debt + outstanding sum)               │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Payment Transaction
//! `mark_paid` sets `paid_date` and refreshes the room balance together.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::room::{record_reading, refresh_balance};
use nhatro_core::draft::DraftInvoiceEntry;
use nhatro_core::invoice::{invoice_id, invoice_id_prefix, Invoice};
use nhatro_core::{BillingMonth, CoreError, Dong, MeterReading};

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

const INVOICE_SELECT: &str = r#"
    SELECT
        id, building_id, room_id, room_number, tenant_name, tenant_phone, month,
        rent_amount, electricity_usage, electricity_amount, water_usage, water_amount,
        other_fees, total_amount, due_date, paid_date, created_at, notes
    FROM invoices
"#;

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    building_id: String,
    room_id: i64,
    room_number: String,
    tenant_name: String,
    tenant_phone: String,
    month: String,
    rent_amount: i64,
    electricity_usage: i64,
    electricity_amount: i64,
    water_usage: i64,
    water_amount: i64,
    other_fees: i64,
    total_amount: i64,
    due_date: NaiveDate,
    paid_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    notes: Option<String>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DbError;

    fn try_from(row: InvoiceRow) -> DbResult<Self> {
        let month: BillingMonth = row
            .month
            .parse()
            .map_err(|e| DbError::corrupt("invoices.month", e))?;

        Ok(Invoice {
            id: row.id,
            building_id: row.building_id,
            room_id: row.room_id,
            room_number: row.room_number,
            tenant_name: row.tenant_name,
            tenant_phone: row.tenant_phone,
            month,
            rent_amount: Dong::new(row.rent_amount),
            electricity_usage: row.electricity_usage,
            electricity_amount: Dong::new(row.electricity_amount),
            water_usage: row.water_usage,
            water_amount: Dong::new(row.water_amount),
            other_fees: Dong::new(row.other_fees),
            total_amount: Dong::new(row.total_amount),
            due_date: row.due_date,
            paid_date: row.paid_date,
            created_at: row.created_at,
            notes: row.notes,
        })
    }
}

fn into_invoices(rows: Vec<InvoiceRow>) -> DbResult<Vec<Invoice>> {
    rows.into_iter().map(Invoice::try_from).collect()
}

async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Invoice>> {
    let sql = format!("{} WHERE id = ?1", INVOICE_SELECT);
    sqlx::query_as::<_, InvoiceRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(Invoice::try_from)
        .transpose()
}

/// Next id in the creation month's sequence.
async fn next_invoice_id(conn: &mut SqliteConnection, created_in: BillingMonth) -> DbResult<String> {
    let prefix = invoice_id_prefix(created_in);
    let last: Option<String> = sqlx::query_scalar(
        "SELECT id FROM invoices WHERE id LIKE ?1 || '%' ORDER BY id DESC LIMIT 1",
    )
    .bind(&prefix)
    .fetch_optional(&mut *conn)
    .await?;

    let sequence = match last {
        None => 1,
        Some(id) => {
            id[prefix.len()..]
                .parse::<u32>()
                .map_err(|e| DbError::corrupt("invoices.id", e))?
                + 1
        }
    };
    Ok(invoice_id(created_in, sequence))
}

async fn insert_invoice(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, building_id, room_id, room_number, tenant_name, tenant_phone, month,
            rent_amount, electricity_usage, electricity_amount, water_usage, water_amount,
            other_fees, total_amount, due_date, paid_date, created_at, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.building_id)
    .bind(invoice.room_id)
    .bind(&invoice.room_number)
    .bind(&invoice.tenant_name)
    .bind(&invoice.tenant_phone)
    .bind(invoice.month.to_string())
    .bind(invoice.rent_amount.amount())
    .bind(invoice.electricity_usage)
    .bind(invoice.electricity_amount.amount())
    .bind(invoice.water_usage)
    .bind(invoice.water_amount.amount())
    .bind(invoice.other_fees.amount())
    .bind(invoice.total_amount.amount())
    .bind(invoice.due_date)
    .bind(invoice.paid_date)
    .bind(invoice.created_at)
    .bind(&invoice.notes)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    // =========================================================================
    // Publish
    // =========================================================================

    /// Persists a ready draft: creates or updates the `(room, month)`
    /// invoice and records the month's meter reading, atomically.
    pub async fn publish_draft(
        &self,
        draft: &DraftInvoiceEntry,
        reading: &MeterReading,
        now: DateTime<Utc>,
    ) -> DbResult<Invoice> {
        let room_id = draft.room_id;
        let mut tx = self.pool.begin().await?;

        let tenant_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM tenants WHERE room_id = ?1")
                .bind(room_id)
                .fetch_optional(&mut *tx)
                .await?;
        match tenant_id {
            None => return Err(CoreError::RoomNotOccupied { room_id }.into()),
            Some(id) if id != draft.tenant_id => {
                return Err(CoreError::TenantChanged { room_id }.into())
            }
            Some(_) => {}
        }

        let existing_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM invoices WHERE room_id = ?1 AND month = ?2")
                .bind(room_id)
                .bind(draft.month.to_string())
                .fetch_optional(&mut *tx)
                .await?;

        let invoice = match existing_id {
            Some(id) => {
                let current = fetch_by_id(&mut *tx, &id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Invoice", &id))?;
                if current.is_paid() {
                    return Err(CoreError::InvoiceAlreadyPaid(id).into());
                }

                let mut updated = Invoice::from_draft(draft, id, current.created_at);
                updated.notes = current.notes;
                self.update_amounts(&mut *tx, &updated).await?;
                debug!(invoice_id = %updated.id, "Republished existing invoice");
                updated
            }
            None => {
                let id = next_invoice_id(&mut *tx, BillingMonth::from_date(now.date_naive())).await?;
                let invoice = Invoice::from_draft(draft, id, now);
                insert_invoice(&mut *tx, &invoice).await?;
                invoice
            }
        };

        record_reading(&mut *tx, room_id, reading).await?;
        refresh_balance(&mut *tx, room_id).await?;

        tx.commit().await?;

        info!(
            invoice_id = %invoice.id,
            room_id,
            month = %invoice.month,
            total = %invoice.total_amount,
            "Invoice published"
        );
        Ok(invoice)
    }

    async fn update_amounts(&self, conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE invoices SET
                tenant_name = ?1, tenant_phone = ?2, rent_amount = ?3,
                electricity_usage = ?4, electricity_amount = ?5,
                water_usage = ?6, water_amount = ?7,
                other_fees = ?8, total_amount = ?9, due_date = ?10
            WHERE id = ?11
            "#,
        )
        .bind(&invoice.tenant_name)
        .bind(&invoice.tenant_phone)
        .bind(invoice.rent_amount.amount())
        .bind(invoice.electricity_usage)
        .bind(invoice.electricity_amount.amount())
        .bind(invoice.water_usage)
        .bind(invoice.water_amount.amount())
        .bind(invoice.other_fees.amount())
        .bind(invoice.total_amount.amount())
        .bind(invoice.due_date)
        .bind(&invoice.id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Records payment and refreshes the room's balance in one transaction.
    pub async fn mark_paid(&self, id: &str, paid_on: NaiveDate) -> DbResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        let mut invoice = fetch_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| DbError::from(CoreError::InvoiceNotFound(id.to_string())))?;
        invoice.mark_paid(paid_on)?;

        sqlx::query("UPDATE invoices SET paid_date = ?1 WHERE id = ?2")
            .bind(paid_on)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        refresh_balance(&mut *tx, invoice.room_id).await?;

        tx.commit().await?;
        info!(invoice_id = %id, %paid_on, "Invoice marked paid");
        Ok(invoice)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get(&self, id: &str) -> DbResult<Invoice> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(id.to_string()).into())
    }

    /// All invoices, newest first.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        let sql = format!("{} ORDER BY created_at DESC, id DESC", INVOICE_SELECT);
        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        debug!(count = rows.len(), "Loaded invoices");
        into_invoices(rows)
    }

    /// A room's invoices, latest billing month first.
    pub async fn list_for_room(&self, room_id: i64) -> DbResult<Vec<Invoice>> {
        self.history(room_id, u32::MAX).await
    }

    /// The `limit` most recent invoices of a room.
    pub async fn history(&self, room_id: i64, limit: u32) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "{} WHERE room_id = ?1 ORDER BY month DESC LIMIT ?2",
            INVOICE_SELECT
        );
        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(room_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        into_invoices(rows)
    }

    pub async fn find_for_month(&self, room_id: i64, month: BillingMonth) -> DbResult<Option<Invoice>> {
        let sql = format!("{} WHERE room_id = ?1 AND month = ?2", INVOICE_SELECT);
        sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(room_id)
            .bind(month.to_string())
            .fetch_optional(&self.pool)
            .await?
            .map(Invoice::try_from)
            .transpose()
    }

    pub async fn list_unpaid(&self) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "{} WHERE paid_date IS NULL ORDER BY due_date, id",
            INVOICE_SELECT
        );
        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        into_invoices(rows)
    }

    /// Raw insert of a complete record (seeding). Does not touch balances.
    pub async fn insert(&self, invoice: &Invoice) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_invoice(&mut *conn, invoice).await
    }

    /// Recomputes a room's status and debt from its unpaid invoices.
    pub async fn refresh_room_balance(&self, room_id: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        refresh_balance(&mut *conn, room_id).await?;
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::repository::testing::{building, occupied_room, setup};
    use chrono::TimeZone;
    use nhatro_core::draft::DraftBook;
    use nhatro_core::{PricingTemplate, RoomStatus, Tenant};

    fn may() -> BillingMonth {
        "2025-05".parse().unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
    }

    async fn seeded() -> Database {
        let db = setup().await;
        db.buildings().insert(&building("hagl3")).await.unwrap();
        db.rooms().insert(&occupied_room(1, "hagl3", "101")).await.unwrap();
        db
    }

    /// May draft for room 1: 120 kWh and 5 m³ on top of April's 1100 / 55.
    async fn ready_draft(db: &Database) -> (DraftInvoiceEntry, MeterReading) {
        let rooms = db.rooms().list().await.unwrap();
        let mut book = DraftBook::initialize(may(), &rooms, &PricingTemplate::default());
        book.set_electricity(1, Some(1220)).unwrap();
        book.set_water(1, Some(60)).unwrap();
        let draft = book.begin_publish(1).unwrap();
        let reading = MeterReading::next(may(), draft.baseline(), 1220, 60, now());
        (draft, reading)
    }

    #[tokio::test]
    async fn test_publish_creates_invoice_and_reading() {
        let db = seeded().await;
        let (draft, reading) = ready_draft(&db).await;

        let invoice = db.invoices().publish_draft(&draft, &reading, now()).await.unwrap();
        assert_eq!(invoice.id, "INV-2025060001");
        assert_eq!(invoice.month, may());
        assert_eq!(invoice.due_date, "2025-06-10".parse::<NaiveDate>().unwrap());
        // 5,000,000 + 120 × 3,500 + 5 × 15,000 + 230,000
        assert_eq!(invoice.total_amount, Dong::new(5_725_000));

        let room = db.rooms().get(1).await.unwrap();
        assert_eq!(room.meter_readings.len(), 2);
        assert_eq!(room.meter().baseline().electricity, 1220);
        assert_eq!(room.status, RoomStatus::Debt);
        assert_eq!(room.debt_amount, Some(Dong::new(5_725_000)));
    }

    #[tokio::test]
    async fn test_republish_updates_same_record() {
        let db = seeded().await;
        let (draft, reading) = ready_draft(&db).await;
        let first = db.invoices().publish_draft(&draft, &reading, now()).await.unwrap();

        // Corrected reading for the same month
        let rooms = db.rooms().list().await.unwrap();
        let mut book = DraftBook::initialize(may(), &rooms, &PricingTemplate::default());
        book.set_electricity(1, Some(1200)).unwrap();
        book.set_water(1, Some(60)).unwrap();
        let draft = book.begin_publish(1).unwrap();
        assert_eq!(draft.electricity_previous, 1100);
        let reading = MeterReading::next(may(), draft.baseline(), 1200, 60, now());

        let second = db.invoices().publish_draft(&draft, &reading, now()).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.electricity_usage, 100);
        assert_eq!(db.invoices().count().await.unwrap(), 1);
        assert_eq!(db.rooms().get(1).await.unwrap().meter_readings.len(), 2);
    }

    #[tokio::test]
    async fn test_publish_rejected_when_paid_or_tenant_changed() {
        let db = seeded().await;
        let (draft, reading) = ready_draft(&db).await;
        let invoice = db.invoices().publish_draft(&draft, &reading, now()).await.unwrap();
        db.invoices()
            .mark_paid(&invoice.id, "2025-06-05".parse().unwrap())
            .await
            .unwrap();

        assert!(matches!(
            db.invoices().publish_draft(&draft, &reading, now()).await,
            Err(DbError::Rule(CoreError::InvoiceAlreadyPaid(_)))
        ));

        let mut stale = draft.clone();
        stale.tenant_id = "someone-else".to_string();
        assert!(matches!(
            db.invoices().publish_draft(&stale, &reading, now()).await,
            Err(DbError::Rule(CoreError::TenantChanged { room_id: 1 }))
        ));
    }

    #[tokio::test]
    async fn test_failed_publish_leaves_no_trace() {
        let db = seeded().await;
        let (draft, mut reading) = ready_draft(&db).await;
        // Breaks carry-forward continuity
        reading.electricity_prev = 900;

        assert!(db.invoices().publish_draft(&draft, &reading, now()).await.is_err());
        assert_eq!(db.invoices().count().await.unwrap(), 0);
        let room = db.rooms().get(1).await.unwrap();
        assert_eq!(room.meter_readings.len(), 1);
        assert_eq!(room.status, RoomStatus::Paid);
    }

    #[tokio::test]
    async fn test_mark_paid_refreshes_balance() {
        let db = seeded().await;
        let (draft, reading) = ready_draft(&db).await;
        let invoice = db.invoices().publish_draft(&draft, &reading, now()).await.unwrap();

        let paid = db
            .invoices()
            .mark_paid(&invoice.id, "2025-06-12".parse().unwrap())
            .await
            .unwrap();
        assert!(paid.is_paid());

        let room = db.rooms().get(1).await.unwrap();
        assert_eq!(room.status, RoomStatus::Paid);
        assert_eq!(room.debt_amount, None);

        assert!(matches!(
            db.invoices().mark_paid(&invoice.id, "2025-06-13".parse().unwrap()).await,
            Err(DbError::Rule(CoreError::InvoiceAlreadyPaid(_)))
        ));
        assert!(matches!(
            db.invoices().mark_paid("INV-0000000000", "2025-06-13".parse().unwrap()).await,
            Err(DbError::Rule(CoreError::InvoiceNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_ids_follow_creation_month_sequence() {
        let db = setup().await;
        db.buildings().insert(&building("pha")).await.unwrap();
        db.rooms().insert(&occupied_room(1, "pha", "101")).await.unwrap();
        db.rooms().insert(&occupied_room(2, "pha", "102")).await.unwrap();

        let rooms = db.rooms().list().await.unwrap();
        let mut book = DraftBook::initialize(may(), &rooms, &PricingTemplate::default());
        book.use_previous_for_all();

        let mut ids = Vec::new();
        for room_id in book.ready_room_ids() {
            let draft = book.begin_publish(room_id).unwrap();
            let reading = MeterReading::next(may(), draft.baseline(), 1100, 55, now());
            ids.push(db.invoices().publish_draft(&draft, &reading, now()).await.unwrap().id);
        }
        assert_eq!(ids, vec!["INV-2025060001", "INV-2025060002"]);

        let history = db.invoices().history(1, 3).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(db.invoices().find_for_month(2, may()).await.unwrap().is_some());
        assert_eq!(db.invoices().list_unpaid().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_check_out_blocked_by_unpaid_invoice() {
        let db = seeded().await;
        let (draft, reading) = ready_draft(&db).await;
        let invoice = db.invoices().publish_draft(&draft, &reading, now()).await.unwrap();

        assert!(matches!(
            db.rooms().check_out(1).await,
            Err(DbError::Rule(CoreError::OutstandingInvoices { count: 1, .. }))
        ));

        db.invoices()
            .mark_paid(&invoice.id, "2025-06-03".parse().unwrap())
            .await
            .unwrap();
        let tenant: Tenant = db.rooms().check_out(1).await.unwrap();
        assert_eq!(tenant.id, draft.tenant_id);
    }
}
