//! # Bulk Invoice Commands
//!
//! The monthly billing session: enter meter values for every occupied
//! room, then publish one row or every ready row.
//!
//! ## Publish Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    publish_single(room_id)                              │
//! │                                                                         │
//! │  DraftState lock ─────────────────────────────────────────────┐        │
//! │  │  1. begin_publish()        ready? else DRAFT_NOT_READY      │        │
//! │  │  2. MeterReading::next()   baseline → new values           │        │
//! │  │  3. invoices().publish_draft()   ONE transaction:          │        │
//! │  │       tenant unchanged? ── no ──► CONFLICT                 │        │
//! │  │       create-or-update invoice (room, month)               │        │
//! │  │       upsert the month's meter reading                     │        │
//! │  │       refresh room balance                                 │        │
//! │  │  4. mark_sent()            row locked                      │        │
//! │  └──────────────────────────────────────────────────────────────┘        │
//! │  5. notification "Đã gửi hóa đơn"                                       │
//! │  6. Zalo notice with retry/backoff                                      │
//! │       failure is reported in the outcome; the invoice stays             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Publish All
//! Ready rows are taken in session order and published one at a time, each
//! its own unit of work. A failed row does not stop the batch. Once the
//! batch token is cancelled, the rows not yet started are reported as
//! skipped and stay ready.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands::invoices::{building_name, notify, InvoiceDto};
use crate::error::{ApiError, ErrorCode};
use crate::state::{ConfigState, DbState, DraftState, GatewayState};
use nhatro_core::draft::{DraftBook, DraftInvoiceEntry, DraftStats, DraftStatus};
use nhatro_core::invoice::Invoice;
use nhatro_core::notification::Notification;
use nhatro_core::validation::validate_meter_value;
use nhatro_core::stats::{RoomFilter, RoomStatusFilter};
use nhatro_core::{BillingMonth, CoreError, MeterReading, ResolvedPricing, Room, WaterMode};
use nhatro_db::Database;
use nhatro_gateway::{Gateway, GatewayError};

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRowDto {
    pub room_id: i64,
    pub building_id: String,
    pub room_number: String,
    pub tenant_name: String,
    pub tenant_phone: String,
    pub electricity_previous: i64,
    pub electricity_new: Option<i64>,
    pub electricity_usage: i64,
    pub electricity_amount: i64,
    pub water_mode: WaterMode,
    pub water_previous: i64,
    pub water_new: Option<i64>,
    pub water_usage: i64,
    pub water_amount: i64,
    pub rent_amount: i64,
    pub fees_total: i64,
    pub total_amount: i64,
    pub status: DraftStatus,
}

impl From<&DraftInvoiceEntry> for DraftRowDto {
    fn from(e: &DraftInvoiceEntry) -> Self {
        DraftRowDto {
            room_id: e.room_id,
            building_id: e.building_id.clone(),
            room_number: e.room_number.clone(),
            tenant_name: e.tenant_name.clone(),
            tenant_phone: e.tenant_phone.clone(),
            electricity_previous: e.electricity_previous,
            electricity_new: e.electricity_new,
            electricity_usage: e.electricity_usage,
            electricity_amount: e.electricity_amount.amount(),
            water_mode: e.water_billing.mode(),
            water_previous: e.water_previous,
            water_new: e.water_new,
            water_usage: e.water_usage,
            water_amount: e.water_amount.amount(),
            rent_amount: e.rent_amount.amount(),
            fees_total: e.fees_total().amount(),
            total_amount: e.total_amount.amount(),
            status: e.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOverview {
    /// `YYYY-MM`
    pub month: String,
    /// Counts over the whole session, not just the filtered rows.
    pub stats: DraftStats,
    pub rows: Vec<DraftRowDto>,
    /// Rooms marked occupied but without a tenant; no draft was made.
    pub skipped_rooms: Vec<i64>,
}

impl DraftOverview {
    fn build(book: &DraftBook, building_id: Option<&str>, search: Option<&str>) -> Self {
        DraftOverview {
            month: book.month().to_string(),
            stats: book.stats(),
            rows: book
                .filter(building_id, search)
                .into_iter()
                .map(DraftRowDto::from)
                .collect(),
            skipped_rooms: book.skipped_rooms().to_vec(),
        }
    }
}

/// The detail sheet for one row: rates in effect and recent invoices.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftDetail {
    pub row: DraftRowDto,
    pub pricing: ResolvedPricing,
    pub history: Vec<InvoiceDto>,
}

/// What happened to the Zalo notice after the invoice was saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Delivery {
    Delivered {
        message_id: String,
        delivered_at: DateTime<Utc>,
    },
    Failed {
        reason: String,
    },
    Cancelled,
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    pub invoice: InvoiceDto,
    pub delivery: Delivery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PublishResult {
    Published {
        invoice_id: String,
        total_amount: i64,
        delivery: Delivery,
    },
    Failed {
        code: ErrorCode,
        message: String,
    },
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishItem {
    pub room_id: i64,
    pub room_number: String,
    #[serde(flatten)]
    pub result: PublishResult,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub items: Vec<PublishItem>,
}

impl PublishSummary {
    fn record(&mut self, room_id: i64, room_number: String, result: PublishResult) {
        match &result {
            PublishResult::Published { .. } => self.succeeded += 1,
            PublishResult::Failed { .. } => self.failed += 1,
            PublishResult::Skipped => self.skipped += 1,
        }
        self.items.push(PublishItem {
            room_id,
            room_number,
            result,
        });
    }
}

// =============================================================================
// Session
// =============================================================================

/// Starts a session for `month` with one pending row per occupied room
/// in the filtered set (building, then room number or tenant name).
/// Any previous session is discarded.
pub async fn initialize_drafts(
    db: &DbState,
    drafts: &DraftState,
    month: BillingMonth,
    building_id: Option<&str>,
    search: Option<&str>,
) -> Result<DraftOverview, ApiError> {
    let filter = RoomFilter {
        building_id: building_id.map(str::to_string),
        status: RoomStatusFilter::All,
        search: search.map(str::to_string),
    };
    let rooms: Vec<Room> = db
        .inner()
        .rooms()
        .list()
        .await?
        .into_iter()
        .filter(|r| filter.matches(r))
        .collect();
    let template = db.inner().settings().pricing_template().await?;

    let book = DraftBook::initialize(month, &rooms, &template);
    if !book.skipped_rooms().is_empty() {
        warn!(rooms = ?book.skipped_rooms(), "Rooms marked occupied have no tenant; no draft created");
    }
    let overview = DraftOverview::build(&book, None, None);
    info!(month = %month, rows = book.len(), ?building_id, "Draft session initialized");

    drafts.replace(book).await;
    Ok(overview)
}

pub async fn get_drafts(
    drafts: &DraftState,
    building_id: Option<&str>,
    search: Option<&str>,
) -> Result<DraftOverview, ApiError> {
    Ok(drafts
        .with_book(|book| Ok(DraftOverview::build(book, building_id, search)))
        .await?)
}

pub async fn get_draft_stats(drafts: &DraftState) -> Result<DraftStats, ApiError> {
    Ok(drafts.with_book(|book| Ok(book.stats())).await?)
}

pub async fn get_draft_detail(
    db: &DbState,
    drafts: &DraftState,
    config: &ConfigState,
    room_id: i64,
) -> Result<DraftDetail, ApiError> {
    let entry = drafts
        .with_book(|book| book.get(room_id).cloned().ok_or(CoreError::DraftNotFound { room_id }))
        .await?;
    let history = db.inner().invoices().history(room_id, config.history_limit).await?;

    let today = config.today();
    Ok(DraftDetail {
        row: DraftRowDto::from(&entry),
        pricing: entry.pricing,
        history: history.iter().map(|i| InvoiceDto::from_invoice(i, today)).collect(),
    })
}

/// `None` clears the value and puts the row back to pending.
pub async fn set_draft_electricity(
    drafts: &DraftState,
    room_id: i64,
    value: Option<i64>,
) -> Result<DraftRowDto, ApiError> {
    if let Some(v) = value {
        validate_meter_value("electricity", v)?;
    }
    let row = drafts
        .with_book(|book| book.set_electricity(room_id, value).map(DraftRowDto::from))
        .await?;
    debug!(room_id, ?value, status = row.status.as_str(), "Electricity entered");
    Ok(row)
}

/// Ignored for flat-water rows.
pub async fn set_draft_water(
    drafts: &DraftState,
    room_id: i64,
    value: Option<i64>,
) -> Result<DraftRowDto, ApiError> {
    if let Some(v) = value {
        validate_meter_value("water", v)?;
    }
    let row = drafts
        .with_book(|book| book.set_water(room_id, value).map(DraftRowDto::from))
        .await?;
    debug!(room_id, ?value, status = row.status.as_str(), "Water entered");
    Ok(row)
}

/// Fills every unsent row with its previous reading (zero usage).
pub async fn use_previous_for_all(drafts: &DraftState) -> Result<usize, ApiError> {
    let touched = drafts.with_book(|book| Ok(book.use_previous_for_all())).await?;
    info!(rows = touched, "Previous readings applied");
    Ok(touched)
}

// =============================================================================
// Publishing
// =============================================================================

/// Persists one ready row and locks it. The session lock is held until
/// the row is marked sent.
///
/// With `session` set, returns `Ok(None)` without touching anything when
/// the session has been replaced since that generation was read.
async fn persist_row(
    db: &Database,
    drafts: &DraftState,
    room_id: i64,
    now: DateTime<Utc>,
    session: Option<u64>,
) -> Result<Option<Invoice>, ApiError> {
    let mut guard = drafts.lock().await;
    if session.is_some_and(|g| g != guard.generation()) {
        return Ok(None);
    }
    let book = guard.book()?;

    let entry = book.begin_publish(room_id)?;
    let reading = MeterReading::next(
        entry.month,
        entry.baseline(),
        entry.electricity_new.unwrap_or(entry.electricity_previous),
        entry.water_new.unwrap_or(entry.water_previous),
        now,
    );

    let invoice = db.invoices().publish_draft(&entry, &reading, now).await?;
    book.mark_sent(room_id)?;
    Ok(Some(invoice))
}

/// Notification and Zalo delivery for a saved invoice.
async fn announce(
    db: &Database,
    gateway: &Gateway,
    invoice: &Invoice,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> Delivery {
    let building = building_name(db, &invoice.building_id).await;
    notify(db, Notification::invoice_published(invoice, &building, now)).await;

    match gateway.send_invoice(invoice, cancel).await {
        Ok(receipt) => Delivery::Delivered {
            message_id: receipt.message_id,
            delivered_at: receipt.delivered_at,
        },
        Err(GatewayError::Cancelled) => Delivery::Cancelled,
        Err(e) => {
            warn!(invoice_id = %invoice.id, error = %e, "Invoice saved but Zalo delivery failed");
            Delivery::Failed { reason: e.to_string() }
        }
    }
}

pub async fn publish_single(
    db: &DbState,
    drafts: &DraftState,
    gateway: &GatewayState,
    config: &ConfigState,
    room_id: i64,
) -> Result<PublishOutcome, ApiError> {
    let now = config.now();
    let invoice = persist_row(db.inner(), drafts, room_id, now, None)
        .await?
        .ok_or(CoreError::DraftsNotInitialized)?;
    let delivery = announce(db.inner(), gateway.inner(), &invoice, now, &CancellationToken::new()).await;

    Ok(PublishOutcome {
        invoice: InvoiceDto::from_invoice(&invoice, config.today()),
        delivery,
    })
}

/// Publishes every ready row. Cancel with [`cancel_publish`].
pub async fn publish_all(
    db: &DbState,
    drafts: &DraftState,
    gateway: &GatewayState,
    config: &ConfigState,
) -> Result<PublishSummary, ApiError> {
    let batch = gateway.begin_batch();
    let result = publish_ready(db, drafts, gateway.inner(), config, &batch.token).await;
    gateway.end_batch(&batch);
    result
}

/// Stops the running publish-all after the row in flight.
pub fn cancel_publish(gateway: &GatewayState) -> bool {
    gateway.cancel_batch()
}

/// The publish-all loop, driven by an explicit token.
pub async fn publish_ready(
    db: &DbState,
    drafts: &DraftState,
    gateway: &Gateway,
    config: &ConfigState,
    cancel: &CancellationToken,
) -> Result<PublishSummary, ApiError> {
    let (session, ready) = {
        let mut guard = drafts.lock().await;
        let session = guard.generation();
        let book = guard.book()?;
        let rows: Vec<(i64, String)> = book
            .ready_room_ids()
            .into_iter()
            .filter_map(|id| book.get(id).map(|e| (id, e.room_number.clone())))
            .collect();
        if rows.is_empty() {
            return Err(CoreError::NothingToPublish.into());
        }
        (session, rows)
    };

    info!(rows = ready.len(), "Publishing ready drafts");
    let mut summary = PublishSummary::default();
    let mut replaced = false;

    for (room_id, room_number) in ready {
        if replaced || cancel.is_cancelled() {
            summary.record(room_id, room_number, PublishResult::Skipped);
            continue;
        }

        let now = config.now();
        let result = match persist_row(db.inner(), drafts, room_id, now, Some(session)).await {
            Ok(Some(invoice)) => {
                let delivery = announce(db.inner(), gateway, &invoice, now, cancel).await;
                PublishResult::Published {
                    invoice_id: invoice.id,
                    total_amount: invoice.total_amount.amount(),
                    delivery,
                }
            }
            Ok(None) => {
                warn!(room_id, "Draft session replaced mid-batch; remaining rows skipped");
                replaced = true;
                PublishResult::Skipped
            }
            Err(e) => {
                warn!(room_id, code = ?e.code, error = %e.message, "Draft not published");
                PublishResult::Failed {
                    code: e.code,
                    message: e.message,
                }
            }
        };
        summary.record(room_id, room_number, result);
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        "Publish batch finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{fixture, Fixture};
    use crate::commands::tenants::{check_in, check_out, TenantForm};
    use async_trait::async_trait;
    use nhatro_core::notification::NotificationKind;
    use nhatro_core::{Room, RoomStatus};
    use nhatro_gateway::{
        DeliveryReceipt, GatewayConfig, GatewayResult, Messenger, OutgoingMessage, RetryPolicy,
        SimulatedImageStore, SimulatedZalo,
    };
    use std::sync::Arc;

    fn may() -> BillingMonth {
        "2025-05".parse().unwrap()
    }

    async fn start(fx: &Fixture) -> DraftOverview {
        initialize_drafts(&fx.db, &fx.drafts, may(), None, None).await.unwrap()
    }

    /// Enters `+80 kWh` and `+4 m³` over the baseline for the row.
    async fn make_ready(fx: &Fixture, room_id: i64) -> DraftRowDto {
        let row = get_drafts(&fx.drafts, None, None)
            .await
            .unwrap()
            .rows
            .into_iter()
            .find(|r| r.room_id == room_id)
            .unwrap();
        set_draft_electricity(&fx.drafts, room_id, Some(row.electricity_previous + 80))
            .await
            .unwrap();
        set_draft_water(&fx.drafts, room_id, Some(row.water_previous + 4))
            .await
            .unwrap()
    }

    async fn invoices_for_may(fx: &Fixture) -> Vec<Invoice> {
        fx.db
            .inner()
            .invoices()
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|i| i.month == may())
            .collect()
    }

    #[tokio::test]
    async fn test_initialize_one_pending_row_per_occupied_room() {
        let fx = fixture().await;
        let overview = start(&fx).await;
        let occupied = fx.db.inner().rooms().list_occupied().await.unwrap();

        assert_eq!(overview.month, "2025-05");
        assert_eq!(overview.rows.len(), occupied.len());
        assert_eq!(overview.stats.pending, occupied.len());
        assert_eq!(overview.stats.total_amount.amount(), 0);

        for (row, room) in overview.rows.iter().zip(&occupied) {
            assert_eq!(row.room_id, room.id);
            let baseline = room.meter().baseline_for(may());
            assert_eq!(row.electricity_previous, baseline.electricity);
            assert_eq!(row.water_previous, baseline.water);
        }
    }

    #[tokio::test]
    async fn test_initialize_limited_to_filtered_rooms() {
        let fx = fixture().await;
        let occupied = fx.db.inner().rooms().list_occupied().await.unwrap();
        let building = occupied[0].building_id.clone();
        let in_building: Vec<i64> = occupied
            .iter()
            .filter(|r| r.building_id == building)
            .map(|r| r.id)
            .collect();
        assert!(in_building.len() < occupied.len());

        let overview = initialize_drafts(&fx.db, &fx.drafts, may(), Some(&building), None)
            .await
            .unwrap();
        assert_eq!(overview.rows.iter().map(|r| r.room_id).collect::<Vec<_>>(), in_building);
        assert_eq!(overview.stats.total, in_building.len());

        // Search narrows further, by room number or tenant name
        let target = &occupied[0];
        let tenant = target.tenant.as_ref().unwrap().name.clone();
        let overview = initialize_drafts(&fx.db, &fx.drafts, may(), Some(&building), Some(&tenant))
            .await
            .unwrap();
        assert!(overview.rows.iter().any(|r| r.room_id == target.id));
        assert!(overview.rows.iter().all(|r| r.building_id == building));

        let none = initialize_drafts(&fx.db, &fx.drafts, may(), Some("no-such-building"), None)
            .await
            .unwrap();
        assert!(none.rows.is_empty());
        assert!(none.skipped_rooms.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_reading_is_a_validation_error() {
        let fx = fixture().await;
        let overview = start(&fx).await;
        let room_id = overview.rows[0].room_id;

        let err = set_draft_electricity(&fx.drafts, room_id, Some(i64::MAX / 1_000))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let row = get_draft_detail(&fx.db, &fx.drafts, &fx.config, room_id).await.unwrap().row;
        assert_eq!(row.electricity_new, None);
    }

    #[tokio::test]
    async fn test_edits_require_a_session() {
        let fx = fixture().await;
        let err = set_draft_electricity(&fx.drafts, 1, Some(10)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_entering_values_makes_row_ready() {
        let fx = fixture().await;
        let overview = start(&fx).await;
        let metered = overview.rows.iter().find(|r| r.water_mode == WaterMode::Metered).unwrap();

        let row = set_draft_electricity(&fx.drafts, metered.room_id, Some(metered.electricity_previous + 100))
            .await
            .unwrap();
        assert_eq!(row.status, DraftStatus::Pending);
        assert_eq!(row.electricity_usage, 100);

        let row = make_ready(&fx, metered.room_id).await;
        assert_eq!(row.status, DraftStatus::Ready);
        assert_eq!(
            row.total_amount,
            row.rent_amount + row.electricity_amount + row.water_amount + row.fees_total
        );

        let err = set_draft_water(&fx.drafts, metered.room_id, Some(-5)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let cleared = set_draft_electricity(&fx.drafts, metered.room_id, None).await.unwrap();
        assert_eq!(cleared.status, DraftStatus::Pending);
    }

    #[tokio::test]
    async fn test_use_previous_for_all() {
        let fx = fixture().await;
        let overview = start(&fx).await;

        let touched = use_previous_for_all(&fx.drafts).await.unwrap();
        assert_eq!(touched, overview.rows.len());

        let stats = get_draft_stats(&fx.drafts).await.unwrap();
        assert_eq!(stats.ready, stats.total);
        assert_eq!(stats.pending, 0);
    }

    #[tokio::test]
    async fn test_publish_single_persists_and_locks() {
        let fx = fixture().await;
        let overview = start(&fx).await;
        let room_id = overview.rows[0].room_id;
        let row = make_ready(&fx, room_id).await;

        let outcome = publish_single(&fx.db, &fx.drafts, &fx.gateway, &fx.config, room_id)
            .await
            .unwrap();
        assert!(outcome.delivery.is_delivered());
        assert_eq!(outcome.invoice.month, "2025-05");
        assert_eq!(outcome.invoice.total_amount, row.total_amount);
        assert_eq!(outcome.invoice.due_date.to_string(), "2025-06-10");
        assert!(outcome.invoice.id.starts_with("INV-202506"));

        // Reading appended, room now owes the invoice
        let room: Room = fx.db.inner().rooms().get(room_id).await.unwrap();
        let reading = room.meter().last().unwrap();
        assert_eq!(reading.month, may());
        assert_eq!(reading.electricity_usage(), 80);
        assert_eq!(room.status, RoomStatus::Debt);

        let detail = get_draft_detail(&fx.db, &fx.drafts, &fx.config, room_id).await.unwrap();
        assert_eq!(detail.row.status, DraftStatus::Sent);
        assert_eq!(detail.history[0].id, outcome.invoice.id);

        let again = publish_single(&fx.db, &fx.drafts, &fx.gateway, &fx.config, room_id)
            .await
            .unwrap_err();
        assert_eq!(again.code, ErrorCode::BusinessLogic);
        let locked = set_draft_electricity(&fx.drafts, room_id, Some(1)).await.unwrap_err();
        assert_eq!(locked.code, ErrorCode::BusinessLogic);

        let feed = fx.db.inner().notifications().list().await.unwrap();
        assert!(feed.iter().any(|n| n.kind == NotificationKind::Invoice && n.title == "Đã gửi hóa đơn"));
    }

    #[tokio::test]
    async fn test_publish_pending_row_is_rejected_without_writes() {
        let fx = fixture().await;
        let overview = start(&fx).await;

        let err = publish_single(&fx.db, &fx.drafts, &fx.gateway, &fx.config, overview.rows[0].room_id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert!(invoices_for_may(&fx).await.is_empty());
    }

    #[tokio::test]
    async fn test_republish_updates_the_same_invoice() {
        let fx = fixture().await;
        let overview = start(&fx).await;
        let room_id = overview.rows[0].room_id;

        make_ready(&fx, room_id).await;
        let first = publish_single(&fx.db, &fx.drafts, &fx.gateway, &fx.config, room_id)
            .await
            .unwrap();

        // A new session for the same month bills against the same baseline
        start(&fx).await;
        let row = make_ready(&fx, room_id).await;
        set_draft_electricity(&fx.drafts, room_id, Some(row.electricity_previous + 150))
            .await
            .unwrap();
        let second = publish_single(&fx.db, &fx.drafts, &fx.gateway, &fx.config, room_id)
            .await
            .unwrap();

        assert_eq!(second.invoice.id, first.invoice.id);
        assert_eq!(second.invoice.electricity_usage, 150);
        let mine: Vec<Invoice> = invoices_for_may(&fx).await.into_iter().filter(|i| i.room_id == room_id).collect();
        assert_eq!(mine.len(), 1);
    }

    #[tokio::test]
    async fn test_tenant_change_blocks_publish() {
        let fx = fixture().await;
        let overview = start(&fx).await;
        let paid_room = fx
            .db
            .inner()
            .rooms()
            .list_occupied()
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.status == RoomStatus::Paid)
            .unwrap();
        assert!(overview.rows.iter().any(|r| r.room_id == paid_room.id));
        make_ready(&fx, paid_room.id).await;

        check_out(&fx.db, paid_room.id).await.unwrap();
        check_in(
            &fx.db,
            paid_room.id,
            TenantForm {
                name: "Đỗ Thị Lan".into(),
                phone: "0976543210".into(),
                id_number: "001199012345".into(),
                move_in_date: fx.config.today(),
                deposit: 0,
                notes: None,
            },
        )
        .await
        .unwrap();

        let err = publish_single(&fx.db, &fx.drafts, &fx.gateway, &fx.config, paid_room.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert!(invoices_for_may(&fx).await.is_empty());

        let row = get_draft_detail(&fx.db, &fx.drafts, &fx.config, paid_room.id).await.unwrap().row;
        assert_eq!(row.status, DraftStatus::Ready);
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_invoice() {
        let mut fx = fixture().await;
        let failing = GatewayConfig {
            failure_rate: 1.0,
            retry: RetryPolicy::none(),
            ..GatewayConfig::instant()
        };
        fx.gateway = GatewayState::new(Gateway::simulated(failing, Some(3)));

        let overview = start(&fx).await;
        let room_id = overview.rows[0].room_id;
        make_ready(&fx, room_id).await;

        let outcome = publish_single(&fx.db, &fx.drafts, &fx.gateway, &fx.config, room_id)
            .await
            .unwrap();
        assert!(matches!(outcome.delivery, Delivery::Failed { .. }));
        assert_eq!(invoices_for_may(&fx).await.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_all_with_nothing_ready() {
        let fx = fixture().await;
        start(&fx).await;

        let err = publish_all(&fx.db, &fx.drafts, &fx.gateway, &fx.config).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(invoices_for_may(&fx).await.is_empty());
    }

    #[tokio::test]
    async fn test_publish_all_sends_only_ready_rows() {
        let fx = fixture().await;
        let overview = start(&fx).await;
        let chosen: Vec<i64> = overview.rows.iter().take(3).map(|r| r.room_id).collect();
        for &id in &chosen {
            make_ready(&fx, id).await;
        }

        let summary = publish_all(&fx.db, &fx.drafts, &fx.gateway, &fx.config).await.unwrap();
        assert_eq!((summary.succeeded, summary.failed, summary.skipped), (3, 0, 0));
        assert_eq!(summary.items.iter().map(|i| i.room_id).collect::<Vec<_>>(), chosen);

        let stats = get_draft_stats(&fx.drafts).await.unwrap();
        assert_eq!(stats.sent, 3);
        assert_eq!(stats.pending, overview.rows.len() - 3);
        assert_eq!(invoices_for_may(&fx).await.len(), 3);
        assert!(!cancel_publish(&fx.gateway));
    }

    #[tokio::test]
    async fn test_cancelled_batch_skips_everything() {
        let fx = fixture().await;
        start(&fx).await;
        use_previous_for_all(&fx.drafts).await.unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let summary = publish_ready(&fx.db, &fx.drafts, fx.gateway.inner(), &fx.config, &token)
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.skipped, summary.items.len());
        assert!(invoices_for_may(&fx).await.is_empty());
        let stats = get_draft_stats(&fx.drafts).await.unwrap();
        assert_eq!(stats.ready, stats.total);
    }

    /// Delivers, then cancels the batch it belongs to.
    struct CancelAfterFirst {
        inner: SimulatedZalo,
        token: CancellationToken,
    }

    #[async_trait]
    impl Messenger for CancelAfterFirst {
        async fn send(&self, message: &OutgoingMessage) -> GatewayResult<DeliveryReceipt> {
            let receipt = self.inner.send(message).await;
            self.token.cancel();
            receipt
        }
    }

    #[tokio::test]
    async fn test_cancel_mid_batch_leaves_rest_ready() {
        let fx = fixture().await;
        let overview = start(&fx).await;
        for row in overview.rows.iter().take(4) {
            make_ready(&fx, row.room_id).await;
        }

        let token = CancellationToken::new();
        let config = GatewayConfig::instant();
        let gateway = Gateway::new(
            config.clone(),
            Arc::new(CancelAfterFirst {
                inner: SimulatedZalo::new(&config, Some(1)),
                token: token.clone(),
            }),
            Arc::new(SimulatedImageStore::new(&config, Some(2))),
        );

        let summary = publish_ready(&fx.db, &fx.drafts, &gateway, &fx.config, &token)
            .await
            .unwrap();

        assert_eq!((summary.succeeded, summary.skipped), (1, 3));
        assert!(matches!(
            &summary.items[0].result,
            PublishResult::Published { delivery, .. } if delivery.is_delivered()
        ));
        assert!(summary.items[1..].iter().all(|i| i.result == PublishResult::Skipped));

        let stats = get_draft_stats(&fx.drafts).await.unwrap();
        assert_eq!((stats.sent, stats.ready), (1, 3));
        assert_eq!(invoices_for_may(&fx).await.len(), 1);
    }

    /// Delivers, then starts a fresh June session with every row ready.
    struct ReinitializeAfterFirst {
        inner: SimulatedZalo,
        drafts: DraftState,
        rooms: Vec<Room>,
    }

    #[async_trait]
    impl Messenger for ReinitializeAfterFirst {
        async fn send(&self, message: &OutgoingMessage) -> GatewayResult<DeliveryReceipt> {
            let receipt = self.inner.send(message).await;
            let june: BillingMonth = "2025-06".parse().unwrap();
            let mut book = DraftBook::initialize(june, &self.rooms, &nhatro_core::PricingTemplate::default());
            book.use_previous_for_all();
            self.drafts.replace(book).await;
            receipt
        }
    }

    #[tokio::test]
    async fn test_replaced_session_stops_running_batch() {
        let fx = fixture().await;
        let overview = start(&fx).await;
        for row in overview.rows.iter().take(3) {
            make_ready(&fx, row.room_id).await;
        }

        let june: BillingMonth = "2025-06".parse().unwrap();
        let june_invoices = |all: Vec<Invoice>| all.into_iter().filter(|i| i.month == june).count();
        let june_before = june_invoices(fx.db.inner().invoices().list().await.unwrap());

        let config = GatewayConfig::instant();
        let gateway = Gateway::new(
            config.clone(),
            Arc::new(ReinitializeAfterFirst {
                inner: SimulatedZalo::new(&config, Some(1)),
                drafts: fx.drafts.clone(),
                rooms: fx.db.inner().rooms().list_occupied().await.unwrap(),
            }),
            Arc::new(SimulatedImageStore::new(&config, Some(2))),
        );

        let summary = publish_ready(&fx.db, &fx.drafts, &gateway, &fx.config, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!((summary.succeeded, summary.failed, summary.skipped), (1, 0, 2));

        // Nothing from the new session went out
        let stats = get_draft_stats(&fx.drafts).await.unwrap();
        assert_eq!(stats.sent, 0);
        assert_eq!(stats.ready, stats.total);
        assert_eq!(june_invoices(fx.db.inner().invoices().list().await.unwrap()), june_before);
        assert_eq!(invoices_for_may(&fx).await.len(), 1);
    }
}
