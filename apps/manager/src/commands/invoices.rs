//! # Invoice Commands
//!
//! Invoice list and header figures, payment, reminders and the payment QR.
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  mark_invoice_paid(id)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  invoices().mark_paid(id, today)   one transaction:                     │
//! │       │                             paid_date set + room balance        │
//! │       │                             refreshed (paid / debt)             │
//! │       ▼                                                                 │
//! │  notifications().insert(payment_received)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  InvoiceDto { status: "paid" }                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Overdue is never stored: `status` is derived from `paid_date`,
//! `due_date` and today's date every time a DTO is built.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState, GatewayState};
use nhatro_core::invoice::{Invoice, InvoiceFilter, InvoiceStatus, InvoiceSummary};
use nhatro_core::messaging::share_text;
use nhatro_core::notification::Notification;
use nhatro_core::CoreError;
use nhatro_db::Database;
use nhatro_gateway::{DeliveryReceipt, PaymentQr};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
    pub id: String,
    pub building_id: String,
    pub room_id: i64,
    pub room_number: String,
    pub tenant_name: String,
    pub tenant_phone: String,
    /// `YYYY-MM`
    pub month: String,
    pub rent_amount: i64,
    pub electricity_usage: i64,
    pub electricity_amount: i64,
    pub water_usage: i64,
    pub water_amount: i64,
    pub other_fees: i64,
    pub total_amount: i64,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

impl InvoiceDto {
    pub fn from_invoice(inv: &Invoice, today: NaiveDate) -> Self {
        InvoiceDto {
            id: inv.id.clone(),
            building_id: inv.building_id.clone(),
            room_id: inv.room_id,
            room_number: inv.room_number.clone(),
            tenant_name: inv.tenant_name.clone(),
            tenant_phone: inv.tenant_phone.clone(),
            month: inv.month.to_string(),
            rent_amount: inv.rent_amount.amount(),
            electricity_usage: inv.electricity_usage,
            electricity_amount: inv.electricity_amount.amount(),
            water_usage: inv.water_usage,
            water_amount: inv.water_amount.amount(),
            other_fees: inv.other_fees.amount(),
            total_amount: inv.total_amount.amount(),
            due_date: inv.due_date,
            paid_date: inv.paid_date,
            status: inv.status(today),
            created_at: inv.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQrDto {
    pub image_url: String,
    pub memo: String,
    pub amount: i64,
    pub bank_id: String,
    pub account_number: String,
    pub account_name: String,
}

impl From<PaymentQr> for PaymentQrDto {
    fn from(qr: PaymentQr) -> Self {
        PaymentQrDto {
            image_url: qr.image_url(),
            memo: qr.memo().to_string(),
            amount: qr.amount.amount(),
            bank_id: qr.bank.bank_id,
            account_number: qr.bank.account_number,
            account_name: qr.bank.account_name,
        }
    }
}

fn to_dtos(invoices: &[Invoice], today: NaiveDate) -> Vec<InvoiceDto> {
    invoices.iter().map(|i| InvoiceDto::from_invoice(i, today)).collect()
}

/// Appends a feed entry. The feed is advisory, so a failure is only logged.
pub(crate) async fn notify(db: &Database, notification: Notification) {
    if let Err(e) = db.notifications().insert(&notification).await {
        warn!(title = %notification.title, error = %e, "Failed to record notification");
    }
}

pub(crate) async fn building_name(db: &Database, building_id: &str) -> String {
    match db.buildings().get(building_id).await {
        Ok(b) => b.name,
        Err(e) => {
            warn!(building_id, error = %e, "Building lookup failed");
            building_id.to_string()
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Filtered list: overdue first, then pending, then paid; newest first within each.
pub async fn list_invoices(
    db: &DbState,
    config: &ConfigState,
    filter: &InvoiceFilter,
) -> Result<Vec<InvoiceDto>, ApiError> {
    let today = config.today();
    let invoices = filter.apply(db.inner().invoices().list().await?, today);
    debug!(count = invoices.len(), "list_invoices command");
    Ok(to_dtos(&invoices, today))
}

pub async fn get_invoice_summary(
    db: &DbState,
    config: &ConfigState,
    building_id: Option<&str>,
) -> Result<InvoiceSummary, ApiError> {
    let invoices = db.inner().invoices().list().await?;
    Ok(InvoiceSummary::aggregate(&invoices, building_id, config.today()))
}

pub async fn get_invoice(db: &DbState, config: &ConfigState, invoice_id: &str) -> Result<InvoiceDto, ApiError> {
    let invoice = db.inner().invoices().get(invoice_id).await?;
    Ok(InvoiceDto::from_invoice(&invoice, config.today()))
}

/// All invoices of a room, newest month first.
pub async fn list_room_invoices(
    db: &DbState,
    config: &ConfigState,
    room_id: i64,
) -> Result<Vec<InvoiceDto>, ApiError> {
    db.inner().rooms().get(room_id).await?;
    let invoices = db.inner().invoices().list_for_room(room_id).await?;
    Ok(to_dtos(&invoices, config.today()))
}

// =============================================================================
// Payment & Delivery
// =============================================================================

pub async fn mark_invoice_paid(
    db: &DbState,
    config: &ConfigState,
    invoice_id: &str,
) -> Result<InvoiceDto, ApiError> {
    let today = config.today();
    let invoice = db.inner().invoices().mark_paid(invoice_id, today).await?;

    let building = building_name(db.inner(), &invoice.building_id).await;
    notify(db.inner(), Notification::payment_received(&invoice, &building, config.now())).await;

    info!(invoice_id, room = %invoice.room_number, amount = %invoice.total_amount, "Payment recorded");
    Ok(InvoiceDto::from_invoice(&invoice, today))
}

/// Re-sends the invoice notice over Zalo. No state changes.
pub async fn send_reminder(
    db: &DbState,
    gateway: &GatewayState,
    invoice_id: &str,
) -> Result<DeliveryReceipt, ApiError> {
    let invoice = db.inner().invoices().get(invoice_id).await?;
    if invoice.is_paid() {
        return Err(CoreError::InvoiceAlreadyPaid(invoice.id).into());
    }

    let receipt = gateway.inner().send_invoice(&invoice, &CancellationToken::new()).await?;
    info!(invoice_id, message_id = %receipt.message_id, "Reminder sent");
    Ok(receipt)
}

pub async fn get_payment_qr(
    db: &DbState,
    config: &ConfigState,
    invoice_id: &str,
) -> Result<PaymentQrDto, ApiError> {
    let invoice = db.inner().invoices().get(invoice_id).await?;
    Ok(PaymentQr::for_invoice(&invoice, &config.bank).into())
}

/// `"Hóa đơn <id> - P.<room> - <amount>"`
pub async fn get_share_text(db: &DbState, invoice_id: &str) -> Result<String, ApiError> {
    let invoice = db.inner().invoices().get(invoice_id).await?;
    Ok(share_text(&invoice))
}
