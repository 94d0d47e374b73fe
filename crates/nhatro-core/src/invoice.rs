//! # Invoice Records
//!
//! Finalized invoices and the read-side rules over them.
//!
//! ## Derived Status
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Only `paid_date` is stored. Status is computed at read time:           │
//! │                                                                         │
//! │    paid_date set ─────────────────────────────────► Paid               │
//! │    paid_date unset, today >  due_date ────────────► Overdue            │
//! │    paid_date unset, today <= due_date ────────────► Pending            │
//! │                                                                         │
//! │  Pending → Overdue happens by the calendar, never by a write.           │
//! │  Pending/Overdue → Paid happens through `mark_paid`.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! `INV-YYYYMM####`: the month the invoice was created plus a per-month
//! sequence. One invoice per `(room_id, month)`.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::draft::DraftInvoiceEntry;
use crate::error::{CoreError, CoreResult};
use crate::money::Dong;
use crate::types::BillingMonth;
use crate::INVOICE_DUE_DAY;

// =============================================================================
// Invoice Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Paid,
    Pending,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    /// List position: overdue first, paid last.
    fn rank(&self) -> u8 {
        match self {
            InvoiceStatus::Overdue => 0,
            InvoiceStatus::Pending => 1,
            InvoiceStatus::Paid => 2,
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A finalized monthly invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    /// `INV-YYYYMM####`
    pub id: String,
    pub building_id: String,
    pub room_id: i64,
    pub room_number: String,
    pub tenant_name: String,
    pub tenant_phone: String,
    #[ts(as = "String")]
    pub month: BillingMonth,
    pub rent_amount: Dong,
    pub electricity_usage: i64,
    pub electricity_amount: Dong,
    pub water_usage: i64,
    pub water_amount: Dong,
    /// wifi + trash + parking.
    pub other_fees: Dong,
    pub total_amount: Dong,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub paid_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Invoice {
    /// Finalizes a ready draft.
    pub fn from_draft(draft: &DraftInvoiceEntry, id: String, created_at: DateTime<Utc>) -> Self {
        Invoice {
            id,
            building_id: draft.building_id.clone(),
            room_id: draft.room_id,
            room_number: draft.room_number.clone(),
            tenant_name: draft.tenant_name.clone(),
            tenant_phone: draft.tenant_phone.clone(),
            month: draft.month,
            rent_amount: draft.rent_amount,
            electricity_usage: draft.electricity_usage,
            electricity_amount: draft.electricity_amount,
            water_usage: draft.water_usage,
            water_amount: draft.water_amount,
            other_fees: draft.fees_total(),
            total_amount: draft.total_amount,
            due_date: draft.month.due_date(INVOICE_DUE_DAY),
            paid_date: None,
            created_at,
            notes: None,
        }
    }

    /// Status as of `today`.
    pub fn status(&self, today: NaiveDate) -> InvoiceStatus {
        match self.paid_date {
            Some(_) => InvoiceStatus::Paid,
            None if today > self.due_date => InvoiceStatus::Overdue,
            None => InvoiceStatus::Pending,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.paid_date.is_some()
    }

    /// Records payment. Works for pending and overdue invoices alike.
    pub fn mark_paid(&mut self, paid_on: NaiveDate) -> CoreResult<()> {
        if self.is_paid() {
            return Err(CoreError::InvoiceAlreadyPaid(self.id.clone()));
        }
        self.paid_date = Some(paid_on);
        Ok(())
    }
}

/// Builds an invoice id from the creation month and its sequence number.
///
/// ```rust
/// use nhatro_core::invoice::invoice_id;
/// use nhatro_core::BillingMonth;
///
/// let m: BillingMonth = "2025-07".parse().unwrap();
/// assert_eq!(invoice_id(m, 12), "INV-2025070012");
/// ```
pub fn invoice_id(created_in: BillingMonth, sequence: u32) -> String {
    format!("{}{:04}", invoice_id_prefix(created_in), sequence)
}

/// `INV-YYYYMM`, shared by every invoice created in that month.
pub fn invoice_id_prefix(created_in: BillingMonth) -> String {
    format!("INV-{}", created_in.compact())
}

/// Sorts for display: overdue, pending, paid; newest first within a group.
pub fn sort_for_display(invoices: &mut [Invoice], today: NaiveDate) {
    invoices.sort_by(|a, b| {
        match a.status(today).rank().cmp(&b.status(today).rank()) {
            Ordering::Equal => b.created_at.cmp(&a.created_at),
            other => other,
        }
    });
}

// =============================================================================
// Filtering
// =============================================================================

/// Invoice list filter. `None` means "all".
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub building_id: Option<String>,
    /// Calendar month of the billing period, 1..=12.
    pub month: Option<u32>,
    pub year: Option<i32>,
    /// Case-insensitive over id and tenant name, substring over room number.
    pub search: Option<String>,
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice, today: NaiveDate) -> bool {
        if let Some(status) = self.status {
            if invoice.status(today) != status {
                return false;
            }
        }
        if let Some(building) = &self.building_id {
            if &invoice.building_id != building {
                return false;
            }
        }
        if self.month.is_some_and(|m| invoice.month.month() != m) {
            return false;
        }
        if self.year.is_some_and(|y| invoice.month.year() != y) {
            return false;
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(needle) => {
                let lower = needle.to_lowercase();
                invoice.id.to_lowercase().contains(&lower)
                    || invoice.room_number.contains(needle)
                    || invoice.tenant_name.to_lowercase().contains(&lower)
            }
        }
    }

    /// Filters and orders a list for display.
    pub fn apply(&self, invoices: Vec<Invoice>, today: NaiveDate) -> Vec<Invoice> {
        let mut out: Vec<Invoice> = invoices
            .into_iter()
            .filter(|inv| self.matches(inv, today))
            .collect();
        sort_for_display(&mut out, today);
        out
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// Header figures for the invoice page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceSummary {
    pub total: usize,
    pub paid: usize,
    pub pending: usize,
    pub overdue: usize,
    pub total_amount: Dong,
    pub paid_amount: Dong,
}

impl InvoiceSummary {
    /// Aggregates over all invoices, or one building's.
    pub fn aggregate<'a, I>(invoices: I, building_id: Option<&str>, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Invoice>,
    {
        let mut summary = InvoiceSummary::default();

        for inv in invoices
            .into_iter()
            .filter(|inv| building_id.map_or(true, |b| inv.building_id == b))
        {
            summary.total += 1;
            summary.total_amount += inv.total_amount;
            match inv.status(today) {
                InvoiceStatus::Paid => {
                    summary.paid += 1;
                    summary.paid_amount += inv.total_amount;
                }
                InvoiceStatus::Pending => summary.pending += 1,
                InvoiceStatus::Overdue => summary.overdue += 1,
            }
        }

        summary
    }
}

/// Sum of unpaid totals.
pub fn outstanding_total<'a, I>(invoices: I) -> Dong
where
    I: IntoIterator<Item = &'a Invoice>,
{
    invoices
        .into_iter()
        .filter(|inv| !inv.is_paid())
        .map(|inv| inv.total_amount)
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn invoice(id: &str, room: &str, month: &str, total: i64) -> Invoice {
        let month: BillingMonth = month.parse().unwrap();
        Invoice {
            id: id.to_string(),
            building_id: "hagl3".to_string(),
            room_id: 1,
            room_number: room.to_string(),
            tenant_name: "Phạm Minh Đức".to_string(),
            tenant_phone: "0987654321".to_string(),
            month,
            rent_amount: Dong::new(5_000_000),
            electricity_usage: 0,
            electricity_amount: Dong::zero(),
            water_usage: 0,
            water_amount: Dong::zero(),
            other_fees: Dong::new(130_000),
            total_amount: Dong::new(total),
            due_date: month.due_date(INVOICE_DUE_DAY),
            paid_date: None,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
            notes: None,
        }
    }

    #[test]
    fn test_status_is_derived_from_dates() {
        let mut inv = invoice("INV-2025060001", "101", "2025-05", 5_000_000);
        assert_eq!(inv.due_date, date("2025-06-10"));

        assert_eq!(inv.status(date("2025-06-10")), InvoiceStatus::Pending);
        assert_eq!(inv.status(date("2025-06-11")), InvoiceStatus::Overdue);

        inv.mark_paid(date("2025-06-20")).unwrap();
        assert_eq!(inv.status(date("2025-06-11")), InvoiceStatus::Paid);
    }

    #[test]
    fn test_mark_paid_twice_is_rejected() {
        let mut inv = invoice("INV-2025060001", "101", "2025-05", 5_000_000);
        inv.mark_paid(date("2025-06-05")).unwrap();
        assert!(matches!(
            inv.mark_paid(date("2025-06-06")),
            Err(CoreError::InvoiceAlreadyPaid(_))
        ));
        assert_eq!(inv.paid_date, Some(date("2025-06-05")));
    }

    #[test]
    fn test_invoice_id_format() {
        let m: BillingMonth = "2025-01".parse().unwrap();
        assert_eq!(invoice_id(m, 1), "INV-2025010001");
        assert_eq!(invoice_id_prefix(m), "INV-202501");
    }

    #[test]
    fn test_display_order() {
        let today = date("2025-06-15");
        let overdue = invoice("A", "101", "2025-04", 1);
        let mut paid = invoice("B", "102", "2025-05", 1);
        paid.paid_date = Some(date("2025-06-02"));
        let mut pending_old = invoice("C", "103", "2025-06", 1);
        pending_old.created_at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut pending_new = invoice("D", "104", "2025-06", 1);
        pending_new.created_at = Utc.with_ymd_and_hms(2025, 6, 14, 0, 0, 0).unwrap();

        let mut list = vec![paid, pending_old, overdue, pending_new];
        sort_for_display(&mut list, today);
        let ids: Vec<&str> = list.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "D", "C", "B"]);
    }

    #[test]
    fn test_filter_search_and_period() {
        let today = date("2025-06-15");
        let invoices = vec![
            invoice("INV-2025060001", "305", "2025-05", 1),
            invoice("INV-2025050007", "101", "2025-04", 1),
        ];

        let by_id = InvoiceFilter {
            search: Some("inv-20250600".to_string()),
            ..Default::default()
        };
        assert_eq!(by_id.apply(invoices.clone(), today).len(), 1);

        let by_name = InvoiceFilter {
            search: Some("đức".to_string()),
            ..Default::default()
        };
        assert_eq!(by_name.apply(invoices.clone(), today).len(), 2);

        let by_period = InvoiceFilter {
            month: Some(4),
            year: Some(2025),
            ..Default::default()
        };
        let hits = by_period.apply(invoices.clone(), today);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].room_number, "101");

        let overdue = InvoiceFilter {
            status: Some(InvoiceStatus::Overdue),
            ..Default::default()
        };
        // April's invoice was due 2025-05-10
        assert_eq!(overdue.apply(invoices, today).len(), 1);
    }

    #[test]
    fn test_summary_aggregate() {
        let today = date("2025-06-15");
        let mut paid = invoice("A", "101", "2025-05", 3_000_000);
        paid.paid_date = Some(date("2025-06-03"));
        let pending = invoice("B", "102", "2025-05", 2_000_000);
        let overdue = invoice("C", "103", "2025-04", 1_000_000);
        let mut other = invoice("D", "201", "2025-05", 9_000_000);
        other.building_id = "pha".to_string();

        let all = vec![paid, pending, overdue, other];
        let s = InvoiceSummary::aggregate(&all, Some("hagl3"), today);
        assert_eq!(s.total, 3);
        assert_eq!(s.paid, 1);
        assert_eq!(s.pending, 1);
        assert_eq!(s.overdue, 1);
        assert_eq!(s.total_amount, Dong::new(6_000_000));
        assert_eq!(s.paid_amount, Dong::new(3_000_000));

        assert_eq!(InvoiceSummary::aggregate(&all, None, today).total, 4);
        assert_eq!(outstanding_total(&all), Dong::new(12_000_000));
    }
}
