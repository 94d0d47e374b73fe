//! # Draft Invoice Lifecycle
//!
//! The working set of a bulk-invoice session: one editable draft per
//! occupied room for a billing month.
//!
//! ## State Machine
//! ```text
//!                   set_electricity / set_water / use_previous_for_all
//!                 ┌───────────────────────────────┐
//!                 │                               ▼
//!          ┌─────────────┐   inputs complete  ┌─────────────┐  publish   ┌─────────────┐
//! init ──► │   Pending   │ ─────────────────► │    Ready    │ ─────────► │    Sent     │
//!          └─────────────┘ ◄───────────────── └─────────────┘            └─────────────┘
//!                            input cleared                                  terminal,
//!                                                                           immutable
//!
//! ready ⇔ electricity entered ∧ (water flat ∨ water entered)
//! ```
//!
//! ## Ownership
//! A [`DraftBook`] is never persisted. Publishing hands a snapshot of one
//! entry to the repository layer, which turns it into an invoice record;
//! only then is the entry marked sent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::calculator::{compute_invoice, CalculationInput};
use crate::error::{CoreError, CoreResult};
use crate::meter::Baseline;
use crate::money::Dong;
use crate::pricing::{PricingTemplate, ResolvedPricing};
use crate::types::{BillingMonth, Room, RoomStatus, WaterBilling};
use crate::validation::validate_meter_value;

// =============================================================================
// Draft Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Pending,
    Ready,
    Sent,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Pending => "pending",
            DraftStatus::Ready => "ready",
            DraftStatus::Sent => "sent",
        }
    }
}

// =============================================================================
// Draft Entry
// =============================================================================

/// One room's draft invoice.
///
/// Tenant fields are a snapshot taken at initialization; publishing checks
/// `tenant_id` against the room's current occupant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DraftInvoiceEntry {
    pub room_id: i64,
    pub building_id: String,
    pub room_number: String,
    pub tenant_id: String,
    pub tenant_name: String,
    pub tenant_phone: String,
    #[ts(as = "String")]
    pub month: BillingMonth,

    pub electricity_previous: i64,
    pub electricity_new: Option<i64>,
    pub electricity_usage: i64,
    pub electricity_amount: Dong,

    pub water_previous: i64,
    pub water_new: Option<i64>,
    pub water_usage: i64,
    pub water_amount: Dong,
    pub water_billing: WaterBilling,

    pub rent_amount: Dong,
    pub pricing: ResolvedPricing,
    pub total_amount: Dong,
    pub status: DraftStatus,
}

impl DraftInvoiceEntry {
    /// Seeds a pending draft for an occupied room.
    pub fn for_room(room: &Room, month: BillingMonth, template: &PricingTemplate) -> CoreResult<Self> {
        let tenant = room.occupant()?;
        let baseline = room.meter().baseline_for(month);

        let mut entry = DraftInvoiceEntry {
            room_id: room.id,
            building_id: room.building_id.clone(),
            room_number: room.room_number.clone(),
            tenant_id: tenant.id.clone(),
            tenant_name: tenant.name.clone(),
            tenant_phone: tenant.phone.clone(),
            month,
            electricity_previous: baseline.electricity,
            electricity_new: None,
            electricity_usage: 0,
            electricity_amount: Dong::zero(),
            water_previous: baseline.water,
            water_new: None,
            water_usage: 0,
            water_amount: Dong::zero(),
            water_billing: room.water_billing,
            rent_amount: room.monthly_rent,
            pricing: room.pricing(template),
            total_amount: Dong::zero(),
            status: DraftStatus::Pending,
        };

        // Flat rooms have nothing to read for water; show their total up front.
        if entry.water_billing.is_flat() {
            entry.water_new = Some(baseline.water);
            entry.apply_computation();
        }

        Ok(entry)
    }

    pub fn baseline(&self) -> Baseline {
        Baseline {
            electricity: self.electricity_previous,
            water: self.water_previous,
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == DraftStatus::Sent
    }

    /// wifi + trash + parking.
    pub fn fees_total(&self) -> Dong {
        self.pricing.fees_total()
    }

    fn inputs_complete(&self) -> bool {
        self.electricity_new.is_some() && (self.water_billing.is_flat() || self.water_new.is_some())
    }

    fn apply_computation(&mut self) {
        let result = compute_invoice(&CalculationInput {
            baseline: self.baseline(),
            pricing: &self.pricing,
            new_electricity: self.electricity_new,
            new_water: self.water_new,
            water_billing: self.water_billing,
            monthly_rent: self.rent_amount,
        });

        self.electricity_usage = result.electricity_usage;
        self.electricity_amount = result.electricity_amount;
        self.water_usage = result.water_usage;
        self.water_amount = result.water_amount;
        self.total_amount = result.total;
    }

    /// Recomputes amounts and status. Sent entries are left untouched.
    fn recompute(&mut self) {
        if self.is_sent() {
            return;
        }
        self.apply_computation();
        self.status = if self.inputs_complete() {
            DraftStatus::Ready
        } else {
            DraftStatus::Pending
        };
    }
}

// =============================================================================
// Draft Book
// =============================================================================

/// Counts for the bulk-invoice header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DraftStats {
    pub total: usize,
    pub pending: usize,
    pub ready: usize,
    pub sent: usize,
    /// Sum over ready and sent entries only.
    pub total_amount: Dong,
}

/// Ordered draft session for one billing month.
///
/// Entries keep the room iteration order used at initialization; an index
/// by room id makes single-row edits O(1).
#[derive(Debug, Clone)]
pub struct DraftBook {
    month: BillingMonth,
    entries: Vec<DraftInvoiceEntry>,
    index: HashMap<i64, usize>,
    skipped: Vec<i64>,
}

impl DraftBook {
    /// Builds one pending draft per occupied room, in the given order.
    ///
    /// Empty rooms are left out. A room whose status says occupied but
    /// which has no tenant cannot be billed; its id is kept in
    /// [`DraftBook::skipped_rooms`] instead of a row.
    pub fn initialize<'a, I>(month: BillingMonth, rooms: I, template: &PricingTemplate) -> Self
    where
        I: IntoIterator<Item = &'a Room>,
    {
        let mut entries = Vec::new();
        let mut index = HashMap::new();
        let mut skipped = Vec::new();

        for room in rooms {
            if index.contains_key(&room.id) || skipped.contains(&room.id) {
                continue;
            }
            if room.status == RoomStatus::Empty && !room.is_occupied() {
                continue;
            }
            match DraftInvoiceEntry::for_room(room, month, template) {
                Ok(entry) => {
                    index.insert(room.id, entries.len());
                    entries.push(entry);
                }
                Err(_) => skipped.push(room.id),
            }
        }

        DraftBook {
            month,
            entries,
            index,
            skipped,
        }
    }

    pub fn month(&self) -> BillingMonth {
        self.month
    }

    /// Rooms marked occupied without a tenant, in input order.
    pub fn skipped_rooms(&self) -> &[i64] {
        &self.skipped
    }

    pub fn entries(&self) -> &[DraftInvoiceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, room_id: i64) -> Option<&DraftInvoiceEntry> {
        self.index.get(&room_id).map(|&i| &self.entries[i])
    }

    fn editable(&mut self, room_id: i64) -> CoreResult<&mut DraftInvoiceEntry> {
        let i = *self
            .index
            .get(&room_id)
            .ok_or(CoreError::DraftNotFound { room_id })?;
        let entry = &mut self.entries[i];
        if entry.is_sent() {
            return Err(CoreError::DraftLocked { room_id });
        }
        Ok(entry)
    }

    /// Sets (or clears) the new electricity reading for one row.
    pub fn set_electricity(&mut self, room_id: i64, value: Option<i64>) -> CoreResult<&DraftInvoiceEntry> {
        if let Some(v) = value {
            validate_meter_value("electricity", v)?;
        }
        let entry = self.editable(room_id)?;
        entry.electricity_new = value;
        entry.recompute();
        Ok(&*entry)
    }

    /// Sets (or clears) the new water reading. No-op on flat-water rows.
    pub fn set_water(&mut self, room_id: i64, value: Option<i64>) -> CoreResult<&DraftInvoiceEntry> {
        if let Some(v) = value {
            validate_meter_value("water", v)?;
        }
        let entry = self.editable(room_id)?;
        if !entry.water_billing.is_flat() {
            entry.water_new = value;
            entry.recompute();
        }
        Ok(&*entry)
    }

    /// Fills every unsent row with its previous readings (zero consumption).
    ///
    /// Returns the number of rows touched.
    pub fn use_previous_for_all(&mut self) -> usize {
        let mut touched = 0;
        for entry in self.entries.iter_mut().filter(|e| !e.is_sent()) {
            entry.electricity_new = Some(entry.electricity_previous);
            entry.water_new = Some(entry.water_previous);
            entry.recompute();
            touched += 1;
        }
        touched
    }

    /// Returns the snapshot to persist for a ready row.
    pub fn begin_publish(&self, room_id: i64) -> CoreResult<DraftInvoiceEntry> {
        let entry = self.get(room_id).ok_or(CoreError::DraftNotFound { room_id })?;
        match entry.status {
            DraftStatus::Ready => Ok(entry.clone()),
            DraftStatus::Sent => Err(CoreError::DraftLocked { room_id }),
            DraftStatus::Pending => Err(CoreError::DraftNotReady {
                room_id,
                status: entry.status.as_str().to_string(),
            }),
        }
    }

    /// Terminal transition once the invoice record exists.
    pub fn mark_sent(&mut self, room_id: i64) -> CoreResult<()> {
        let i = *self
            .index
            .get(&room_id)
            .ok_or(CoreError::DraftNotFound { room_id })?;
        let entry = &mut self.entries[i];
        match entry.status {
            DraftStatus::Ready => {
                entry.status = DraftStatus::Sent;
                Ok(())
            }
            DraftStatus::Sent => Err(CoreError::DraftLocked { room_id }),
            DraftStatus::Pending => Err(CoreError::DraftNotReady {
                room_id,
                status: entry.status.as_str().to_string(),
            }),
        }
    }

    /// Ready rows in insertion order.
    pub fn ready_room_ids(&self) -> Vec<i64> {
        self.entries
            .iter()
            .filter(|e| e.status == DraftStatus::Ready)
            .map(|e| e.room_id)
            .collect()
    }

    pub fn stats(&self) -> DraftStats {
        let mut stats = DraftStats {
            total: self.entries.len(),
            ..Default::default()
        };
        for entry in &self.entries {
            match entry.status {
                DraftStatus::Pending => stats.pending += 1,
                DraftStatus::Ready => {
                    stats.ready += 1;
                    stats.total_amount += entry.total_amount;
                }
                DraftStatus::Sent => {
                    stats.sent += 1;
                    stats.total_amount += entry.total_amount;
                }
            }
        }
        stats
    }

    /// Rows matching a building and a search over room number (substring)
    /// or tenant name (case-insensitive).
    pub fn filter(&self, building_id: Option<&str>, search: Option<&str>) -> Vec<&DraftInvoiceEntry> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        self.entries
            .iter()
            .filter(|e| building_id.map_or(true, |b| e.building_id == b))
            .filter(|e| match &needle {
                None => true,
                Some(n) => e.room_number.contains(n.as_str()) || e.tenant_name.to_lowercase().contains(n.as_str()),
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::types::{MeterReading, RoomPricing, Tenant, TenantDocuments};
    use crate::MAX_METER_VALUE;
    use chrono::Utc;

    fn june() -> BillingMonth {
        "2025-06".parse().unwrap()
    }

    fn tenant(id: &str, name: &str) -> Tenant {
        Tenant {
            id: id.to_string(),
            name: name.to_string(),
            phone: "0901234567".to_string(),
            id_number: "079123456789".to_string(),
            move_in_date: "2024-03-01".parse().unwrap(),
            deposit: Dong::new(5_000_000),
            notes: None,
            documents: TenantDocuments::default(),
        }
    }

    fn room(id: i64, number: &str, tenant: Option<Tenant>, water: WaterBilling) -> Room {
        Room {
            id,
            building_id: "hagl3".to_string(),
            room_number: number.to_string(),
            room_code: None,
            floor: Some(1),
            status: if tenant.is_some() {
                RoomStatus::Paid
            } else {
                RoomStatus::Empty
            },
            monthly_rent: Dong::new(5_000_000),
            area: Some(30),
            debt_amount: None,
            tenant,
            meter_readings: vec![MeterReading {
                month: "2025-05".parse().unwrap(),
                electricity_prev: 880,
                electricity_curr: 1000,
                water_prev: 45,
                water_curr: 50,
                recorded_at: Utc::now(),
            }],
            // Parking waived so totals match the worked example
            custom_pricing: Some(RoomPricing {
                use_custom_pricing: true,
                parking_fee: Some(Dong::zero()),
                ..Default::default()
            }),
            water_billing: water,
        }
    }

    fn book() -> DraftBook {
        let rooms = vec![
            room(1, "101", Some(tenant("a", "Nguyễn Văn An")), WaterBilling::Metered),
            room(2, "102", None, WaterBilling::Metered),
            room(
                3,
                "103",
                Some(tenant("c", "Lê Thị Cúc")),
                WaterBilling::Flat {
                    rate: Dong::new(100_000),
                },
            ),
        ];
        DraftBook::initialize(june(), &rooms, &PricingTemplate::default())
    }

    #[test]
    fn test_initialize_skips_empty_rooms_and_keeps_order() {
        let book = book();
        let ids: Vec<i64> = book.entries().iter().map(|e| e.room_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(book.entries().iter().all(|e| e.status == DraftStatus::Pending));
    }

    #[test]
    fn test_initialize_seeds_flat_and_metered_rows() {
        let book = book();

        let metered = book.get(1).unwrap();
        assert_eq!(metered.electricity_previous, 1000);
        assert_eq!(metered.water_new, None);
        assert!(metered.total_amount.is_zero());

        let flat = book.get(3).unwrap();
        assert_eq!(flat.water_new, Some(50));
        assert_eq!(flat.water_amount, Dong::new(100_000));
        // rent + flat water + wifi + trash
        assert_eq!(flat.total_amount, Dong::new(5_230_000));
    }

    #[test]
    fn test_edits_drive_status_and_total() {
        let mut book = book();

        let e = book.set_electricity(1, Some(1120)).unwrap();
        assert_eq!(e.status, DraftStatus::Pending);

        let e = book.set_water(1, Some(55)).unwrap();
        assert_eq!(e.status, DraftStatus::Ready);
        assert_eq!(e.electricity_amount, Dong::new(420_000));
        assert_eq!(e.water_amount, Dong::new(75_000));
        assert_eq!(e.total_amount, Dong::new(5_625_000));

        // Clearing an input drops back to pending
        let e = book.set_water(1, None).unwrap();
        assert_eq!(e.status, DraftStatus::Pending);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut book = book();
        book.set_electricity(1, Some(1120)).unwrap();
        let first = book.set_water(1, Some(55)).unwrap().clone();
        let second = book.set_water(1, Some(55)).unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_flat_row_ready_on_electricity_and_ignores_water_edit() {
        let mut book = book();
        let e = book.set_electricity(3, Some(1000)).unwrap();
        assert_eq!(e.status, DraftStatus::Ready);

        let before = e.clone();
        let after = book.set_water(3, Some(999)).unwrap();
        assert_eq!(&before, after);
    }

    #[test]
    fn test_sent_rows_are_immutable() {
        let mut book = book();
        book.set_electricity(1, Some(1120)).unwrap();
        book.set_water(1, Some(55)).unwrap();
        book.begin_publish(1).unwrap();
        book.mark_sent(1).unwrap();
        let sent = book.get(1).unwrap().clone();

        assert!(matches!(
            book.set_electricity(1, Some(2000)),
            Err(CoreError::DraftLocked { room_id: 1 })
        ));
        assert!(matches!(
            book.set_water(1, Some(60)),
            Err(CoreError::DraftLocked { .. })
        ));

        // Only the unsent flat row is touched
        assert_eq!(book.use_previous_for_all(), 1);
        assert_eq!(book.get(1).unwrap(), &sent);
        assert!(matches!(book.begin_publish(1), Err(CoreError::DraftLocked { .. })));
    }

    #[test]
    fn test_use_previous_for_all_means_zero_usage() {
        let mut book = book();
        assert_eq!(book.use_previous_for_all(), 2);

        let e = book.get(1).unwrap();
        assert_eq!(e.status, DraftStatus::Ready);
        assert_eq!(e.electricity_usage, 0);
        assert_eq!(e.water_usage, 0);
        assert_eq!(e.total_amount, Dong::new(5_130_000));
    }

    #[test]
    fn test_begin_publish_requires_ready() {
        let book = book();
        assert!(matches!(
            book.begin_publish(1),
            Err(CoreError::DraftNotReady { room_id: 1, .. })
        ));
        assert!(matches!(
            book.begin_publish(42),
            Err(CoreError::DraftNotFound { room_id: 42 })
        ));
    }

    #[test]
    fn test_stats_count_only_ready_and_sent_amounts() {
        let mut book = book();
        book.set_electricity(1, Some(1120)).unwrap();
        book.set_water(1, Some(55)).unwrap();
        book.mark_sent(1).unwrap();

        let stats = book.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.sent, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.ready, 0);
        // Flat row is pending; its precomputed total is excluded
        assert_eq!(stats.total_amount, Dong::new(5_625_000));

        book.set_electricity(3, Some(1010)).unwrap();
        assert_eq!(book.ready_room_ids(), vec![3]);
        assert_eq!(book.stats().total_amount, Dong::new(5_625_000 + 5_265_000));
    }

    #[test]
    fn test_occupied_room_without_tenant_is_reported() {
        let mut orphan = room(4, "104", None, WaterBilling::Metered);
        orphan.status = RoomStatus::Debt;
        let rooms = vec![
            room(1, "101", Some(tenant("a", "Nguyễn Văn An")), WaterBilling::Metered),
            room(2, "102", None, WaterBilling::Metered),
            orphan,
        ];

        let book = DraftBook::initialize(june(), &rooms, &PricingTemplate::default());
        assert_eq!(book.len(), 1);
        assert_eq!(book.skipped_rooms(), &[4]);
        assert!(book.get(4).is_none());
    }

    #[test]
    fn test_oversized_meter_value_is_rejected() {
        let mut book = book();
        let huge = i64::MAX / 1_000;

        assert!(matches!(
            book.set_electricity(1, Some(huge)),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(matches!(
            book.set_water(1, Some(MAX_METER_VALUE + 1)),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(book.get(1).unwrap().status, DraftStatus::Pending);

        // The cap itself is a legal reading
        let e = book.set_electricity(1, Some(MAX_METER_VALUE)).unwrap();
        assert_eq!(e.electricity_usage, MAX_METER_VALUE - 1000);
        assert!(e.electricity_amount.amount() > 0);
    }

    #[test]
    fn test_filter_by_room_and_tenant() {
        let book = book();
        assert_eq!(book.filter(None, Some("103")).len(), 1);
        assert_eq!(book.filter(None, Some("nguyễn")).len(), 1);
        assert_eq!(book.filter(Some("hagl3"), None).len(), 2);
        assert!(book.filter(Some("pha"), None).is_empty());
    }
}
