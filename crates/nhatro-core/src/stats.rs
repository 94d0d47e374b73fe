//! # Listings & Aggregates
//!
//! Filters and header figures for the dashboard, room and tenant pages.
//!
//! ```text
//! ┌───────────────────┬─────────────────────────────────────────────────┐
//! │ DashboardStats    │ revenue, empty rooms, unpaid invoices, expiring │
//! │ BuildingStats     │ total / empty / paid / debt / revenue           │
//! │ RoomFilter        │ building • status • room number / tenant name   │
//! │ TenantEntry       │ directory row with contract end                 │
//! └───────────────────┴─────────────────────────────────────────────────┘
//! ```
//!
//! "Revenue" throughout is the sum of monthly rent over occupied rooms.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::invoice::Invoice;
use crate::money::Dong;
use crate::types::{Room, RoomStatus};

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub total_revenue: Dong,
    pub empty_rooms: usize,
    pub unpaid_invoices: usize,
    /// Occupied rooms whose contract term ends within the window.
    pub expiring_contracts: usize,
    pub total_rooms: usize,
    pub occupied_rooms: usize,
}

impl DashboardStats {
    pub fn compute(rooms: &[Room], invoices: &[Invoice], today: NaiveDate, expiring_window_days: i64) -> Self {
        let occupied: Vec<&Room> = rooms.iter().filter(|r| r.status != RoomStatus::Empty).collect();

        DashboardStats {
            total_revenue: occupied.iter().map(|r| r.monthly_rent).sum(),
            empty_rooms: rooms.len() - occupied.len(),
            unpaid_invoices: invoices.iter().filter(|i| !i.is_paid()).count(),
            expiring_contracts: occupied
                .iter()
                .filter_map(|r| r.tenant.as_ref())
                .filter(|t| t.contract_expiring(today, expiring_window_days))
                .count(),
            total_rooms: rooms.len(),
            occupied_rooms: occupied.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BuildingStats {
    pub total: usize,
    pub empty: usize,
    pub paid: usize,
    pub debt: usize,
    pub revenue: Dong,
}

impl BuildingStats {
    /// Stats over rooms of one building, or all rooms when `None`.
    pub fn compute(rooms: &[Room], building_id: Option<&str>) -> Self {
        let mut stats = BuildingStats::default();
        for room in rooms
            .iter()
            .filter(|r| building_id.map_or(true, |b| r.building_id == b))
        {
            stats.total += 1;
            match room.status {
                RoomStatus::Empty => stats.empty += 1,
                RoomStatus::Paid => stats.paid += 1,
                RoomStatus::Debt => stats.debt += 1,
            }
            if room.status != RoomStatus::Empty {
                stats.revenue += room.monthly_rent;
            }
        }
        stats
    }
}

// =============================================================================
// Room Listing
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatusFilter {
    #[default]
    All,
    Empty,
    /// Occupied and fully paid.
    Occupied,
    Debt,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomFilter {
    pub building_id: Option<String>,
    #[serde(default)]
    pub status: RoomStatusFilter,
    /// Room number substring or tenant name (case-insensitive).
    pub search: Option<String>,
}

impl RoomFilter {
    pub fn matches(&self, room: &Room) -> bool {
        let status_ok = match self.status {
            RoomStatusFilter::All => true,
            RoomStatusFilter::Empty => room.status == RoomStatus::Empty,
            RoomStatusFilter::Occupied => room.status == RoomStatus::Paid,
            RoomStatusFilter::Debt => room.status == RoomStatus::Debt,
        };
        if !status_ok {
            return false;
        }
        if let Some(b) = &self.building_id {
            if &room.building_id != b {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(needle) => {
                room.room_number.contains(needle)
                    || room
                        .tenant
                        .as_ref()
                        .is_some_and(|t| t.name.to_lowercase().contains(&needle.to_lowercase()))
            }
        }
    }
}

// =============================================================================
// Tenant Directory
// =============================================================================

/// One row of the tenant directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TenantEntry {
    pub tenant_id: String,
    pub name: String,
    pub phone: String,
    pub building_id: String,
    pub room_id: i64,
    pub room_number: String,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    /// End of the current contract term.
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    pub status: RoomStatus,
    pub deposit: Dong,
}

impl TenantEntry {
    /// `None` for empty rooms.
    pub fn from_room(room: &Room, today: NaiveDate) -> Option<Self> {
        let t = room.tenant.as_ref()?;
        Some(TenantEntry {
            tenant_id: t.id.clone(),
            name: t.name.clone(),
            phone: t.phone.clone(),
            building_id: room.building_id.clone(),
            room_id: room.id,
            room_number: room.room_number.clone(),
            start_date: t.move_in_date,
            end_date: t.contract_end(today),
            status: room.status,
            deposit: t.deposit,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TenantFilter {
    pub building_id: Option<String>,
    /// `Paid` or `Debt`.
    pub status: Option<RoomStatus>,
    /// Name (case-insensitive), room number or phone.
    pub search: Option<String>,
}

impl TenantFilter {
    pub fn matches(&self, entry: &TenantEntry) -> bool {
        if self.building_id.as_ref().is_some_and(|b| &entry.building_id != b) {
            return false;
        }
        if self.status.is_some_and(|s| entry.status != s) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(needle) => {
                entry.name.to_lowercase().contains(&needle.to_lowercase())
                    || entry.room_number.contains(needle)
                    || entry.phone.contains(needle)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TenantStats {
    pub total: usize,
    pub paid: usize,
    pub debt: usize,
}

impl TenantStats {
    pub fn count<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a TenantEntry>,
    {
        let mut stats = TenantStats::default();
        for e in entries {
            stats.total += 1;
            match e.status {
                RoomStatus::Paid => stats.paid += 1,
                RoomStatus::Debt => stats.debt += 1,
                RoomStatus::Empty => {}
            }
        }
        stats
    }
}
