//! # Domain Types
//!
//! Core domain types for buildings, rooms, tenants and meter history.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Building     │ 1 │      Room       │ 1 │     Tenant      │       │
//! │  │  ─────────────  │──►│  ─────────────  │──►│  ─────────────  │       │
//! │  │  id (slug)      │ n │  id (i64)       │ 0..1 id (UUID)     │       │
//! │  │  name           │   │  room_number    │   │  name, phone    │       │
//! │  │  floors         │   │  status         │   │  move_in_date   │       │
//! │  └─────────────────┘   │  monthly_rent   │   │  documents      │       │
//! │                        │  water_billing  │   └─────────────────┘       │
//! │                        │  custom_pricing │                              │
//! │                        └────────┬────────┘                              │
//! │                                 │ 1..n (chronological)                  │
//! │                        ┌────────▼────────┐                              │
//! │                        │  MeterReading   │                              │
//! │                        │  month YYYY-MM  │                              │
//! │                        │  prev → curr    │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Room Invariant
//! `status == Empty` ⇔ `tenant.is_none()`, and `debt_amount` is only set
//! while `status == Debt`. [`Room::check_invariants`] enforces it.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::meter::MeterHistory;
use crate::money::Dong;
use crate::pricing::{resolve_pricing, PricingTemplate, ResolvedPricing};
use crate::CONTRACT_TERM_DAYS;

// =============================================================================
// Billing Month
// =============================================================================

/// A billing period, rendered as `YYYY-MM`.
///
/// Ordering is chronological (year first, then month), so meter histories
/// and invoice lists can be sorted directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BillingMonth {
    year: i32,
    month: u32,
}

impl BillingMonth {
    /// Creates a month, validating `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            });
        }
        if !(2000..=2100).contains(&year) {
            return Err(ValidationError::OutOfRange {
                field: "year".to_string(),
                min: 2000,
                max: 2100,
            });
        }
        Ok(BillingMonth { year, month })
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        BillingMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    #[inline]
    pub fn year(&self) -> i32 {
        self.year
    }

    #[inline]
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            BillingMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            BillingMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            BillingMonth {
                year: self.year - 1,
                month: 12,
            }
        } else {
            BillingMonth {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Steps back `n` months.
    pub fn minus(&self, n: u32) -> Self {
        (0..n).fold(*self, |m, _| m.previous())
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn days_in_month(&self) -> u32 {
        self.next()
            .first_day()
            .pred_opt()
            .map(|d| d.day())
            .unwrap_or(28)
    }

    /// The given day of this month, clamped to the month's length.
    pub fn day(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days_in_month());
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or_else(|| self.first_day())
    }

    /// Payment due date: `due_day` of the month after the billing month.
    ///
    /// ```rust
    /// use nhatro_core::BillingMonth;
    ///
    /// let m: BillingMonth = "2025-12".parse().unwrap();
    /// assert_eq!(m.due_date(10).to_string(), "2026-01-10");
    /// ```
    pub fn due_date(&self, due_day: u32) -> NaiveDate {
        self.next().day(due_day)
    }

    /// `YYYYMM`, used inside invoice ids.
    pub fn compact(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    /// `MM/YYYY`, used in tenant-facing messages.
    pub fn label(&self) -> String {
        format!("{:02}/{:04}", self.month, self.year)
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::invalid_format("month", format!("expected YYYY-MM, got '{}'", s));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        BillingMonth::new(year, month)
    }
}

impl TryFrom<String> for BillingMonth {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BillingMonth> for String {
    fn from(month: BillingMonth) -> Self {
        month.to_string()
    }
}

// =============================================================================
// Building
// =============================================================================

/// A managed building. Static reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Building {
    /// Slug identifier (e.g. `hagl3`).
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub address: String,
    pub total_rooms: i64,
    pub floors: i64,
    /// Advertised electricity rate (đ/kWh).
    pub electricity_rate: Dong,
    /// Advertised water rate (đ/m³).
    pub water_rate: Dong,
}

// =============================================================================
// Room Status
// =============================================================================

/// Occupancy and payment standing of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// No tenant.
    Empty,
    /// Occupied, no outstanding invoices.
    Paid,
    /// Occupied, at least one unpaid invoice.
    Debt,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Empty => "empty",
            RoomStatus::Paid => "paid",
            RoomStatus::Debt => "debt",
        }
    }
}

// =============================================================================
// Water Billing
// =============================================================================

/// Storage discriminant for [`WaterBilling`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WaterMode {
    Metered,
    Flat,
}

/// How a room is charged for water. Persisted per room and set by the
/// operator; never decided at invoice time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WaterBilling {
    /// Usage × water rate.
    #[default]
    Metered,
    /// Fixed monthly charge, meter ignored.
    Flat { rate: Dong },
}

impl WaterBilling {
    pub fn mode(&self) -> WaterMode {
        match self {
            WaterBilling::Metered => WaterMode::Metered,
            WaterBilling::Flat { .. } => WaterMode::Flat,
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, WaterBilling::Flat { .. })
    }

    /// Flat charge, or zero for metered rooms.
    pub fn flat_rate(&self) -> Dong {
        match self {
            WaterBilling::Metered => Dong::zero(),
            WaterBilling::Flat { rate } => *rate,
        }
    }

    /// Rebuilds the value from its two stored columns.
    pub fn from_parts(mode: WaterMode, flat_rate: Option<Dong>) -> Self {
        match mode {
            WaterMode::Metered => WaterBilling::Metered,
            WaterMode::Flat => WaterBilling::Flat {
                rate: flat_rate.unwrap_or(crate::DEFAULT_FLAT_WATER_RATE),
            },
        }
    }
}

// =============================================================================
// Tenant
// =============================================================================

/// Image slots kept for a tenant's paperwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSlot {
    IdFront,
    IdBack,
    Vehicle,
    Contract,
}

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 4] = [
        DocumentSlot::IdFront,
        DocumentSlot::IdBack,
        DocumentSlot::Vehicle,
        DocumentSlot::Contract,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSlot::IdFront => "id_front",
            DocumentSlot::IdBack => "id_back",
            DocumentSlot::Vehicle => "vehicle",
            DocumentSlot::Contract => "contract",
        }
    }
}

/// Storage keys of uploaded documents, one per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TenantDocuments {
    pub id_front: Option<String>,
    pub id_back: Option<String>,
    pub vehicle: Option<String>,
    pub contract: Option<String>,
}

impl TenantDocuments {
    pub fn get(&self, slot: DocumentSlot) -> Option<&str> {
        match slot {
            DocumentSlot::IdFront => self.id_front.as_deref(),
            DocumentSlot::IdBack => self.id_back.as_deref(),
            DocumentSlot::Vehicle => self.vehicle.as_deref(),
            DocumentSlot::Contract => self.contract.as_deref(),
        }
    }

    pub fn set(&mut self, slot: DocumentSlot, key: Option<String>) {
        let target = match slot {
            DocumentSlot::IdFront => &mut self.id_front,
            DocumentSlot::IdBack => &mut self.id_back,
            DocumentSlot::Vehicle => &mut self.vehicle,
            DocumentSlot::Contract => &mut self.contract,
        };
        *target = key;
    }
}

/// The current occupant of a room. Owned by the room and removed on checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tenant {
    /// UUID v4.
    pub id: String,
    pub name: String,
    pub phone: String,
    /// Citizen identity card number (CCCD, 12 digits).
    pub id_number: String,
    #[ts(as = "String")]
    pub move_in_date: NaiveDate,
    pub deposit: Dong,
    pub notes: Option<String>,
    #[serde(default)]
    pub documents: TenantDocuments,
}

impl Tenant {
    /// End of the current yearly contract term.
    ///
    /// Contracts run for [`CONTRACT_TERM_DAYS`] from move-in and renew for
    /// another term when they lapse. The result is the first term end that
    /// is on or after `today`.
    pub fn contract_end(&self, today: NaiveDate) -> NaiveDate {
        let term = Duration::days(CONTRACT_TERM_DAYS);
        let mut end = self.move_in_date + term;
        while end < today {
            end += term;
        }
        end
    }

    /// True when the current term ends within `window_days` of `today`.
    pub fn contract_expiring(&self, today: NaiveDate, window_days: i64) -> bool {
        self.contract_end(today) <= today + Duration::days(window_days)
    }
}

// =============================================================================
// Meter Reading
// =============================================================================

/// One month of electricity and water meter values for a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MeterReading {
    #[ts(as = "String")]
    pub month: BillingMonth,
    pub electricity_prev: i64,
    pub electricity_curr: i64,
    pub water_prev: i64,
    pub water_curr: i64,
    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
}

impl MeterReading {
    /// kWh consumed, clamped at zero.
    pub fn electricity_usage(&self) -> i64 {
        (self.electricity_curr - self.electricity_prev).max(0)
    }

    /// m³ consumed, clamped at zero.
    pub fn water_usage(&self) -> i64 {
        (self.water_curr - self.water_prev).max(0)
    }
}

// =============================================================================
// Room Pricing Override
// =============================================================================

/// Per-room override of the default rate/fee template.
///
/// When `use_custom_pricing` is false the override fields are ignored,
/// even if some are still set from an earlier configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomPricing {
    pub use_custom_pricing: bool,
    pub electricity_rate: Option<Dong>,
    pub water_rate: Option<Dong>,
    pub wifi_fee: Option<Dong>,
    pub trash_fee: Option<Dong>,
    pub parking_fee: Option<Dong>,
}

// =============================================================================
// Room
// =============================================================================

/// A rentable room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Room {
    pub id: i64,
    pub building_id: String,
    /// e.g. `"305"` (floor 3, room 5).
    pub room_number: String,
    /// Optional building-specific code, e.g. `"MP-3-05"`.
    pub room_code: Option<String>,
    pub floor: Option<i64>,
    pub status: RoomStatus,
    pub monthly_rent: Dong,
    /// Area in m².
    pub area: Option<i64>,
    pub debt_amount: Option<Dong>,
    pub tenant: Option<Tenant>,
    /// Chronological, most recent last.
    pub meter_readings: Vec<MeterReading>,
    pub custom_pricing: Option<RoomPricing>,
    #[serde(default)]
    pub water_billing: WaterBilling,
}

impl Room {
    pub fn is_occupied(&self) -> bool {
        self.tenant.is_some()
    }

    /// Returns the tenant or `RoomNotOccupied`.
    pub fn occupant(&self) -> CoreResult<&Tenant> {
        self.tenant
            .as_ref()
            .ok_or(CoreError::RoomNotOccupied { room_id: self.id })
    }

    /// Read-only view over the meter history.
    pub fn meter(&self) -> MeterHistory<'_> {
        MeterHistory::new(&self.meter_readings)
    }

    /// Effective rates and fees for this room.
    pub fn pricing(&self, template: &PricingTemplate) -> ResolvedPricing {
        resolve_pricing(self.custom_pricing.as_ref(), template)
    }

    /// Checks the status/tenant/debt invariant.
    pub fn check_invariants(&self) -> CoreResult<()> {
        let inconsistent = |reason: &str| CoreError::RoomInconsistent {
            room_id: self.id,
            reason: reason.to_string(),
        };

        match (self.status, self.tenant.is_some()) {
            (RoomStatus::Empty, true) => return Err(inconsistent("empty room has a tenant")),
            (RoomStatus::Paid | RoomStatus::Debt, false) => {
                return Err(inconsistent("occupied status without a tenant"))
            }
            _ => {}
        }

        if self.status != RoomStatus::Debt && self.debt_amount.is_some() {
            return Err(inconsistent("debt amount set on a room not in debt"));
        }

        Ok(())
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Business details shown on the settings page and on printed invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessProfile {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub email: String,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        BusinessProfile {
            name: "Nhà Trọ Ngọc Hậu".to_string(),
            phone: "0901234567".to_string(),
            address: "123 Đường ABC, Quận XYZ, TP. Hồ Chí Minh".to_string(),
            email: "contact@nhatro.com".to_string(),
        }
    }
}

/// Operator alert switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NotificationPreferences {
    pub overdue_invoices: bool,
    pub expiring_contracts: bool,
    pub daily_email_report: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        NotificationPreferences {
            overdue_invoices: true,
            expiring_contracts: true,
            daily_email_report: false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(move_in: &str) -> Tenant {
        Tenant {
            id: "t-1".to_string(),
            name: "Nguyễn Văn An".to_string(),
            phone: "0901234567".to_string(),
            id_number: "079123456789".to_string(),
            move_in_date: move_in.parse().unwrap(),
            deposit: Dong::new(5_000_000),
            notes: None,
            documents: TenantDocuments::default(),
        }
    }

    fn room(status: RoomStatus, tenant: Option<Tenant>) -> Room {
        Room {
            id: 1,
            building_id: "hagl3".to_string(),
            room_number: "101".to_string(),
            room_code: None,
            floor: Some(1),
            status,
            monthly_rent: Dong::new(5_000_000),
            area: Some(50),
            debt_amount: None,
            tenant,
            meter_readings: vec![],
            custom_pricing: None,
            water_billing: WaterBilling::Metered,
        }
    }

    #[test]
    fn test_billing_month_parse_and_display() {
        let m: BillingMonth = "2025-03".parse().unwrap();
        assert_eq!(m.year(), 2025);
        assert_eq!(m.month(), 3);
        assert_eq!(m.to_string(), "2025-03");
        assert_eq!(m.compact(), "202503");
        assert_eq!(m.label(), "03/2025");

        assert!("2025-13".parse::<BillingMonth>().is_err());
        assert!("2025-3".parse::<BillingMonth>().is_err());
        assert!("march".parse::<BillingMonth>().is_err());
    }

    #[test]
    fn test_billing_month_navigation() {
        let dec: BillingMonth = "2024-12".parse().unwrap();
        assert_eq!(dec.next().to_string(), "2025-01");
        assert_eq!(dec.next().previous(), dec);
        assert_eq!(dec.minus(12).to_string(), "2023-12");
        assert!(dec < dec.next());
    }

    #[test]
    fn test_due_date_is_tenth_of_following_month() {
        let jan: BillingMonth = "2025-01".parse().unwrap();
        assert_eq!(jan.due_date(10), "2025-02-10".parse::<NaiveDate>().unwrap());

        // Clamped for short months
        assert_eq!(jan.due_date(31), "2025-02-28".parse::<NaiveDate>().unwrap());
    }

    #[test]
    fn test_billing_month_serde_as_string() {
        let m: BillingMonth = "2025-07".parse().unwrap();
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"2025-07\"");
        let back: BillingMonth = serde_json::from_str("\"2025-07\"").unwrap();
        assert_eq!(back, m);
        assert!(serde_json::from_str::<BillingMonth>("\"2025-00\"").is_err());
    }

    #[test]
    fn test_water_billing_parts() {
        let flat = WaterBilling::from_parts(WaterMode::Flat, Some(Dong::new(120_000)));
        assert_eq!(flat.flat_rate(), Dong::new(120_000));
        assert_eq!(flat.mode(), WaterMode::Flat);

        let metered = WaterBilling::from_parts(WaterMode::Metered, Some(Dong::new(120_000)));
        assert_eq!(metered, WaterBilling::Metered);
        assert!(metered.flat_rate().is_zero());
    }

    #[test]
    fn test_contract_end_renews_yearly() {
        let t = tenant("2024-01-15");
        let today: NaiveDate = "2024-06-01".parse().unwrap();
        assert_eq!(t.contract_end(today), "2025-01-14".parse::<NaiveDate>().unwrap());

        let later: NaiveDate = "2025-03-01".parse().unwrap();
        assert_eq!(t.contract_end(later), "2026-01-14".parse::<NaiveDate>().unwrap());
    }

    #[test]
    fn test_contract_expiring_window() {
        let t = tenant("2024-01-15");
        assert!(t.contract_expiring("2025-01-01".parse().unwrap(), 30));
        assert!(!t.contract_expiring("2024-06-01".parse().unwrap(), 30));
    }

    #[test]
    fn test_room_invariants() {
        assert!(room(RoomStatus::Empty, None).check_invariants().is_ok());
        assert!(room(RoomStatus::Paid, Some(tenant("2024-01-01")))
            .check_invariants()
            .is_ok());
        assert!(room(RoomStatus::Empty, Some(tenant("2024-01-01")))
            .check_invariants()
            .is_err());
        assert!(room(RoomStatus::Debt, None).check_invariants().is_err());

        let mut paid = room(RoomStatus::Paid, Some(tenant("2024-01-01")));
        paid.debt_amount = Some(Dong::new(1));
        assert!(paid.check_invariants().is_err());
    }

    #[test]
    fn test_documents_by_slot() {
        let mut docs = TenantDocuments::default();
        docs.set(DocumentSlot::Vehicle, Some("tenants/t-1/vehicle.jpg".to_string()));
        assert_eq!(docs.get(DocumentSlot::Vehicle), Some("tenants/t-1/vehicle.jpg"));
        assert_eq!(docs.get(DocumentSlot::IdFront), None);

        docs.set(DocumentSlot::Vehicle, None);
        assert_eq!(docs.get(DocumentSlot::Vehicle), None);
    }
}
