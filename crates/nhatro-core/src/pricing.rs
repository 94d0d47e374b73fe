//! # Pricing Resolver
//!
//! Resolves the effective utility rates and flat fees for a room.
//!
//! ## Field-Level Fallback
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  use_custom_pricing = true                                              │
//! │                                                                         │
//! │   field            override      template      resolved                 │
//! │   ───────────────  ────────────  ────────────  ────────────             │
//! │   electricity_rate 4.000         3.500         4.000   ◄── override      │
//! │   water_rate       (none)        15.000        15.000  ◄── template      │
//! │   wifi_fee         0             100.000       0       ◄── override      │
//! │   trash_fee        (none)        30.000        30.000                   │
//! │   parking_fee      (none)        100.000       100.000                  │
//! │                                                                         │
//! │  use_custom_pricing = false (or no override at all)                     │
//! │   → template verbatim, stale override fields ignored                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Called on every meter edit, so it stays O(1) and allocation-free.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Dong;
use crate::types::RoomPricing;

// =============================================================================
// Pricing Template
// =============================================================================

/// The global default rates and fees, editable from the settings page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingTemplate {
    /// đ per kWh.
    pub electricity_rate: Dong,
    /// đ per m³.
    pub water_rate: Dong,
    pub wifi_fee: Dong,
    pub trash_fee: Dong,
    pub parking_fee: Dong,
}

impl Default for PricingTemplate {
    fn default() -> Self {
        PricingTemplate {
            electricity_rate: Dong::new(3_500),
            water_rate: Dong::new(15_000),
            wifi_fee: Dong::new(100_000),
            trash_fee: Dong::new(30_000),
            parking_fee: Dong::new(100_000),
        }
    }
}

// =============================================================================
// Resolved Pricing
// =============================================================================

/// Effective pricing for one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolvedPricing {
    pub electricity_rate: Dong,
    pub water_rate: Dong,
    pub wifi_fee: Dong,
    pub trash_fee: Dong,
    pub parking_fee: Dong,
    /// True when the room's override was applied.
    pub is_custom: bool,
}

impl ResolvedPricing {
    /// wifi + trash + parking.
    pub fn fees_total(&self) -> Dong {
        self.wifi_fee + self.trash_fee + self.parking_fee
    }
}

impl From<&PricingTemplate> for ResolvedPricing {
    fn from(t: &PricingTemplate) -> Self {
        ResolvedPricing {
            electricity_rate: t.electricity_rate,
            water_rate: t.water_rate,
            wifi_fee: t.wifi_fee,
            trash_fee: t.trash_fee,
            parking_fee: t.parking_fee,
            is_custom: false,
        }
    }
}

/// Resolves a room's pricing against the template.
///
/// ## Example
/// ```rust
/// use nhatro_core::money::Dong;
/// use nhatro_core::pricing::{resolve_pricing, PricingTemplate};
/// use nhatro_core::RoomPricing;
///
/// let template = PricingTemplate::default();
/// let override_ = RoomPricing {
///     use_custom_pricing: true,
///     electricity_rate: Some(Dong::new(4_000)),
///     ..Default::default()
/// };
///
/// let p = resolve_pricing(Some(&override_), &template);
/// assert_eq!(p.electricity_rate, Dong::new(4_000));
/// assert_eq!(p.water_rate, template.water_rate);
/// assert!(p.is_custom);
/// ```
pub fn resolve_pricing(room: Option<&RoomPricing>, template: &PricingTemplate) -> ResolvedPricing {
    match room {
        Some(custom) if custom.use_custom_pricing => ResolvedPricing {
            electricity_rate: custom.electricity_rate.unwrap_or(template.electricity_rate),
            water_rate: custom.water_rate.unwrap_or(template.water_rate),
            wifi_fee: custom.wifi_fee.unwrap_or(template.wifi_fee),
            trash_fee: custom.trash_fee.unwrap_or(template.trash_fee),
            parking_fee: custom.parking_fee.unwrap_or(template.parking_fee),
            is_custom: true,
        },
        _ => ResolvedPricing::from(template),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
