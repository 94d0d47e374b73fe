//! # Invoice Calculator
//!
//! Maps a baseline, new meter values and resolved pricing to line items.
//!
//! ## Formula
//! ```text
//! electricity_usage  = max(0, new_e − base_e)          (0 if new_e absent)
//! electricity_amount = electricity_usage × electricity_rate
//!
//! water (metered)    = max(0, new_w − base_w) × water_rate   (0 if absent)
//! water (flat)       = flat rate, usage 0, new_w ignored
//!
//! total = rent + electricity_amount + water_amount + wifi + trash + parking
//! ```
//!
//! A decreased meter (replacement) is billed as zero usage; it is not an error.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::meter::Baseline;
use crate::money::Dong;
use crate::pricing::{PricingTemplate, ResolvedPricing};
use crate::types::{BillingMonth, Room, WaterBilling};

/// Everything the calculator needs for one room.
#[derive(Debug, Clone, Copy)]
pub struct CalculationInput<'a> {
    pub baseline: Baseline,
    pub pricing: &'a ResolvedPricing,
    pub new_electricity: Option<i64>,
    pub new_water: Option<i64>,
    pub water_billing: WaterBilling,
    pub monthly_rent: Dong,
}

/// Computed line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceComputation {
    pub electricity_usage: i64,
    pub electricity_amount: Dong,
    pub water_usage: i64,
    pub water_amount: Dong,
    /// wifi + trash + parking.
    pub fees_total: Dong,
    pub total: Dong,
}

/// Computes an invoice's line items and total.
pub fn compute_invoice(input: &CalculationInput<'_>) -> InvoiceComputation {
    let electricity_usage = input
        .new_electricity
        .map(|new| (new - input.baseline.electricity).max(0))
        .unwrap_or(0);
    let electricity_amount = input.pricing.electricity_rate.times(electricity_usage);

    let (water_usage, water_amount) = match input.water_billing {
        WaterBilling::Flat { rate } => (0, rate),
        WaterBilling::Metered => match input.new_water {
            Some(new) => {
                let usage = (new - input.baseline.water).max(0);
                (usage, input.pricing.water_rate.times(usage))
            }
            None => (0, Dong::zero()),
        },
    };

    let fees_total = input.pricing.fees_total();
    let total = input.monthly_rent + electricity_amount + water_amount + fees_total;

    InvoiceComputation {
        electricity_usage,
        electricity_amount,
        water_usage,
        water_amount,
        fees_total,
        total,
    }
}

/// Quick single-room preview used by the room detail page.
///
/// Bills `month` against the reading before it, so previewing an
/// already-read month gives the same figures as the original invoice.
pub fn preview_for_room(
    room: &Room,
    template: &PricingTemplate,
    month: BillingMonth,
    new_electricity: Option<i64>,
    new_water: Option<i64>,
) -> CoreResult<InvoiceComputation> {
    room.occupant()?;

    let pricing = room.pricing(template);
    Ok(compute_invoice(&CalculationInput {
        baseline: room.meter().baseline_for(month),
        pricing: &pricing,
        new_electricity,
        new_water,
        water_billing: room.water_billing,
        monthly_rent: room.monthly_rent,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================
