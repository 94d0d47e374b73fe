//! # Room Commands
//!
//! Room grid, room detail, per-room pricing and water billing, and the
//! quick invoice preview on the room page.
//!
//! ## Pricing Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update_room_pricing(room, Some(pricing{use_custom_pricing: true}))     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  each rate/fee: room override ──► else settings template                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RoomDetail.pricing (what the next invoice will use)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use nhatro_core::calculator::{preview_for_room, InvoiceComputation};
use nhatro_core::stats::RoomFilter;
use nhatro_core::validation::{validate_amount, validate_meter_value};
use nhatro_core::{
    BillingMonth, Dong, MeterReading, ResolvedPricing, Room, RoomPricing, RoomStatus, Tenant,
    WaterBilling, WaterMode,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: i64,
    pub building_id: String,
    pub room_number: String,
    pub room_code: Option<String>,
    pub floor: Option<i64>,
    pub status: RoomStatus,
    pub monthly_rent: i64,
    pub area: Option<i64>,
    pub debt_amount: Option<i64>,
    pub tenant_name: Option<String>,
    pub tenant_phone: Option<String>,
    pub water_mode: WaterMode,
    pub flat_water_rate: Option<i64>,
    pub has_custom_pricing: bool,
}

impl From<&Room> for RoomDto {
    fn from(r: &Room) -> Self {
        RoomDto {
            id: r.id,
            building_id: r.building_id.clone(),
            room_number: r.room_number.clone(),
            room_code: r.room_code.clone(),
            floor: r.floor,
            status: r.status,
            monthly_rent: r.monthly_rent.amount(),
            area: r.area,
            debt_amount: r.debt_amount.map(|d| d.amount()),
            tenant_name: r.tenant.as_ref().map(|t| t.name.clone()),
            tenant_phone: r.tenant.as_ref().map(|t| t.phone.clone()),
            water_mode: r.water_billing.mode(),
            flat_water_rate: r.water_billing.is_flat().then(|| r.water_billing.flat_rate().amount()),
            has_custom_pricing: r.custom_pricing.as_ref().map(|p| p.use_custom_pricing).unwrap_or(false),
        }
    }
}

/// Everything on the room detail page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetail {
    pub room: RoomDto,
    pub tenant: Option<Tenant>,
    pub custom_pricing: Option<RoomPricing>,
    /// Rates and fees the next invoice will use.
    pub pricing: ResolvedPricing,
    pub last_reading: Option<MeterReading>,
}

pub async fn list_rooms(db: &DbState, filter: &RoomFilter) -> Result<Vec<RoomDto>, ApiError> {
    let rooms = match filter.building_id.as_deref() {
        Some(id) => db.inner().rooms().list_by_building(id).await?,
        None => db.inner().rooms().list().await?,
    };
    let out: Vec<RoomDto> = rooms.iter().filter(|r| filter.matches(r)).map(RoomDto::from).collect();
    debug!(count = out.len(), "list_rooms command");
    Ok(out)
}

pub async fn get_room(db: &DbState, room_id: i64) -> Result<RoomDetail, ApiError> {
    let room = db.inner().rooms().get(room_id).await?;
    let template = db.inner().settings().pricing_template().await?;

    Ok(RoomDetail {
        room: RoomDto::from(&room),
        pricing: room.pricing(&template),
        last_reading: room.meter().last().cloned(),
        custom_pricing: room.custom_pricing.clone(),
        tenant: room.tenant,
    })
}

/// Totals for `month` with the given new meter values, without saving.
pub async fn preview_invoice(
    db: &DbState,
    room_id: i64,
    month: BillingMonth,
    new_electricity: Option<i64>,
    new_water: Option<i64>,
) -> Result<InvoiceComputation, ApiError> {
    if let Some(v) = new_electricity {
        validate_meter_value("electricity", v)?;
    }
    if let Some(v) = new_water {
        validate_meter_value("water", v)?;
    }

    let room = db.inner().rooms().get(room_id).await?;
    let template = db.inner().settings().pricing_template().await?;
    Ok(preview_for_room(&room, &template, month, new_electricity, new_water)?)
}

/// Sets or clears the room's pricing override.
pub async fn update_room_pricing(
    db: &DbState,
    room_id: i64,
    pricing: Option<RoomPricing>,
) -> Result<RoomDetail, ApiError> {
    if let Some(p) = &pricing {
        let fields = [
            ("electricity_rate", p.electricity_rate),
            ("water_rate", p.water_rate),
            ("wifi_fee", p.wifi_fee),
            ("trash_fee", p.trash_fee),
            ("parking_fee", p.parking_fee),
        ];
        for (field, value) in fields {
            if let Some(amount) = value {
                validate_amount(field, amount)?;
            }
        }
    }

    db.inner().rooms().update_pricing(room_id, pricing.as_ref()).await?;
    info!(room_id, custom = pricing.is_some(), "Room pricing updated");
    get_room(db, room_id).await
}

/// Switches between metered and flat water. A flat switch without a
/// rate uses the configured default.
pub async fn set_water_billing(
    db: &DbState,
    config: &ConfigState,
    room_id: i64,
    mode: WaterMode,
    flat_rate: Option<i64>,
) -> Result<RoomDto, ApiError> {
    let billing = match mode {
        WaterMode::Metered => WaterBilling::Metered,
        WaterMode::Flat => {
            let rate = flat_rate.map(Dong::new).unwrap_or(config.default_flat_water_rate);
            validate_amount("flat_water_rate", rate)?;
            WaterBilling::Flat { rate }
        }
    };

    db.inner().rooms().set_water_billing(room_id, billing).await?;
    info!(room_id, mode = ?billing.mode(), "Water billing updated");

    let room = db.inner().rooms().get(room_id).await?;
    Ok(RoomDto::from(&room))
}
