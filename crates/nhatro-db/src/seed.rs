//! # Mock Data Seeding
//!
//! Populates an empty database with five buildings, about two hundred rooms,
//! six months of meter readings, recent invoices, requests and a
//! notification feed.
//!
//! ## Timeline (relative to `today`)
//! ```text
//!   M-7 … M-3        M-2                M-1               M (today)
//!   readings ───────► last reading      billing month     current month
//!                     invoices M-3, M-2  (drafted in the bulk page)
//! ```
//!
//! ## Distribution
//! - Room status: 12% empty, 63% paid, 25% debt
//! - About 20% of rooms bill water at a flat rate
//! - Buildings with their own rates get a per-room pricing override
//!
//! Everything comes from a seeded [`StdRng`]: the same seed and `today`
//! always produce the same database.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use nhatro_core::calculator::{compute_invoice, CalculationInput};
use nhatro_core::invoice::{invoice_id, Invoice};
use nhatro_core::meter::Baseline;
use nhatro_core::notification::{Notification, NotificationKind, NotificationMetadata, NotificationPriority};
use nhatro_core::request::{CustomerRequest, RequestCategory, RequestPriority, RequestStatus};
use nhatro_core::{
    BillingMonth, Building, Dong, MeterReading, PricingTemplate, Room, RoomPricing, RoomStatus,
    Tenant, TenantDocuments, WaterBilling, DEFAULT_FLAT_WATER_RATE, EXPIRING_CONTRACT_WINDOW_DAYS,
    INVOICE_DUE_DAY,
};

// =============================================================================
// Reference Data
// =============================================================================

/// (id, name, short name, address, rooms, floors, đ/kWh, đ/m³)
const BUILDINGS: &[(&str, &str, &str, &str, i64, i64, i64, i64)] = &[
    ("hagl3", "Hoàng Anh Gia Lai 3", "HAGL 3", "121 Nguyễn Hữu Cảnh, Bình Thạnh, TP.HCM", 60, 6, 3_500, 15_000),
    ("pha", "Phú Hoàng Anh", "Phú Hoàng Anh", "1 Nguyễn Hữu Thọ, Nhà Bè, TP.HCM", 50, 5, 3_500, 15_000),
    ("ssr", "Saigon South Residences", "SSR", "63 Nguyễn Hữu Thọ, Nhà Bè, TP.HCM", 45, 5, 3_800, 18_000),
    ("sunrise", "Sunrise Riverside", "Sunrise", "60 Nguyễn Hữu Thọ, Nhà Bè, TP.HCM", 45, 5, 3_800, 18_000),
    ("mp6", "Mizuki Park 6", "MP6", "Nguyễn Văn Linh, Bình Chánh, TP.HCM", 8, 3, 3_500, 15_000),
];

const LAST_NAMES: &[&str] = &[
    "Nguyễn", "Trần", "Lê", "Phạm", "Hoàng", "Võ", "Đặng", "Bùi", "Đỗ", "Ngô", "Dương", "Lý",
    "Vũ", "Phan", "Trịnh", "Đinh", "Hồ", "Tô", "Lương", "Mai", "Chu", "Cao", "Tạ", "La",
];

const MIDDLE_NAMES: &[&str] = &[
    "Văn", "Thị", "Hữu", "Ngọc", "Minh", "Thanh", "Hoàng", "Kim", "Quốc", "Anh", "Đức", "Xuân",
    "Thu", "Hồng", "Bảo", "Phương",
];

const FIRST_NAMES: &[&str] = &[
    "An", "Bình", "Cường", "Dung", "Em", "Phương", "Giang", "Hà", "Hùng", "Kim", "Long", "Mai",
    "Nam", "Oanh", "Phúc", "Quỳnh", "Sơn", "Thanh", "Tùng", "Uyên", "Vinh", "Xuyến", "Yên", "Lan",
    "Minh", "Ngọc", "Quang", "Thảo", "Tuấn", "Vân", "Xuân", "Hương", "Đức", "Linh", "Hải", "Trang",
    "Khoa", "Nhung", "Hiếu", "Thủy",
];

const PHONE_PREFIXES: &[&str] = &[
    "090", "091", "093", "094", "096", "097", "098", "032", "033", "034", "035", "036", "037",
    "038", "039", "070", "076", "077", "078", "079", "081", "082", "083", "084", "085",
];

/// (category, priority, title, description)
const REQUESTS: &[(RequestCategory, RequestPriority, &str, &str)] = &[
    (RequestCategory::Plumbing, RequestPriority::Important, "Vòi nước bị rỉ", "Vòi nước nhà tắm rỉ nước liên tục, cần thay mới"),
    (RequestCategory::Electrical, RequestPriority::Important, "Mất điện phòng ngủ", "Ổ cắm phòng ngủ không có điện từ tối qua"),
    (RequestCategory::Internet, RequestPriority::Normal, "Wifi chập chờn", "Wifi mất kết nối nhiều lần trong ngày"),
    (RequestCategory::Maintenance, RequestPriority::Normal, "Máy lạnh không mát", "Máy lạnh chạy nhưng không mát, có thể cần vệ sinh"),
    (RequestCategory::Maintenance, RequestPriority::Normal, "Cửa sổ bị kẹt", "Cửa sổ phòng khách khó đóng mở"),
    (RequestCategory::Plumbing, RequestPriority::Important, "Bồn cầu bị tắc", "Bồn cầu bị tắc, nước không thoát được"),
    (RequestCategory::Electrical, RequestPriority::Normal, "Bóng đèn hành lang hỏng", "Đèn hành lang trước phòng không sáng"),
    (RequestCategory::Other, RequestPriority::Normal, "Xin gia hạn hợp đồng", "Muốn gia hạn hợp đồng thêm 12 tháng"),
    (RequestCategory::Internet, RequestPriority::Important, "Không vào được mạng", "Không kết nối được wifi từ sáng nay"),
    (RequestCategory::Other, RequestPriority::Normal, "Đăng ký thêm chỗ để xe", "Cần đăng ký thêm một chỗ để xe máy"),
];

// =============================================================================
// Options & Summary
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct SeedOptions {
    pub rng_seed: u64,
    /// Anchor for every generated date.
    pub today: NaiveDate,
}

impl SeedOptions {
    pub fn new(rng_seed: u64, today: NaiveDate) -> Self {
        SeedOptions { rng_seed, today }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub buildings: usize,
    pub rooms: usize,
    pub occupied: usize,
    pub invoices: usize,
    pub requests: usize,
    pub notifications: usize,
}

/// Seeds only when the database has no buildings yet.
pub async fn seed_if_empty(db: &Database, options: &SeedOptions) -> DbResult<Option<SeedSummary>> {
    if db.buildings().count().await? > 0 {
        info!("Database already seeded, skipping");
        return Ok(None);
    }
    seed(db, options).await.map(Some)
}

/// Generates and inserts the full mock data set.
pub async fn seed(db: &Database, options: &SeedOptions) -> DbResult<SeedSummary> {
    let mut rng = StdRng::seed_from_u64(options.rng_seed);
    let mut summary = SeedSummary::default();
    let template = db.settings().pricing_template().await?;

    let current = BillingMonth::from_date(options.today);
    let last_read = current.minus(2);

    let buildings: Vec<Building> = BUILDINGS
        .iter()
        .map(|&(id, name, short_name, address, total_rooms, floors, e_rate, w_rate)| Building {
            id: id.to_string(),
            name: name.to_string(),
            short_name: short_name.to_string(),
            address: address.to_string(),
            total_rooms,
            floors,
            electricity_rate: Dong::new(e_rate),
            water_rate: Dong::new(w_rate),
        })
        .collect();

    // Rooms
    let mut rooms = Vec::new();
    let mut next_room_id = 1;
    for building in &buildings {
        db.buildings().insert(building).await?;
        summary.buildings += 1;

        let per_floor = (building.total_rooms + building.floors - 1) / building.floors;
        for i in 1..=building.total_rooms {
            let room = generate_room(&mut rng, building, &template, next_room_id, i, per_floor, options.today, last_read);
            db.rooms().insert(&room).await?;
            next_room_id += 1;
            summary.rooms += 1;
            if room.is_occupied() {
                summary.occupied += 1;
            }
            rooms.push(room);
        }
    }

    // Invoices for the last two read months
    let mut sequences: HashMap<BillingMonth, u32> = HashMap::new();
    let mut unpaid = Vec::new();
    for room in rooms.iter().filter(|r| r.is_occupied()) {
        for month in [last_read.previous(), last_read] {
            let older = month < last_read;
            let paid = match room.status {
                RoomStatus::Debt => older && rng.gen_bool(0.7),
                _ => true,
            };
            let created_in = month.next();
            let sequence = sequences.entry(created_in).or_insert(0);
            *sequence += 1;

            if let Some(invoice) = build_invoice(&mut rng, room, &template, month, invoice_id(created_in, *sequence), paid) {
                db.invoices().insert(&invoice).await?;
                summary.invoices += 1;
                if !invoice.is_paid() {
                    unpaid.push(invoice);
                }
            }
        }
        db.invoices().refresh_room_balance(room.id).await?;
    }

    // Requests
    let occupied: Vec<&Room> = rooms.iter().filter(|r| r.is_occupied()).collect();
    let building_name = |id: &str| {
        buildings
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.name.clone())
            .unwrap_or_default()
    };
    let now = morning(options.today);

    for (i, &(category, priority, title, description)) in REQUESTS.iter().enumerate() {
        if occupied.is_empty() {
            break;
        }
        let room = occupied[rng.gen_range(0..occupied.len())];
        let Some(tenant) = room.tenant.as_ref() else { continue };

        let created_at = now - Duration::hours(rng.gen_range(1..24 * 14));
        let status = match i % 4 {
            0 | 1 => RequestStatus::Pending,
            2 => RequestStatus::InProgress,
            _ => RequestStatus::Completed,
        };
        let response = match status {
            RequestStatus::InProgress => Some("Đã ghi nhận, thợ sẽ đến kiểm tra".to_string()),
            RequestStatus::Completed => Some("Đã xử lý xong".to_string()),
            _ => None,
        };

        db.requests()
            .insert(&CustomerRequest {
                id: seeded_uuid(&mut rng),
                room_id: room.id,
                tenant_name: tenant.name.clone(),
                tenant_phone: tenant.phone.clone(),
                room_number: room.room_number.clone(),
                building_name: building_name(&room.building_id),
                category,
                priority,
                title: title.to_string(),
                description: description.to_string(),
                status,
                response,
                created_at,
                updated_at: created_at,
            })
            .await?;
        summary.requests += 1;
    }

    // Notification feed
    for invoice in unpaid.iter().filter(|i| i.due_date < options.today).take(4) {
        let mut n = Notification::new(
            NotificationKind::Invoice,
            NotificationPriority::Important,
            "Hóa đơn quá hạn",
            format!(
                "P.{} - {} chưa thanh toán hóa đơn tháng {}",
                invoice.room_number,
                invoice.tenant_name,
                invoice.month.label()
            ),
            now - Duration::minutes(rng.gen_range(5..600)),
        )
        .with_link("/dashboard/invoices")
        .with_metadata(NotificationMetadata {
            room_number: Some(invoice.room_number.clone()),
            building_name: Some(building_name(&invoice.building_id)),
            tenant_name: Some(invoice.tenant_name.clone()),
            amount: Some(invoice.total_amount),
        });
        n.id = seeded_uuid(&mut rng);
        db.notifications().insert(&n).await?;
        summary.notifications += 1;
    }

    let expiring = occupied.iter().filter_map(|room| {
        room.tenant
            .as_ref()
            .filter(|t| t.contract_expiring(options.today, EXPIRING_CONTRACT_WINDOW_DAYS))
            .map(|t| (room, t))
    });
    for (room, tenant) in expiring.take(3) {
        let mut n = Notification::new(
            NotificationKind::Contract,
            NotificationPriority::Priority,
            "Hợp đồng sắp hết hạn",
            format!(
                "Hợp đồng của {} (P.{}) hết hạn ngày {}",
                tenant.name,
                room.room_number,
                tenant.contract_end(options.today).format("%d/%m/%Y")
            ),
            now - Duration::hours(rng.gen_range(1..72)),
        )
        .with_link("/dashboard/tenants");
        n.id = seeded_uuid(&mut rng);
        n.is_read = rng.gen_bool(0.3);
        db.notifications().insert(&n).await?;
        summary.notifications += 1;
    }

    let mut backup = Notification::new(
        NotificationKind::System,
        NotificationPriority::Normal,
        "Sao lưu dữ liệu",
        "Dữ liệu đã được sao lưu tự động",
        now - Duration::days(1),
    );
    backup.id = seeded_uuid(&mut rng);
    backup.is_read = true;
    db.notifications().insert(&backup).await?;
    summary.notifications += 1;

    info!(
        buildings = summary.buildings,
        rooms = summary.rooms,
        occupied = summary.occupied,
        invoices = summary.invoices,
        "Mock data seeded"
    );
    Ok(summary)
}

// =============================================================================
// Generators
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn generate_room(
    rng: &mut StdRng,
    building: &Building,
    template: &PricingTemplate,
    id: i64,
    index: i64,
    per_floor: i64,
    today: NaiveDate,
    last_read: BillingMonth,
) -> Room {
    let floor = (index - 1) / per_floor + 1;
    let on_floor = (index - 1) % per_floor + 1;
    let room_number = format!("{}{:02}", floor, on_floor);
    let room_code = (building.id == "mp6").then(|| format!("MP-{}-{:02}", floor, on_floor));

    let draw: f64 = rng.gen();
    let status = if draw < 0.12 {
        RoomStatus::Empty
    } else if draw < 0.75 {
        RoomStatus::Paid
    } else {
        RoomStatus::Debt
    };

    let premium = building.id == "ssr" || building.id == "sunrise";
    let base_rent = if premium { 8_000_000 } else { 5_000_000 };
    let monthly_rent = base_rent + (floor - 1) * 500_000 + rng.gen_range(0..3) * 1_000_000;
    let area = (if premium { 65 } else { 50 }) + rng.gen_range(0..20);

    // Buildings off the template rates price their rooms individually
    let custom_pricing = (building.electricity_rate != template.electricity_rate
        || building.water_rate != template.water_rate)
        .then(|| RoomPricing {
            use_custom_pricing: true,
            electricity_rate: Some(building.electricity_rate),
            water_rate: Some(building.water_rate),
            ..Default::default()
        });

    let water_billing = if rng.gen_bool(0.2) {
        WaterBilling::Flat {
            rate: DEFAULT_FLAT_WATER_RATE,
        }
    } else {
        WaterBilling::Metered
    };

    let tenant = (status != RoomStatus::Empty).then(|| generate_tenant(rng, today));
    let meter_readings = if tenant.is_some() {
        generate_readings(rng, last_read)
    } else {
        Vec::new()
    };

    Room {
        id,
        building_id: building.id.clone(),
        room_number,
        room_code,
        floor: Some(floor),
        status,
        monthly_rent: Dong::new(monthly_rent),
        area: Some(area),
        debt_amount: None,
        tenant,
        meter_readings,
        custom_pricing,
        water_billing,
    }
}

fn generate_tenant(rng: &mut StdRng, today: NaiveDate) -> Tenant {
    let name = format!(
        "{} {} {}",
        pick(rng, LAST_NAMES),
        pick(rng, MIDDLE_NAMES),
        pick(rng, FIRST_NAMES)
    );
    let phone = format!("{}{:07}", pick(rng, PHONE_PREFIXES), rng.gen_range(0..10_000_000));
    let id_number = format!(
        "{:03}{}{:08}",
        rng.gen_range(0..96),
        rng.gen_range(0..4),
        rng.gen_range(0..100_000_000)
    );

    // 1 to 36 months ago
    let move_in_date = today - Duration::days(rng.gen_range(30..=36 * 30));

    Tenant {
        id: seeded_uuid(rng),
        name,
        phone,
        id_number,
        move_in_date,
        deposit: Dong::new(rng.gen_range(1..=3) * 5_000_000),
        notes: rng
            .gen_bool(0.2)
            .then(|| "Khách quen, đóng tiền đúng hạn".to_string()),
        documents: TenantDocuments::default(),
    }
}

/// Six chained readings ending at `last`.
fn generate_readings(rng: &mut StdRng, last: BillingMonth) -> Vec<MeterReading> {
    let mut electricity = rng.gen_range(100..1_100);
    let mut water = rng.gen_range(10..60);

    (0..6)
        .rev()
        .map(|back| {
            let month = last.minus(back);
            let e_use = rng.gen_range(80..230);
            let w_use = rng.gen_range(3..11);
            let reading = MeterReading {
                month,
                electricity_prev: electricity,
                electricity_curr: electricity + e_use,
                water_prev: water,
                water_curr: water + w_use,
                recorded_at: morning(month.next().day(5)),
            };
            electricity += e_use;
            water += w_use;
            reading
        })
        .collect()
}

fn build_invoice(
    rng: &mut StdRng,
    room: &Room,
    template: &PricingTemplate,
    month: BillingMonth,
    id: String,
    paid: bool,
) -> Option<Invoice> {
    let tenant = room.tenant.as_ref()?;
    let reading = room.meter().for_month(month)?;
    let pricing = room.pricing(template);

    let result = compute_invoice(&CalculationInput {
        baseline: Baseline {
            electricity: reading.electricity_prev,
            water: reading.water_prev,
        },
        pricing: &pricing,
        new_electricity: Some(reading.electricity_curr),
        new_water: Some(reading.water_curr),
        water_billing: room.water_billing,
        monthly_rent: room.monthly_rent,
    });

    let due_date = month.due_date(INVOICE_DUE_DAY);
    let created_at = morning(month.next().day(rng.gen_range(1..=5)));
    let paid_date = paid.then(|| month.next().day(rng.gen_range(3..=15)));

    Some(Invoice {
        id,
        building_id: room.building_id.clone(),
        room_id: room.id,
        room_number: room.room_number.clone(),
        tenant_name: tenant.name.clone(),
        tenant_phone: tenant.phone.clone(),
        month,
        rent_amount: room.monthly_rent,
        electricity_usage: result.electricity_usage,
        electricity_amount: result.electricity_amount,
        water_usage: result.water_usage,
        water_amount: result.water_amount,
        other_fees: result.fees_total,
        total_amount: result.total,
        due_date,
        paid_date,
        created_at,
        notes: None,
    })
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

/// UUID v4 drawn from the seeded generator.
fn seeded_uuid(rng: &mut StdRng) -> String {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string()
}

fn morning(date: NaiveDate) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default();
    Utc.from_utc_datetime(&date.and_time(time))
}

// =============================================================================
// Unit Tests
// =============================================================================
