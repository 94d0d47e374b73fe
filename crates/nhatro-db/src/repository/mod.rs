//! # Repository Module
//!
//! One repository per aggregate, each a thin handle over the shared pool.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Manager command                                                        │
//! │       │  db.invoices().publish_draft(&draft, &reading)                 │
//! │       ▼                                                                 │
//! │  InvoiceRepository ──┐                                                  │
//! │  RoomRepository   ◄──┘ shared helpers run inside the same transaction  │
//! │       │                (record_reading, refresh_balance)               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BuildingRepository`](building::BuildingRepository) - building list
//! - [`RoomRepository`](room::RoomRepository) - rooms, tenants, readings, documents
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - publish, payment, history
//! - [`RequestRepository`](request::RequestRepository) - customer requests
//! - [`NotificationRepository`](notification::NotificationRepository) - operator feed
//! - [`SettingsRepository`](settings::SettingsRepository) - pricing template, profile

pub mod building;
pub mod invoice;
pub mod notification;
pub mod request;
pub mod room;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the repository tests.

    use chrono::{TimeZone, Utc};
    use nhatro_core::{
        Building, Dong, MeterReading, Room, RoomStatus, Tenant, TenantDocuments, WaterBilling,
    };

    use crate::pool::{Database, DbConfig};

    pub async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn building(id: &str) -> Building {
        Building {
            id: id.to_string(),
            name: format!("Tòa {}", id.to_uppercase()),
            short_name: id.to_uppercase(),
            address: "12 Nguyễn Văn Linh, Quận 7".to_string(),
            total_rooms: 10,
            floors: 3,
            electricity_rate: Dong::new(3_500),
            water_rate: Dong::new(15_000),
        }
    }

    pub fn empty_room(id: i64, building_id: &str, number: &str) -> Room {
        Room {
            id,
            building_id: building_id.to_string(),
            room_number: number.to_string(),
            room_code: None,
            floor: Some(1),
            status: RoomStatus::Empty,
            monthly_rent: Dong::new(4_000_000),
            area: Some(25),
            debt_amount: None,
            tenant: None,
            meter_readings: vec![],
            custom_pricing: None,
            water_billing: WaterBilling::Metered,
        }
    }

    /// Occupied since 2024-06-01 with one April 2025 reading (1000→1100 kWh, 50→55 m³).
    pub fn occupied_room(id: i64, building_id: &str, number: &str) -> Room {
        let mut room = empty_room(id, building_id, number);
        room.status = RoomStatus::Paid;
        room.monthly_rent = Dong::new(5_000_000);
        room.tenant = Some(Tenant {
            id: format!("tenant-{}", id),
            name: "Nguyễn Văn An".to_string(),
            phone: "0901234567".to_string(),
            id_number: "079123456789".to_string(),
            move_in_date: "2024-06-01".parse().unwrap(),
            deposit: Dong::new(5_000_000),
            notes: None,
            documents: TenantDocuments::default(),
        });
        room.meter_readings = vec![MeterReading {
            month: "2025-04".parse().unwrap(),
            electricity_prev: 1000,
            electricity_curr: 1100,
            water_prev: 50,
            water_curr: 55,
            recorded_at: Utc.with_ymd_and_hms(2025, 4, 30, 8, 0, 0).unwrap(),
        }];
        room
    }
}
