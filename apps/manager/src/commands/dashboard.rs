//! # Dashboard Commands
//!
//! Overview figures for the landing page and the building picker.

use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use nhatro_core::stats::{BuildingStats, DashboardStats};
use nhatro_core::Building;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingDto {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub address: String,
    pub total_rooms: i64,
    pub floors: i64,
    pub electricity_rate: i64,
    pub water_rate: i64,
}

impl From<Building> for BuildingDto {
    fn from(b: Building) -> Self {
        BuildingDto {
            id: b.id,
            name: b.name,
            short_name: b.short_name,
            address: b.address,
            total_rooms: b.total_rooms,
            floors: b.floors,
            electricity_rate: b.electricity_rate.amount(),
            water_rate: b.water_rate.amount(),
        }
    }
}

pub async fn list_buildings(db: &DbState) -> Result<Vec<BuildingDto>, ApiError> {
    let buildings = db.inner().buildings().list().await?;
    Ok(buildings.into_iter().map(BuildingDto::from).collect())
}

/// Revenue, vacancy, unpaid invoices and expiring contracts.
pub async fn get_dashboard_stats(db: &DbState, config: &ConfigState) -> Result<DashboardStats, ApiError> {
    let rooms = db.inner().rooms().list().await?;
    let invoices = db.inner().invoices().list().await?;

    let stats = DashboardStats::compute(&rooms, &invoices, config.today(), config.expiring_window_days);
    debug!(?stats, "get_dashboard_stats command");
    Ok(stats)
}

/// Room counts and revenue for one building, or all of them.
pub async fn get_building_stats(db: &DbState, building_id: Option<&str>) -> Result<BuildingStats, ApiError> {
    let rooms = match building_id {
        Some(id) => {
            // Surface an unknown building as NOT_FOUND rather than zeros
            db.inner().buildings().get(id).await?;
            db.inner().rooms().list_by_building(id).await?
        }
        None => db.inner().rooms().list().await?,
    };
    Ok(BuildingStats::compute(&rooms, building_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::fixture;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_dashboard_matches_seed() {
        let fx = fixture().await;
        let stats = get_dashboard_stats(&fx.db, &fx.config).await.unwrap();

        assert_eq!(stats.total_rooms, 208);
        assert_eq!(stats.total_rooms, stats.empty_rooms + stats.occupied_rooms);

        let unpaid = fx.db.inner().invoices().list_unpaid().await.unwrap();
        assert_eq!(stats.unpaid_invoices, unpaid.len());
    }

    #[tokio::test]
    async fn test_building_stats_sum_to_total() {
        let fx = fixture().await;
        let buildings = list_buildings(&fx.db).await.unwrap();
        assert_eq!(buildings.len(), 5);

        let all = get_building_stats(&fx.db, None).await.unwrap();
        let mut total = 0;
        for b in &buildings {
            let stats = get_building_stats(&fx.db, Some(&b.id)).await.unwrap();
            assert_eq!(stats.total, stats.empty + stats.paid + stats.debt);
            total += stats.total;
        }
        assert_eq!(total, all.total);
    }

    #[tokio::test]
    async fn test_unknown_building() {
        let fx = fixture().await;
        let err = get_building_stats(&fx.db, Some("nowhere")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
