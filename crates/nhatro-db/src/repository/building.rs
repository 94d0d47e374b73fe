//! # Building Repository
//!
//! Buildings are reference data: loaded by the seeder, read by every page.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use nhatro_core::{Building, Dong};

#[derive(Debug, Clone)]
pub struct BuildingRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct BuildingRow {
    id: String,
    name: String,
    short_name: String,
    address: String,
    total_rooms: i64,
    floors: i64,
    electricity_rate: i64,
    water_rate: i64,
}

impl From<BuildingRow> for Building {
    fn from(row: BuildingRow) -> Self {
        Building {
            id: row.id,
            name: row.name,
            short_name: row.short_name,
            address: row.address,
            total_rooms: row.total_rooms,
            floors: row.floors,
            electricity_rate: Dong::new(row.electricity_rate),
            water_rate: Dong::new(row.water_rate),
        }
    }
}

impl BuildingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BuildingRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Building>> {
        let rows = sqlx::query_as::<_, BuildingRow>(
            r#"
            SELECT id, name, short_name, address, total_rooms, floors,
                   electricity_rate, water_rate
            FROM buildings
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded buildings");
        Ok(rows.into_iter().map(Building::from).collect())
    }

    pub async fn get(&self, id: &str) -> DbResult<Building> {
        let row = sqlx::query_as::<_, BuildingRow>(
            r#"
            SELECT id, name, short_name, address, total_rooms, floors,
                   electricity_rate, water_rate
            FROM buildings
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Building", id))?;

        Ok(row.into())
    }

    pub async fn insert(&self, building: &Building) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO buildings (
                id, name, short_name, address, total_rooms, floors,
                electricity_rate, water_rate
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&building.id)
        .bind(&building.name)
        .bind(&building.short_name)
        .bind(&building.address)
        .bind(building.total_rooms)
        .bind(building.floors)
        .bind(building.electricity_rate.amount())
        .bind(building.water_rate.amount())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, building.id.clone()),
            other => other,
        })?;

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM buildings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
