//! # Settings Repository
//!
//! Key/value store for the settings page. Values are JSON so each setting
//! keeps its own shape; a missing key reads as the type's default.
//!
//! | Key                        | Type                       |
//! |----------------------------|----------------------------|
//! | `pricing_template`         | `PricingTemplate`          |
//! | `business_profile`         | `BusinessProfile`          |
//! | `notification_preferences` | `NotificationPreferences`  |

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use nhatro_core::{BusinessProfile, NotificationPreferences, PricingTemplate};

const PRICING_TEMPLATE: &str = "pricing_template";
const BUSINESS_PROFILE: &str = "business_profile";
const NOTIFICATION_PREFERENCES: &str = "notification_preferences";

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    async fn get<T: DeserializeOwned + Default>(&self, key: &str) -> DbResult<T> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match value {
            None => Ok(T::default()),
            Some(json) => serde_json::from_str(&json).map_err(|e| DbError::corrupt(key, e)),
        }
    }

    async fn put<T: Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        let json = serde_json::to_string(value)?;
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(key, "Setting saved");
        Ok(())
    }

    /// Global default rates and fees.
    pub async fn pricing_template(&self) -> DbResult<PricingTemplate> {
        self.get(PRICING_TEMPLATE).await
    }

    pub async fn set_pricing_template(&self, template: &PricingTemplate) -> DbResult<()> {
        info!(
            electricity_rate = %template.electricity_rate,
            water_rate = %template.water_rate,
            "Pricing template updated"
        );
        self.put(PRICING_TEMPLATE, template).await
    }

    pub async fn business_profile(&self) -> DbResult<BusinessProfile> {
        self.get(BUSINESS_PROFILE).await
    }

    pub async fn set_business_profile(&self, profile: &BusinessProfile) -> DbResult<()> {
        self.put(BUSINESS_PROFILE, profile).await
    }

    pub async fn notification_preferences(&self) -> DbResult<NotificationPreferences> {
        self.get(NOTIFICATION_PREFERENCES).await
    }

    pub async fn set_notification_preferences(&self, prefs: &NotificationPreferences) -> DbResult<()> {
        self.put(NOTIFICATION_PREFERENCES, prefs).await
    }
}
