//! # Configuration State
//!
//! Read-only settings the commands need at call time: the receiving bank
//! account, billing knobs and the clock.
//!
//! Pricing, business profile and notification preferences are not here;
//! they are edited from the settings page and live in the database.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;

use crate::config::{BillingSettings, ManagerConfig};
use nhatro_core::Dong;
use nhatro_gateway::BankAccount;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    pub bank: BankAccount,

    /// đ per month used when a room is switched to flat water.
    pub default_flat_water_rate: Dong,

    pub expiring_window_days: i64,

    pub history_limit: u32,

    /// Pinned date; `None` follows the local clock.
    pub fixed_today: Option<NaiveDate>,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState::from_config(&ManagerConfig::default())
    }
}

impl ConfigState {
    pub fn from_config(config: &ManagerConfig) -> Self {
        let BillingSettings {
            default_flat_water_rate,
            expiring_window_days,
            history_limit,
            fixed_today,
        } = config.billing.clone();

        ConfigState {
            bank: config.bank.clone(),
            default_flat_water_rate: Dong::new(default_flat_water_rate),
            expiring_window_days,
            history_limit,
            fixed_today,
        }
    }

    /// Date used for overdue status and contract expiry.
    pub fn today(&self) -> NaiveDate {
        self.fixed_today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Current instant; on a pinned date, that date at the current time.
    pub fn now(&self) -> DateTime<Utc> {
        let now = Utc::now();
        self.fixed_today
            .map(|date| date.and_time(now.time()).and_utc())
            .unwrap_or(now)
    }

    /// Formats a đồng amount the way the dashboard shows it.
    ///
    /// ```rust,ignore
    /// assert_eq!(config.format_currency(1_234_567), "1.234.567đ");
    /// ```
    pub fn format_currency(&self, amount: i64) -> String {
        Dong::new(amount).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(1_234_567), "1.234.567đ");
        assert_eq!(config.format_currency(0), "0đ");
        assert_eq!(config.format_currency(-50_000), "-50.000đ");
    }

    #[test]
    fn test_fixed_today_wins() {
        let mut manager = ManagerConfig::default();
        manager.billing.fixed_today = "2025-06-15".parse().ok();

        let config = ConfigState::from_config(&manager);
        assert_eq!(config.today(), NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
        assert_eq!(config.now().date_naive(), config.today());
        assert_eq!(config.default_flat_water_rate, Dong::new(100_000));
    }
}
