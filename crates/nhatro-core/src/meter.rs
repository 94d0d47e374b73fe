//! # Meter Reading Store
//!
//! Rules over a room's append-only meter history.
//!
//! ## Carry-Forward
//! ```text
//!   2025-04            2025-05            2025-06 (being billed)
//!  ┌────────────┐     ┌────────────┐     ┌────────────┐
//!  │ prev  880  │     │ prev 1000  │     │ prev 1120  │ ◄── baseline = last curr
//!  │ curr 1000  │────►│ curr 1120  │────►│ curr  ???  │ ◄── entered by operator
//!  └────────────┘     └────────────┘     └────────────┘
//! ```
//!
//! The last reading's `curr` values are the baseline for the next billing
//! cycle. A room that has never been read has a zero baseline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{BillingMonth, MeterReading};
use crate::validation::ValidationResult;

/// Opening meter values for a billing cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Baseline {
    pub electricity: i64,
    pub water: i64,
}

impl From<&MeterReading> for Baseline {
    fn from(r: &MeterReading) -> Self {
        Baseline {
            electricity: r.electricity_curr,
            water: r.water_curr,
        }
    }
}

/// Read-only view over a chronological slice of readings.
#[derive(Debug, Clone, Copy)]
pub struct MeterHistory<'a> {
    readings: &'a [MeterReading],
}

impl<'a> MeterHistory<'a> {
    pub fn new(readings: &'a [MeterReading]) -> Self {
        MeterHistory { readings }
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Most recent reading.
    pub fn last(&self) -> Option<&'a MeterReading> {
        self.readings.last()
    }

    pub fn for_month(&self, month: BillingMonth) -> Option<&'a MeterReading> {
        self.readings.iter().find(|r| r.month == month)
    }

    /// Baseline from the most recent reading (zeros when none).
    pub fn baseline(&self) -> Baseline {
        self.last().map(Baseline::from).unwrap_or_default()
    }

    /// Baseline for billing `month`: the closing values of the latest
    /// reading strictly before it.
    ///
    /// Equal to [`baseline`](Self::baseline) in the normal flow; differs only
    /// when `month` has already been read and is being billed again.
    pub fn baseline_for(&self, month: BillingMonth) -> Baseline {
        self.readings
            .iter()
            .rev()
            .find(|r| r.month < month)
            .map(Baseline::from)
            .unwrap_or_default()
    }

    /// Checks that `reading` can be appended (or replace the latest
    /// reading of the same month) without breaking the history.
    ///
    /// ## Rules
    /// - All values non-negative
    /// - `curr ≥ prev` for both meters
    /// - Month is after every existing reading, or equal to the latest one
    /// - `prev` continues from the preceding reading's `curr`, unless the
    ///   meter was replaced (`prev` restarts at `curr`, below the old value)
    /// - The opening reading of a history may start anywhere
    pub fn validate_append(&self, reading: &MeterReading) -> ValidationResult<()> {
        for (field, value) in [
            ("electricity_prev", reading.electricity_prev),
            ("electricity_curr", reading.electricity_curr),
            ("water_prev", reading.water_prev),
            ("water_curr", reading.water_curr),
        ] {
            if value < 0 {
                return Err(ValidationError::negative(field));
            }
        }

        let out_of_order = |reason: String| ValidationError::MeterOutOfOrder {
            month: reading.month.to_string(),
            reason,
        };

        if reading.electricity_curr < reading.electricity_prev {
            return Err(out_of_order(format!(
                "electricity {} < {}",
                reading.electricity_curr, reading.electricity_prev
            )));
        }
        if reading.water_curr < reading.water_prev {
            return Err(out_of_order(format!(
                "water {} < {}",
                reading.water_curr, reading.water_prev
            )));
        }

        if let Some(last) = self.last() {
            if reading.month < last.month {
                return Err(out_of_order(format!(
                    "a later reading exists for {}",
                    last.month
                )));
            }
        }

        let Some(before) = self
            .readings
            .iter()
            .rev()
            .find(|r| r.month < reading.month)
            .map(Baseline::from)
        else {
            return Ok(());
        };
        let continues = |prev: i64, curr: i64, expected: i64| {
            prev == expected || (prev == curr && curr < expected)
        };
        if !continues(reading.electricity_prev, reading.electricity_curr, before.electricity) {
            return Err(out_of_order(format!(
                "electricity starts at {}, previous reading closed at {}",
                reading.electricity_prev, before.electricity
            )));
        }
        if !continues(reading.water_prev, reading.water_curr, before.water) {
            return Err(out_of_order(format!(
                "water starts at {}, previous reading closed at {}",
                reading.water_prev, before.water
            )));
        }

        Ok(())
    }
}

impl MeterReading {
    /// Builds the reading recorded when a month is billed.
    ///
    /// A new value below the baseline means the meter was replaced; the
    /// reading then restarts from the new value so that usage stays zero
    /// and the next cycle carries the new meter forward.
    pub fn next(
        month: BillingMonth,
        baseline: Baseline,
        new_electricity: i64,
        new_water: i64,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        MeterReading {
            month,
            electricity_prev: baseline.electricity.min(new_electricity),
            electricity_curr: new_electricity,
            water_prev: baseline.water.min(new_water),
            water_curr: new_water,
            recorded_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(month: &str, e: (i64, i64), w: (i64, i64)) -> MeterReading {
        MeterReading {
            month: month.parse().unwrap(),
            electricity_prev: e.0,
            electricity_curr: e.1,
            water_prev: w.0,
            water_curr: w.1,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_history_has_zero_baseline() {
        let history = MeterHistory::new(&[]);
        assert!(history.is_empty());
        assert_eq!(history.baseline(), Baseline::default());
    }

    #[test]
    fn test_baseline_is_last_curr() {
        let readings = vec![
            reading("2025-04", (880, 1000), (40, 45)),
            reading("2025-05", (1000, 1120), (45, 50)),
        ];
        let history = MeterHistory::new(&readings);

        assert_eq!(
            history.baseline(),
            Baseline {
                electricity: 1120,
                water: 50
            }
        );
        assert_eq!(
            history.baseline_for("2025-06".parse().unwrap()),
            history.baseline()
        );
        // Re-billing May starts from April's close
        assert_eq!(
            history.baseline_for("2025-05".parse().unwrap()),
            Baseline {
                electricity: 1000,
                water: 45
            }
        );
    }

    #[test]
    fn test_validate_append_ordering() {
        let readings = vec![
            reading("2025-04", (880, 1000), (40, 45)),
            reading("2025-05", (1000, 1120), (45, 50)),
        ];
        let history = MeterHistory::new(&readings);

        assert!(history
            .validate_append(&reading("2025-06", (1120, 1200), (50, 55)))
            .is_ok());
        // Replacing the latest month is allowed
        assert!(history
            .validate_append(&reading("2025-05", (1000, 1130), (45, 51)))
            .is_ok());
        // Older month is not
        assert!(history
            .validate_append(&reading("2025-04", (900, 1000), (40, 45)))
            .is_err());
    }

    #[test]
    fn test_validate_append_rejects_decrease_and_negative() {
        let history = MeterHistory::new(&[]);
        assert!(history
            .validate_append(&reading("2025-06", (1200, 1100), (50, 55)))
            .is_err());
        assert!(history
            .validate_append(&reading("2025-06", (-1, 10), (0, 0)))
            .is_err());
    }

    #[test]
    fn test_validate_append_requires_continuity() {
        let readings = vec![reading("2025-05", (1000, 1120), (45, 50))];
        let history = MeterHistory::new(&readings);

        // Gap between May's close and June's open
        assert!(history
            .validate_append(&reading("2025-06", (1100, 1200), (50, 55)))
            .is_err());
        // Opening reading takes whatever the meter shows
        assert!(MeterHistory::new(&[])
            .validate_append(&reading("2025-06", (830, 900), (12, 15)))
            .is_ok());
    }

    #[test]
    fn test_next_reading_handles_meter_replacement() {
        let month = "2025-06".parse().unwrap();
        let base = Baseline {
            electricity: 500,
            water: 50,
        };

        let normal = MeterReading::next(month, base, 620, 55, Utc::now());
        assert_eq!(normal.electricity_prev, 500);
        assert_eq!(normal.electricity_usage(), 120);

        let replaced = MeterReading::next(month, base, 480, 55, Utc::now());
        assert_eq!(replaced.electricity_prev, 480);
        assert_eq!(replaced.electricity_usage(), 0);

        let readings = vec![reading("2025-05", (400, 500), (45, 50))];
        assert!(MeterHistory::new(&readings).validate_append(&replaced).is_ok());
        assert!(MeterHistory::new(&readings).validate_append(&normal).is_ok());
    }
}
