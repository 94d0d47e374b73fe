//! # Money Module
//!
//! Provides the `Dong` type for Vietnamese đồng amounts.
//!
//! ## Why a Newtype?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE ĐỒNG HAS NO MINOR UNIT                                             │
//! │                                                                         │
//! │  Rent:          5.000.000đ   → Dong(5_000_000)                          │
//! │  Electricity:   120 kWh × 3.500đ = 420.000đ                              │
//! │  Water:         5 m³ × 15.000đ  = 75.000đ                                │
//! │                                                                         │
//! │  Every amount is a whole number of đồng. A plain i64 would work, but   │
//! │  the newtype keeps meter counts (kWh, m³) from being added to money.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use nhatro_core::money::Dong;
//!
//! let rate = Dong::new(3_500);
//! let amount = rate * 120;            // 420.000đ
//! assert_eq!(amount.to_string(), "420.000đ");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

// =============================================================================
// Dong Type
// =============================================================================

/// An amount of Vietnamese đồng.
///
/// Stored as a signed integer so that arithmetic never panics on
/// intermediate values, but every amount the system produces is ≥ 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Dong(i64);

impl Dong {
    /// Creates an amount from a whole number of đồng.
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Dong(amount)
    }

    /// Returns the raw number of đồng.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Zero đồng.
    #[inline]
    pub const fn zero() -> Self {
        Dong(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit rate by a metered quantity (kWh, m³).
    ///
    /// ## Example
    /// ```rust
    /// use nhatro_core::money::Dong;
    ///
    /// let water = Dong::new(15_000).times(5);
    /// assert_eq!(water.amount(), 75_000);
    /// ```
    #[inline]
    pub const fn times(&self, quantity: i64) -> Self {
        Dong(self.0.saturating_mul(quantity))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Formats the amount the way the dashboard shows it: `vi-VN` digit
/// grouping with `.` separators and a trailing `đ`.
///
/// ```text
/// 0          → 0đ
/// 130000     → 130.000đ
/// 5625000    → 5.625.000đ
/// -1500000   → -1.500.000đ
/// ```
impl fmt::Display for Dong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}đ", sign, grouped)
    }
}

impl Default for Dong {
    fn default() -> Self {
        Dong::zero()
    }
}

impl Add for Dong {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Dong(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Dong {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Dong {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Dong(self.0.saturating_sub(other.0))
    }
}

/// Rate × usage.
impl Mul<i64> for Dong {
    type Output = Self;

    #[inline]
    fn mul(self, quantity: i64) -> Self {
        self.times(quantity)
    }
}

impl Sum for Dong {
    fn sum<I: Iterator<Item = Dong>>(iter: I) -> Self {
        iter.fold(Dong::zero(), |acc, d| acc + d)
    }
}

impl<'a> Sum<&'a Dong> for Dong {
    fn sum<I: Iterator<Item = &'a Dong>>(iter: I) -> Self {
        iter.fold(Dong::zero(), |acc, d| acc + *d)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
