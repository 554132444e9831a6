//! # Unit Types
//!
//! Type-safe wrappers for the two quantities the allocation method juggles:
//! money and percentages. They are plain `f64` newtypes that serialize as
//! bare numbers, so the JSON stays clean.
//!
//! Operational-unit quantities (machine hours, labour hours, kilograms...)
//! stay raw `f64`: their unit is a per-center label, not a type.
//!
//! ## Example
//!
//! ```rust
//! use cost_core::units::{Amount, Percent};
//!
//! let rent = Amount(100_000.0);
//! let share = Percent(40.0);
//! assert_eq!(share.of(rent), Amount(40_000.0));
//!
//! let rate = Amount(12_000.0) / 250.0;
//! assert_eq!(rate, Amount(48.0));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul};

// ============================================================================
// Money
// ============================================================================

/// An amount of money in the project currency.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub f64);

impl Amount {
    /// Zero currency units
    pub const ZERO: Amount = Amount(0.0);

    /// Raw value
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether two amounts agree within `tolerance` currency units.
    pub fn approx_eq(self, other: Amount, tolerance: f64) -> bool {
        (self.0 - other.0).abs() <= tolerance
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

/// Scale by a dimensionless factor (or by a consumption quantity).
impl Mul<f64> for Amount {
    type Output = Amount;
    fn mul(self, rhs: f64) -> Amount {
        Amount(self.0 * rhs)
    }
}

/// Divide by an operational-unit quantity to get a per-unit rate.
impl Div<f64> for Amount {
    type Output = Amount;
    fn div(self, rhs: f64) -> Amount {
        Amount(self.0 / rhs)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc + *a)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*}", p, self.0),
            None => write!(f, "{:.2}", self.0),
        }
    }
}

// ============================================================================
// Percentages
// ============================================================================

/// A percentage on the 0–100 scale used by allocation keys.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(pub f64);

impl Percent {
    /// A full share (100 %)
    pub const FULL: Percent = Percent(100.0);

    pub fn value(self) -> f64 {
        self.0
    }

    /// Fraction on the 0–1 scale
    pub fn fraction(self) -> f64 {
        self.0 / 100.0
    }

    /// Apply this share to an amount: `amount × (pct / 100)`.
    ///
    /// The fraction is taken first so a share of at most 100 % never
    /// overflows a finite amount.
    pub fn of(self, amount: Amount) -> Amount {
        Amount(amount.0 * self.fraction())
    }

    /// Whether this percentage is within `tolerance` points of 100.
    pub fn is_full(self, tolerance: f64) -> bool {
        (self.0 - Percent::FULL.0).abs() <= tolerance
    }
}

impl Add for Percent {
    type Output = Percent;
    fn add(self, rhs: Percent) -> Percent {
        Percent(self.0 + rhs.0)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}
