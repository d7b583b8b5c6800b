//! Fixed-point money and rate arithmetic.
//!
//! Balances compound for up to ~70 years, so every monetary amount is held as
//! integer cents and every rate as integer millionths. Conversion to `f64`
//! happens only at the serialization boundary.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A signed amount of money in cents.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole dollars, convenient for literals in tests and defaults.
    pub const fn dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    /// Non-finite input maps to zero.
    pub fn from_dollars(dollars: f64) -> Self {
        if !dollars.is_finite() {
            return Self::ZERO;
        }
        Self((dollars * 100.0).round() as i64)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub fn as_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self × rate`, rounded half away from zero to the nearest cent.
    pub fn scale(self, rate: Rate) -> Self {
        Self(saturate(div_round(
            self.0 as i128 * rate.0 as i128,
            Rate::UNIT as i128,
        )))
    }

    /// `self × (1 + rate)`.
    pub fn grow(self, rate: Rate) -> Self {
        self + self.scale(rate)
    }

    /// `self × numerator / denominator`; a zero denominator yields zero.
    pub fn mul_div(self, numerator: i64, denominator: i64) -> Self {
        Self(saturate(div_round(
            self.0 as i128 * numerator as i128,
            denominator as i128,
        )))
    }

    pub fn times(self, n: i64) -> Self {
        Self(self.0.saturating_mul(n))
    }
}

/// Amounts past the i64 range pin to its ends instead of wrapping.
fn saturate(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Integer division rounded half away from zero.
fn div_round(numerator: i128, denominator: i128) -> i128 {
    if denominator == 0 {
        return 0;
    }
    let (numerator, denominator) = if denominator < 0 {
        (-numerator, -denominator)
    } else {
        (numerator, denominator)
    };
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Cents) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Cents {
    type Output = Cents;

    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Cents {
    fn sub_assign(&mut self, rhs: Cents) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Cents> for Cents {
    fn sum<I: Iterator<Item = &'a Cents>>(iter: I) -> Cents {
        iter.copied().sum()
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Cents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_dollars())
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Cents::from_dollars)
    }
}

/// A rate held in millionths: `Rate::UNIT` is 100%.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rate(i64);

impl Rate {
    pub const UNIT: i64 = 1_000_000;
    pub const ZERO: Rate = Rate(0);

    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Percent to rate, e.g. `4.0` -> 4%. Non-finite input maps to zero.
    pub fn from_percent(percent: f64) -> Self {
        if !percent.is_finite() {
            return Self::ZERO;
        }
        Self((percent * (Self::UNIT as f64 / 100.0)).round() as i64)
    }

    pub const fn micros(self) -> i64 {
        self.0
    }

    pub fn as_percent(self) -> f64 {
        self.0 as f64 * 100.0 / Self::UNIT as f64
    }

    pub fn as_fraction(self) -> f64 {
        self.0 as f64 / Self::UNIT as f64
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for Rate {
    type Output = Rate;

    fn add(self, rhs: Rate) -> Rate {
        Rate(self.0 + rhs.0)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percent())
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_percent())
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Rate::from_percent)
    }
}
