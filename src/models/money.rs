//! # models::money
//!
//! [`Amount`]: fixed-point currency value backed by `rust_decimal`.
//!
//! Every amount is rounded to the minor currency unit (2 decimal places) the
//! moment it enters the system, so summing thousands of expenses never drifts
//! the way `f64` would.  [`EPSILON`] is exactly one minor unit.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Decimal places of the minor currency unit (paise / cents).
pub const MINOR_UNIT_DP: u32 = 2;

/// Tolerance for treating an amount as zero: one minor currency unit (0.01).
pub const EPSILON: Amount = Amount(Decimal::from_parts(1, 0, 0, false, MINOR_UNIT_DP));

/// Largest amount an expense may carry: 10^15 (10^17 minor units).
pub const MAX_AMOUNT: Amount =
    Amount(Decimal::from_parts(1_569_325_056, 23_283_064, 0, false, MINOR_UNIT_DP));

// ─── Amount ───────────────────────────────────────────────────────────────────

/// A signed currency amount with minor-unit precision.
///
/// Persisted and sent over the wire as a plain JSON number (`300.5`), the same
/// shape the stored `expenses` blob has always used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Build from a decimal, rounding half-away-from-zero to the minor unit.
    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp_with_strategy(MINOR_UNIT_DP, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Build from an integer count of minor units, e.g. `from_minor(12_345)` = 123.45.
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, MINOR_UNIT_DP))
    }

    /// Build from a float, rejecting NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Decimal::from_f64(value).map(Self::new)
    }

    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    pub fn decimal(self) -> Decimal {
        self.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// `true` when the amount is within ±ε of zero.
    pub fn is_negligible(self) -> bool {
        self.abs() <= EPSILON
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Amount {
    type Output = Amount;
    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Amount {
    type Output = Amount;
    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Amount) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.copied().sum()
    }
}

// ─── Serde ────────────────────────────────────────────────────────────────────

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Amount::from_f64(raw)
            .ok_or_else(|| de::Error::custom(format!("invalid currency amount: {raw}")))
    }
}
