//! Fixed-point amount primitives: `Money` and `Percent`.
//!
//! Both types hold their value as a scaled integer (two fractional digits),
//! so ledger arithmetic never touches floating point and never loses a cent.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minor units per major currency unit (cents per whole).
pub const MINOR_PER_MAJOR: i64 = 100;

/// Signed monetary amount stored in minor units.
///
/// Serializes as the raw minor-unit integer; `Display` and `FromStr` use the
/// human form (`"12.34"`, `"-0.50"`).
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Builds an amount from minor units (cents).
    pub fn from_minor(units: i64) -> Self {
        Self(units)
    }

    /// Builds an amount from whole major units.
    pub fn from_major(units: i64) -> Self {
        Self(units * MINOR_PER_MAJOR)
    }

    /// Returns the amount in minor units.
    pub fn minor_units(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, magnitude / 100, magnitude % 100)
    }
}

impl FromStr for Money {
    type Err = FixedPointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_hundredths(input).map(Money)
    }
}

/// Percentage with two fractional digits, stored in hundredths of a percent
/// (basis points): `Percent::from_str("33.33")` holds `3333`.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct Percent(i64);

impl Percent {
    pub const ZERO: Percent = Percent(0);
    /// Exactly one hundred percent.
    pub const FULL: Percent = Percent(10_000);

    /// Builds a percentage from basis points (hundredths of a percent).
    pub fn from_basis_points(points: i64) -> Self {
        Self(points)
    }

    /// Builds a percentage from a whole-number percent value.
    pub fn from_whole(percent: i64) -> Self {
        Self(percent * 100)
    }

    pub fn basis_points(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Applies the percentage to an amount, rounding toward negative
    /// infinity to the minor unit. `33.33%` of `100.00` is `33.33`.
    pub fn of(self, amount: Money) -> Money {
        let scaled = amount.minor_units() as i128 * self.0 as i128;
        Money::from_minor(scaled.div_euclid(10_000) as i64)
    }
}

impl Add for Percent {
    type Output = Percent;

    fn add(self, rhs: Percent) -> Percent {
        Percent(self.0 + rhs.0)
    }
}

impl Sum for Percent {
    fn sum<I: Iterator<Item = Percent>>(iter: I) -> Percent {
        iter.fold(Percent::ZERO, Add::add)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, magnitude / 100, magnitude % 100)
    }
}

impl FromStr for Percent {
    type Err = FixedPointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_hundredths(input).map(Percent)
    }
}

/// Errors raised when parsing `Money` or `Percent` literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedPointParseError {
    Invalid,
    TooManyDecimals,
    OutOfRange,
}

impl fmt::Display for FixedPointParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FixedPointParseError::Invalid => "not a decimal literal",
            FixedPointParseError::TooManyDecimals => "more than two decimal places",
            FixedPointParseError::OutOfRange => "value out of range",
        };
        f.write_str(label)
    }
}

impl std::error::Error for FixedPointParseError {}

/// Parses a decimal literal with up to two fractional digits into a scaled
/// integer (`"12.3"` becomes `1230`).
fn parse_hundredths(input: &str) -> Result<i64, FixedPointParseError> {
    let (negative, rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let (whole, fraction) = match rest.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (rest, None),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FixedPointParseError::Invalid);
    }
    let whole: i64 = whole.parse().map_err(|_| FixedPointParseError::OutOfRange)?;
    let fraction = match fraction {
        None => 0,
        Some(digits) => {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(FixedPointParseError::Invalid);
            }
            if digits.len() > 2 {
                return Err(FixedPointParseError::TooManyDecimals);
            }
            let value: i64 = digits.parse().map_err(|_| FixedPointParseError::Invalid)?;
            if digits.len() == 1 {
                value * 10
            } else {
                value
            }
        }
    };
    let magnitude = whole
        .checked_mul(100)
        .and_then(|scaled| scaled.checked_add(fraction))
        .ok_or(FixedPointParseError::OutOfRange)?;
    Ok(if negative { -magnitude } else { magnitude })
}
