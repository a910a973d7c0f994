//! Precision-safe decimal types for trading.
//!
//! Uses `rust_decimal` for exact decimal arithmetic, avoiding
//! floating-point rounding errors in fill and cost calculations.
//!
//! Venue APIs deliver numbers as strings or floats that may be empty,
//! `NaN` or infinite. Those never become a `Decimal`: [`parse_decimal`]
//! and [`finite_decimal`] map them to `None`, which is the "absent" value
//! used for missing fees and funding rates.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to provide type safety and prevent mixing
/// prices with sizes in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Price moved by `bps` basis points (negative moves down).
    ///
    /// `None` when the result does not fit in a `Decimal`.
    #[inline]
    pub fn offset_bps(&self, bps: Decimal) -> Option<Self> {
        self.0
            .checked_mul(bps)
            .and_then(|delta| delta.checked_div(Decimal::from(10000)))
            .and_then(|delta| self.0.checked_add(delta))
            .map(Self)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// Size/quantity with exact decimal precision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Subtract without going below zero.
    #[inline]
    pub fn saturating_sub(&self, rhs: Size) -> Self {
        if rhs.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - rhs.0)
        }
    }

    /// Add, clamping at `Decimal::MAX` instead of overflowing.
    #[inline]
    pub fn saturating_add(&self, rhs: Size) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Size {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Size {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Convert a float from a venue payload, rejecting `NaN` and infinities.
pub fn finite_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}

/// Parse a numeric string from a venue payload.
///
/// Accepts plain and scientific notation. Empty strings, `NaN`, `inf`
/// and anything else unparsable yield `None`.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_offset_bps() {
        let price = Price::new(dec!(2000));
        assert_eq!(price.offset_bps(dec!(50)), Some(Price::new(dec!(2010))));
        assert_eq!(price.offset_bps(dec!(-50)), Some(Price::new(dec!(1990))));
    }

    #[test]
    fn test_price_offset_bps_overflow() {
        let price = Price::new(Decimal::MAX / dec!(10));
        assert!(price.offset_bps(dec!(50)).is_none());
        assert!(Price::new(Decimal::MAX).offset_bps(dec!(1)).is_none());
    }

    #[test]
    fn test_size_saturating_sub() {
        let size = Size::new(dec!(3));
        assert_eq!(size.saturating_sub(Size::new(dec!(1))), Size::new(dec!(2)));
        assert_eq!(size.saturating_sub(Size::new(dec!(5))), Size::ZERO);
    }

    #[test]
    fn test_size_saturating_add() {
        let size = Size::new(dec!(1.5));
        assert_eq!(size.saturating_add(Size::new(dec!(2))), Size::new(dec!(3.5)));
        assert_eq!(
            Size::new(Decimal::MAX).saturating_add(Size::new(dec!(1))),
            Size::new(Decimal::MAX)
        );
    }

    #[test]
    fn test_finite_decimal_rejects_non_finite() {
        assert_eq!(finite_decimal(0.0001), Some(dec!(0.0001)));
        assert!(finite_decimal(f64::NAN).is_none());
        assert!(finite_decimal(f64::INFINITY).is_none());
        assert!(finite_decimal(f64::NEG_INFINITY).is_none());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("0.0001"), Some(dec!(0.0001)));
        assert_eq!(parse_decimal(" 2500.5 "), Some(dec!(2500.5)));
        assert_eq!(parse_decimal("1e-4"), Some(dec!(0.0001)));
        assert!(parse_decimal("").is_none());
        assert!(parse_decimal("NaN").is_none());
        assert!(parse_decimal("abc").is_none());
    }
}
