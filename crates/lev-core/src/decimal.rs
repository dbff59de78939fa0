//! Precision-safe decimal types for order sizing.
//!
//! Uses `rust_decimal` for exact decimal arithmetic. Step-size truncation
//! must never be subject to binary floating-point rounding.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to provide type safety and prevent mixing
/// prices with quantities in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
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
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// Order quantity with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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

    /// Truncate toward zero at step granularity.
    ///
    /// Never rounds up, so the result can never exceed the input. `None` on
    /// a non-positive step or arithmetic overflow.
    pub fn checked_round_down_to_step(&self, step: Size) -> Option<Self> {
        if !step.is_positive() {
            return None;
        }
        let steps = self.0.checked_div(step.0)?.trunc();
        Some(Self(steps.checked_mul(step.0)?.normalize()))
    }

    /// Smallest multiple of `step` that is at least this quantity.
    ///
    /// `None` on a non-positive step or arithmetic overflow.
    pub fn checked_round_up_to_step(&self, step: Size) -> Option<Self> {
        if !step.is_positive() {
            return None;
        }
        let steps = self.0.checked_div(step.0)?.ceil();
        Some(Self(steps.checked_mul(step.0)?.normalize()))
    }

    /// Whether this quantity is an integer multiple of `step`.
    #[inline]
    pub fn is_multiple_of(&self, step: Size) -> bool {
        if step.is_zero() {
            return false;
        }
        (self.0 % step.0).is_zero()
    }

    /// Calculate notional value: size * price. `None` on overflow.
    #[inline]
    pub fn checked_notional(&self, price: Price) -> Option<Decimal> {
        self.0.checked_mul(price.0)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_size_round_down_to_step() {
        let size = Size::new(dec!(1.2345));
        let step = Size::new(dec!(0.001));

        let rounded = size.checked_round_down_to_step(step).unwrap();
        assert_eq!(rounded.0, dec!(1.234));
    }

    #[test]
    fn test_round_down_never_rounds_up() {
        let size = Size::new(dec!(0.0019999));
        let step = Size::new(dec!(0.001));

        assert_eq!(size.checked_round_down_to_step(step).unwrap().0, dec!(0.001));
    }

    #[test]
    fn test_round_down_below_step_is_zero() {
        let size = Size::new(dec!(0.00005));
        let step = Size::new(dec!(0.001));

        assert!(size.checked_round_down_to_step(step).unwrap().is_zero());
    }

    #[test]
    fn test_round_to_zero_step_is_none() {
        let size = Size::new(dec!(1));
        assert_eq!(size.checked_round_down_to_step(Size::ZERO), None);
        assert_eq!(size.checked_round_up_to_step(Size::ZERO), None);
    }

    #[test]
    fn test_round_up_to_step() {
        let step = Size::new(dec!(0.002));
        assert_eq!(
            Size::new(dec!(0.005)).checked_round_up_to_step(step).unwrap().0,
            dec!(0.006)
        );
        assert_eq!(
            Size::new(dec!(0.004)).checked_round_up_to_step(step).unwrap().0,
            dec!(0.004)
        );
    }

    #[test]
    fn test_round_down_overflow_is_none() {
        let size = Size::new(Decimal::MAX);
        assert_eq!(size.checked_round_down_to_step(Size::new(dec!(0.001))), None);
    }

    #[test]
    fn test_is_multiple_of() {
        let step = Size::new(dec!(0.001));
        assert!(Size::new(dec!(0.010)).is_multiple_of(step));
        assert!(!Size::new(dec!(0.0105)).is_multiple_of(step));
        assert!(!Size::new(dec!(1)).is_multiple_of(Size::ZERO));
    }

    #[test]
    fn test_notional_calculation() {
        let size = Size::new(dec!(0.01));
        let price = Price::new(dec!(100000));

        assert_eq!(size.checked_notional(price), Some(dec!(1000)));
        assert_eq!(Size::new(Decimal::MAX).checked_notional(Price::new(dec!(2))), None);
    }

    #[test]
    fn test_price_is_positive() {
        assert!(Price::new(dec!(1)).is_positive());
        assert!(!Price::ZERO.is_positive());
        assert!(!Price::new(dec!(-5)).is_positive());
    }
}
