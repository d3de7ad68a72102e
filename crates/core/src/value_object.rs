//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values; to
/// "modify" one, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Basis points in one whole (100%).
const BPS_SCALE: i128 = 10_000;

/// Monetary amount in the smallest currency unit (cents).
///
/// Prices, selling prices and invoice amounts all use this type so comparisons
/// (best price, the 90% rule) are exact.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole currency units (e.g. `from_units(100)` is 100.00).
    pub const fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_mul(self, factor: i64) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    /// Apply a rate expressed in basis points (600 = 6%), rounding half away from zero.
    pub fn apply_rate_bps(self, bps: u32) -> Money {
        let raw = self.0 as i128 * bps as i128;
        let half = BPS_SCALE / 2;
        let rounded = if raw >= 0 {
            (raw + half) / BPS_SCALE
        } else {
            (raw - half) / BPS_SCALE
        };
        Money(rounded as i64)
    }

    /// `self >= other * numerator / denominator`, evaluated without rounding.
    pub fn at_least_fraction_of(self, other: Money, numerator: i64, denominator: i64) -> bool {
        (self.0 as i128) * (denominator as i128) >= (other.0 as i128) * (numerator as i128)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn six_percent_commission_of_sale_price() {
        let selling = Money::from_units(280_000);
        assert_eq!(selling.apply_rate_bps(600), Money::from_units(16_800));
    }

    #[test]
    fn rate_rounds_half_up_to_the_cent() {
        // 0.25 * 6% = 0.015 -> 0.02
        assert_eq!(Money::from_cents(25).apply_rate_bps(600), Money::from_cents(2));
        // 0.24 * 6% = 0.0144 -> 0.01
        assert_eq!(Money::from_cents(24).apply_rate_bps(600), Money::from_cents(1));
    }

    #[test]
    fn display_formats_units_and_cents() {
        assert_eq!(Money::from_cents(1_690_000).to_string(), "16900.00");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
    }

    #[test]
    fn ninety_percent_boundary_is_inclusive() {
        let expected = Money::from_units(300_000);
        assert!(Money::from_units(270_000).at_least_fraction_of(expected, 9, 10));
        assert!(!Money::from_cents(26_999_999).at_least_fraction_of(expected, 9, 10));
    }

    proptest! {
        #[test]
        fn full_rate_is_identity(cents in -1_000_000_000i64..1_000_000_000i64) {
            let m = Money::from_cents(cents);
            prop_assert_eq!(m.apply_rate_bps(10_000), m);
        }
    }
}
