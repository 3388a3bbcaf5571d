//! Unit conversion tests
//!
//! Covers the full conversion table: identity, mass scaling by 1000, the
//! count category refusing conversion in both directions, and price
//! conversion with integer division towards grams.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{convert_price_cents, convert_quantity, MeasurementUnit};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_identity_conversion_all_units() {
        for unit in [
            MeasurementUnit::Gram,
            MeasurementUnit::Kilogram,
            MeasurementUnit::Unit,
        ] {
            assert_eq!(convert_quantity(dec("7.25"), unit, unit), Ok(dec("7.25")));
            assert_eq!(convert_price_cents(1234, unit, unit), Ok(1234));
        }
    }

    #[test]
    fn test_grams_to_kilograms() {
        assert_eq!(
            convert_quantity(dec("1500"), MeasurementUnit::Gram, MeasurementUnit::Kilogram),
            Ok(dec("1.5"))
        );
        assert_eq!(
            convert_quantity(dec("250"), MeasurementUnit::Gram, MeasurementUnit::Kilogram),
            Ok(dec("0.25"))
        );
    }

    #[test]
    fn test_kilograms_to_grams() {
        assert_eq!(
            convert_quantity(dec("2"), MeasurementUnit::Kilogram, MeasurementUnit::Gram),
            Ok(dec("2000"))
        );
        assert_eq!(
            convert_quantity(dec("0.001"), MeasurementUnit::Kilogram, MeasurementUnit::Gram),
            Ok(dec("1.000"))
        );
    }

    #[test]
    fn test_price_per_gram_to_per_kilogram() {
        // A price of 10 cents per gram is 10000 cents per kilogram
        assert_eq!(
            convert_price_cents(10, MeasurementUnit::Gram, MeasurementUnit::Kilogram),
            Ok(10_000)
        );
    }

    #[test]
    fn test_price_per_kilogram_to_per_gram_truncates() {
        // Integer division: sub-cent remainders are dropped
        assert_eq!(
            convert_price_cents(2999, MeasurementUnit::Kilogram, MeasurementUnit::Gram),
            Ok(2)
        );
        assert_eq!(
            convert_price_cents(999, MeasurementUnit::Kilogram, MeasurementUnit::Gram),
            Ok(0)
        );
    }

    #[test]
    fn test_count_unit_rejects_mass_conversion() {
        for mass in [MeasurementUnit::Gram, MeasurementUnit::Kilogram] {
            let err = convert_quantity(dec("5"), MeasurementUnit::Unit, mass).unwrap_err();
            assert_eq!(err.from, MeasurementUnit::Unit);
            assert_eq!(err.to, mass);

            assert!(convert_quantity(dec("5"), mass, MeasurementUnit::Unit).is_err());
            assert!(convert_price_cents(500, MeasurementUnit::Unit, mass).is_err());
            assert!(convert_price_cents(500, mass, MeasurementUnit::Unit).is_err());
        }
    }

    #[test]
    fn test_legacy_unit_mapping() {
        assert_eq!(
            MeasurementUnit::from_legacy("ml"),
            Some(MeasurementUnit::Gram)
        );
        assert_eq!(
            MeasurementUnit::from_legacy("l"),
            Some(MeasurementUnit::Kilogram)
        );
        assert_eq!(
            MeasurementUnit::from_legacy("fatia"),
            Some(MeasurementUnit::Unit)
        );
        assert_eq!(
            MeasurementUnit::from_legacy("slice"),
            Some(MeasurementUnit::Unit)
        );
        assert_eq!(
            MeasurementUnit::from_legacy("pitada"),
            Some(MeasurementUnit::Gram)
        );
        assert_eq!(
            MeasurementUnit::from_legacy("pinch"),
            Some(MeasurementUnit::Gram)
        );
        assert_eq!(MeasurementUnit::from_legacy("oz"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1u64..1_000_000u64).prop_map(|n| Decimal::new(n as i64, 3))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Mass conversions round-trip exactly: g -> kg -> g is the identity.
    #[test]
    fn prop_mass_round_trip(quantity in quantity_strategy()) {
        let as_kg = convert_quantity(
            quantity,
            MeasurementUnit::Gram,
            MeasurementUnit::Kilogram,
        ).unwrap();
        let back = convert_quantity(
            as_kg,
            MeasurementUnit::Kilogram,
            MeasurementUnit::Gram,
        ).unwrap();
        prop_assert_eq!(back, quantity);
    }

    /// Converting a quantity preserves the total mass in grams.
    #[test]
    fn prop_conversion_preserves_mass(quantity in quantity_strategy()) {
        let as_kg = convert_quantity(
            quantity,
            MeasurementUnit::Gram,
            MeasurementUnit::Kilogram,
        ).unwrap();
        prop_assert_eq!(as_kg * Decimal::from(1000), quantity);
    }

    /// Price conversion towards kilograms is exact (multiplication only).
    #[test]
    fn prop_price_to_kilograms_exact(price_cents in 1i64..1_000_000i64) {
        let per_kg = convert_price_cents(
            price_cents,
            MeasurementUnit::Gram,
            MeasurementUnit::Kilogram,
        ).unwrap();
        prop_assert_eq!(per_kg, price_cents * 1000);
    }
}
