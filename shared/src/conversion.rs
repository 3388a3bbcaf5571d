//! Unit conversion between ingredient measurement units
//!
//! Mass units (gram, kilogram) convert by a fixed factor of 1000. The count
//! category (unit-of-item) is never convertible to or from mass. Identity
//! conversions always succeed and return the input unchanged.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::MeasurementUnit;

/// Requested unit pair is not convertible
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot convert between {from} and {to}")]
pub struct ConversionError {
    pub from: MeasurementUnit,
    pub to: MeasurementUnit,
}

const MASS_FACTOR: i64 = 1000;

/// Convert a physical quantity from one unit to another.
pub fn convert_quantity(
    quantity: Decimal,
    from: MeasurementUnit,
    to: MeasurementUnit,
) -> Result<Decimal, ConversionError> {
    use MeasurementUnit::*;
    match (from, to) {
        (f, t) if f == t => Ok(quantity),
        (Gram, Kilogram) => Ok(quantity / Decimal::from(MASS_FACTOR)),
        (Kilogram, Gram) => Ok(quantity * Decimal::from(MASS_FACTOR)),
        (from, to) => Err(ConversionError { from, to }),
    }
}

/// Convert a per-unit price in cents from one unit to another.
///
/// A price per gram becomes a price per kilogram by multiplying by 1000; the
/// reverse divides, truncating to whole cents (sub-cent prices per gram are
/// not representable).
pub fn convert_price_cents(
    price_cents: i64,
    from: MeasurementUnit,
    to: MeasurementUnit,
) -> Result<i64, ConversionError> {
    use MeasurementUnit::*;
    match (from, to) {
        (f, t) if f == t => Ok(price_cents),
        (Gram, Kilogram) => Ok(price_cents * MASS_FACTOR),
        (Kilogram, Gram) => Ok(price_cents / MASS_FACTOR),
        (from, to) => Err(ConversionError { from, to }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_identity_conversion() {
        for unit in [
            MeasurementUnit::Gram,
            MeasurementUnit::Kilogram,
            MeasurementUnit::Unit,
        ] {
            assert_eq!(convert_quantity(dec("2.5"), unit, unit), Ok(dec("2.5")));
            assert_eq!(convert_price_cents(2550, unit, unit), Ok(2550));
        }
    }

    #[test]
    fn test_mass_quantity_conversion() {
        assert_eq!(
            convert_quantity(dec("500"), MeasurementUnit::Gram, MeasurementUnit::Kilogram),
            Ok(dec("0.5"))
        );
        assert_eq!(
            convert_quantity(dec("1.5"), MeasurementUnit::Kilogram, MeasurementUnit::Gram),
            Ok(dec("1500"))
        );
    }

    #[test]
    fn test_price_conversion() {
        // 10 cents/g -> 10000 cents/kg
        assert_eq!(
            convert_price_cents(10, MeasurementUnit::Gram, MeasurementUnit::Kilogram),
            Ok(10_000)
        );
        // 2550 cents/kg -> 2 cents/g, truncated
        assert_eq!(
            convert_price_cents(2550, MeasurementUnit::Kilogram, MeasurementUnit::Gram),
            Ok(2)
        );
    }

    #[test]
    fn test_count_is_never_convertible() {
        for mass in [MeasurementUnit::Gram, MeasurementUnit::Kilogram] {
            assert!(convert_quantity(dec("1"), MeasurementUnit::Unit, mass).is_err());
            assert!(convert_quantity(dec("1"), mass, MeasurementUnit::Unit).is_err());
            assert!(convert_price_cents(100, MeasurementUnit::Unit, mass).is_err());
            assert!(convert_price_cents(100, mass, MeasurementUnit::Unit).is_err());
        }
    }
}
