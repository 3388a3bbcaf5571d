//! Stock ledger tests
//!
//! Logic-level tests for the stock position model: purchase additivity,
//! last-price valuation overwrite, the clamp-at-zero deduction invariant,
//! and the low-stock flag.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::StockPosition;
use shared::{convert_price_cents, convert_quantity, round_cents, MeasurementUnit};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn position(quantity: &str, unit: MeasurementUnit, price_cents: i64) -> StockPosition {
    StockPosition {
        id: uuid::Uuid::new_v4(),
        ingredient_id: uuid::Uuid::new_v4(),
        quantity: dec(quantity),
        unit,
        minimum_quantity: Decimal::ZERO,
        maximum_quantity: Decimal::from(1000),
        current_unit_price_cents: price_cents,
        last_purchase_date: None,
        updated_at: chrono::Utc::now(),
    }
}

/// Apply a purchase to a position the way the stock service does: add the
/// converted quantity and overwrite the price with the converted price.
fn apply_purchase(
    position: &mut StockPosition,
    quantity: Decimal,
    unit: MeasurementUnit,
    unit_price_cents: i64,
) -> bool {
    match (
        convert_quantity(quantity, unit, position.unit),
        convert_price_cents(unit_price_cents, unit, position.unit),
    ) {
        (Ok(converted_quantity), Ok(converted_price)) => {
            position.quantity += converted_quantity;
            position.current_unit_price_cents = converted_price;
            true
        }
        _ => false,
    }
}

/// Apply a deduction, clamping at zero. Returns the clamped deficit if any.
fn apply_deduction(
    position: &mut StockPosition,
    quantity: Decimal,
    unit: MeasurementUnit,
) -> Option<Decimal> {
    let converted = convert_quantity(quantity, unit, position.unit).ok()?;
    let raw_after = position.quantity - converted;
    if raw_after < Decimal::ZERO {
        position.quantity = Decimal::ZERO;
        Some(-raw_after)
    } else {
        position.quantity = raw_after;
        None
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_purchase_adds_converted_quantity() {
        let mut pos = position("2.0", MeasurementUnit::Kilogram, 1000);
        // 500 g into a kg position adds 0.5 kg
        assert!(apply_purchase(&mut pos, dec("500"), MeasurementUnit::Gram, 3));
        assert_eq!(pos.quantity, dec("2.5"));
    }

    #[test]
    fn test_purchase_overwrites_price_last_price_model() {
        let mut pos = position("10", MeasurementUnit::Kilogram, 2000);
        assert!(apply_purchase(
            &mut pos,
            dec("5"),
            MeasurementUnit::Kilogram,
            2500,
        ));
        // No averaging: the new price replaces the old one outright
        assert_eq!(pos.current_unit_price_cents, 2500);
    }

    #[test]
    fn test_price_converted_before_overwrite() {
        let mut pos = position("1", MeasurementUnit::Kilogram, 2000);
        // 10 cents per gram becomes 10000 cents per kilogram
        assert!(apply_purchase(&mut pos, dec("200"), MeasurementUnit::Gram, 10));
        assert_eq!(pos.current_unit_price_cents, 10_000);
        assert_eq!(pos.quantity, dec("1.2"));
    }

    #[test]
    fn test_unconvertible_purchase_leaves_position_untouched() {
        let mut pos = position("4", MeasurementUnit::Unit, 500);
        assert!(!apply_purchase(
            &mut pos,
            dec("2"),
            MeasurementUnit::Kilogram,
            900,
        ));
        assert_eq!(pos.quantity, dec("4"));
        assert_eq!(pos.current_unit_price_cents, 500);
        assert_eq!(pos.unit, MeasurementUnit::Unit);
    }

    #[test]
    fn test_deduction_subtracts() {
        let mut pos = position("3.0", MeasurementUnit::Kilogram, 1000);
        assert_eq!(apply_deduction(&mut pos, dec("1.2"), MeasurementUnit::Kilogram), None);
        assert_eq!(pos.quantity, dec("1.8"));
    }

    #[test]
    fn test_deduction_clamps_at_zero() {
        let mut pos = position("0.5", MeasurementUnit::Kilogram, 1000);
        let deficit = apply_deduction(&mut pos, dec("2"), MeasurementUnit::Kilogram);
        assert_eq!(pos.quantity, Decimal::ZERO);
        assert_eq!(deficit, Some(dec("1.5")));
    }

    #[test]
    fn test_total_value_uses_current_price() {
        let pos = position("2.5", MeasurementUnit::Kilogram, 1000);
        assert_eq!(pos.total_value_cents(), 2500);
    }

    #[test]
    fn test_purchase_total_rounding() {
        // 1.5 kg at 333 cents -> 499.5 cents, rounds half away from zero
        assert_eq!(round_cents(dec("1.5") * Decimal::from(333)), 500);
        // 0.4 kg at 1001 cents -> 400.4 cents
        assert_eq!(round_cents(dec("0.4") * Decimal::from(1001)), 400);
    }

    #[test]
    fn test_low_stock_flag_boundary() {
        let mut pos = position("5", MeasurementUnit::Kilogram, 100);
        pos.minimum_quantity = dec("5");
        assert!(pos.is_low());
        pos.quantity = dec("5.01");
        assert!(!pos.is_low());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[derive(Debug, Clone)]
enum StockOp {
    Purchase(Decimal, MeasurementUnit),
    Deduct(Decimal, MeasurementUnit),
}

fn unit_strategy() -> impl Strategy<Value = MeasurementUnit> {
    prop_oneof![
        Just(MeasurementUnit::Gram),
        Just(MeasurementUnit::Kilogram),
        Just(MeasurementUnit::Unit),
    ]
}

fn op_strategy() -> impl Strategy<Value = StockOp> {
    (1u64..100_000u64, unit_strategy(), prop::bool::ANY).prop_map(|(n, unit, purchase)| {
        let quantity = Decimal::new(n as i64, 2);
        if purchase {
            StockOp::Purchase(quantity, unit)
        } else {
            StockOp::Deduct(quantity, unit)
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The quantity never goes negative across any sequence of purchases
    /// and deductions, in any mix of units.
    #[test]
    fn prop_quantity_never_negative(
        start_unit in unit_strategy(),
        ops in prop::collection::vec(op_strategy(), 0..30)
    ) {
        let mut pos = position("0", start_unit, 0);
        for op in ops {
            match op {
                StockOp::Purchase(quantity, unit) => {
                    apply_purchase(&mut pos, quantity, unit, 100);
                }
                StockOp::Deduct(quantity, unit) => {
                    apply_deduction(&mut pos, quantity, unit);
                }
            }
            prop_assert!(pos.quantity >= Decimal::ZERO);
        }
    }

    /// Purchases alone are additive: the position holds exactly the sum of
    /// the converted quantities.
    #[test]
    fn prop_purchases_are_additive(
        quantities in prop::collection::vec(1u64..100_000u64, 1..15)
    ) {
        let mut pos = position("0", MeasurementUnit::Kilogram, 0);
        let mut expected = Decimal::ZERO;
        for n in quantities {
            let grams = Decimal::new(n as i64, 1);
            apply_purchase(&mut pos, grams, MeasurementUnit::Gram, 5);
            expected += grams / Decimal::from(1000);
        }
        prop_assert_eq!(pos.quantity, expected);
    }
}
