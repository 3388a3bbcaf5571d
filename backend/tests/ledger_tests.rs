//! Cash-flow ledger tests
//!
//! Logic-level tests for movement direction arithmetic, period totals,
//! backfill/verify count bookkeeping, and the CSV row shape used by the
//! export endpoint.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use shared::models::{CashMovement, MovementDirection, MovementOrigin, Order, OrderStatus};
use shared::{cents_to_display, PaymentMethod};

fn movement(direction: MovementDirection, amount_cents: i64) -> CashMovement {
    CashMovement {
        id: Uuid::new_v4(),
        pizzeria_id: Uuid::new_v4(),
        direction,
        origin: MovementOrigin::Manual,
        amount_cents,
        payment_method: PaymentMethod::Pix,
        moved_at: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
        description: "Ajuste de caixa".into(),
        order_id: None,
        purchase_id: None,
        expense_id: None,
    }
}

fn totals(movements: &[CashMovement]) -> (i64, i64, i64) {
    let total_in: i64 = movements
        .iter()
        .filter(|m| m.direction == MovementDirection::In)
        .map(|m| m.amount_cents)
        .sum();
    let total_out: i64 = movements
        .iter()
        .filter(|m| m.direction == MovementDirection::Out)
        .map(|m| m.amount_cents)
        .sum();
    (total_in, total_out, total_in - total_out)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_signed_amount() {
        assert_eq!(movement(MovementDirection::In, 2500).signed_amount_cents(), 2500);
        assert_eq!(movement(MovementDirection::Out, 2500).signed_amount_cents(), -2500);
    }

    #[test]
    fn test_period_totals() {
        let movements = [
            movement(MovementDirection::In, 10_000),
            movement(MovementDirection::In, 5_000),
            movement(MovementDirection::Out, 3_000),
        ];
        assert_eq!(totals(&movements), (15_000, 3_000, 12_000));
    }

    #[test]
    fn test_origin_and_direction_round_trip() {
        for origin in [
            MovementOrigin::Sale,
            MovementOrigin::Purchase,
            MovementOrigin::Expense,
            MovementOrigin::Manual,
        ] {
            assert_eq!(MovementOrigin::parse(origin.as_str()), Some(origin));
        }
        for direction in [MovementDirection::In, MovementDirection::Out] {
            assert_eq!(MovementDirection::parse(direction.as_str()), Some(direction));
        }
    }

    /// The sale movement is dated at the order's creation time, not at the
    /// delivery that triggered it, so a period report places the revenue in
    /// the period the order was placed.
    #[test]
    fn test_sale_movement_dated_at_order_creation() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 31, 22, 45, 0).unwrap();
        let delivered_at = Utc.with_ymd_and_hms(2024, 4, 1, 0, 10, 0).unwrap();
        let order = Order {
            id: Uuid::new_v4(),
            pizzeria_id: Uuid::new_v4(),
            status: OrderStatus::Delivered,
            payment_method: PaymentMethod::Pix,
            total_cents: 8900,
            stock_deducted: true,
            created_at,
            updated_at: delivered_at,
        };

        assert_eq!(order.sale_moved_at(), created_at);
        assert_ne!(order.sale_moved_at(), order.updated_at);
        // Delivery after midnight must not move the revenue into April
        assert_eq!(order.sale_moved_at().date_naive().to_string(), "2024-03-31");
    }

    /// Backfill creates one movement per uncovered source; verify counts the
    /// remainder. Creating then verifying must always reach zero.
    #[test]
    fn test_backfill_then_verify_reaches_zero() {
        let total_sources = 12u64;
        let already_covered = 5u64;

        let created_by_backfill = total_sources - already_covered;
        let missing_after = total_sources - (already_covered + created_by_backfill);

        assert_eq!(created_by_backfill, 7);
        assert_eq!(missing_after, 0);
    }

    #[test]
    fn test_csv_row_shape() {
        let m = movement(MovementDirection::Out, 123_456);

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "date",
                "direction",
                "origin",
                "amount",
                "payment_method",
                "description",
            ])
            .unwrap();
        writer
            .write_record([
                m.moved_at.date_naive().to_string(),
                m.direction.as_str().to_string(),
                m.origin.as_str().to_string(),
                cents_to_display(m.amount_cents).to_string(),
                m.payment_method.as_str().to_string(),
                m.description.clone(),
            ])
            .unwrap();

        let csv = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("date,direction,origin,amount,payment_method,description")
        );
        assert_eq!(
            lines.next(),
            Some("2024-03-15,out,manual,1234.56,pix,Ajuste de caixa")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_amount_display_keeps_two_decimals() {
        assert_eq!(cents_to_display(5).to_string(), "0.05");
        assert_eq!(cents_to_display(100).to_string(), "1.00");
        assert_eq!(cents_to_display(123_456).to_string(), "1234.56");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The net total always equals the sum of signed amounts.
    #[test]
    fn prop_net_equals_signed_sum(
        amounts in prop::collection::vec((1i64..1_000_000i64, prop::bool::ANY), 0..30)
    ) {
        let movements: Vec<CashMovement> = amounts
            .iter()
            .map(|&(cents, inflow)| {
                let direction = if inflow {
                    MovementDirection::In
                } else {
                    MovementDirection::Out
                };
                movement(direction, cents)
            })
            .collect();

        let (_, _, net) = totals(&movements);
        let signed_sum: i64 = movements.iter().map(CashMovement::signed_amount_cents).sum();
        prop_assert_eq!(net, signed_sum);
    }
}
