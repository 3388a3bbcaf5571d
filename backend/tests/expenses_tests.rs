//! Recurring expense generation tests
//!
//! Covers the three-month candidate window, due-day clamping to shorter
//! months (including leap years), recurrence window filtering, and the
//! overdue flag.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use shared::recurrence::{candidate_months, days_in_month, due_date_in_month, month_start};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_window_is_three_consecutive_months() {
        assert_eq!(
            candidate_months(date(2024, 5, 17)),
            [date(2024, 5, 1), date(2024, 6, 1), date(2024, 7, 1)]
        );
    }

    #[test]
    fn test_window_spans_year_boundary() {
        assert_eq!(
            candidate_months(date(2024, 12, 3)),
            [date(2024, 12, 1), date(2025, 1, 1), date(2025, 2, 1)]
        );
    }

    #[test]
    fn test_day_31_clamps_to_february() {
        assert_eq!(due_date_in_month(date(2023, 2, 1), 31), date(2023, 2, 28));
        assert_eq!(due_date_in_month(date(2024, 2, 1), 31), date(2024, 2, 29));
    }

    #[test]
    fn test_day_31_clamps_to_thirty_day_months() {
        for month in [4u32, 6, 9, 11] {
            assert_eq!(
                due_date_in_month(date(2024, month, 1), 31),
                date(2024, month, 30)
            );
        }
    }

    #[test]
    fn test_in_range_day_is_unchanged() {
        assert_eq!(due_date_in_month(date(2024, 2, 1), 15), date(2024, 2, 15));
        assert_eq!(due_date_in_month(date(2024, 1, 1), 31), date(2024, 1, 31));
    }

    #[test]
    fn test_recurrence_window_filters_candidates() {
        // The generation loop skips months whose due date falls outside
        // [recurrence_start, recurrence_end].
        let start = date(2024, 6, 1);
        let end = date(2024, 6, 30);
        let generated: Vec<NaiveDate> = candidate_months(date(2024, 5, 20))
            .into_iter()
            .map(|month| due_date_in_month(month, 10))
            .filter(|due| *due >= start && *due <= end)
            .collect();
        assert_eq!(generated, vec![date(2024, 6, 10)]);
    }

    #[test]
    fn test_overdue_flag() {
        use shared::models::{ExpenseKind, ExpenseRecord};
        use shared::PaymentMethod;

        let expense = ExpenseRecord {
            id: uuid::Uuid::new_v4(),
            pizzeria_id: uuid::Uuid::new_v4(),
            category_id: uuid::Uuid::new_v4(),
            description: "Energia elétrica".into(),
            amount_cents: 42_000,
            kind: ExpenseKind::Fixed,
            payment_method: PaymentMethod::DirectDebit,
            due_date: date(2024, 3, 10),
            paid: false,
            paid_date: None,
            recurring: false,
            recurrence_day: None,
            recurrence_start: None,
            recurrence_end: None,
            template_id: None,
            generated_for_month: None,
            note: None,
            created_at: chrono::Utc::now(),
        };

        assert!(expense.is_overdue(date(2024, 3, 11)));
        assert!(!expense.is_overdue(date(2024, 3, 10)));
        assert!(!expense.is_overdue(date(2024, 3, 9)));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn any_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100i32, 1u32..=12u32, 1u32..=28u32).prop_map(|(y, m, d)| date(y, m, d))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The clamped due date always lands inside its month, on the requested
    /// day whenever the month is long enough.
    #[test]
    fn prop_due_date_within_month(month_seed in any_date(), day in 1u32..=31u32) {
        let month = month_start(month_seed);
        let due = due_date_in_month(month, day);

        prop_assert_eq!(due.year(), month.year());
        prop_assert_eq!(due.month(), month.month());
        if day <= days_in_month(month) {
            prop_assert_eq!(due.day(), day);
        } else {
            prop_assert_eq!(due.day(), days_in_month(month));
        }
    }

    /// The candidate window is always three month starts, strictly
    /// ascending, one month apart.
    #[test]
    fn prop_candidate_window_shape(today in any_date()) {
        let months = candidate_months(today);
        prop_assert_eq!(months[0], month_start(today));
        for month in months {
            prop_assert_eq!(month.day(), 1);
        }
        prop_assert!(months[0] < months[1] && months[1] < months[2]);
    }
}
