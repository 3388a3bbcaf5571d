//! Recurring expense date arithmetic
//!
//! Recurring expense templates generate concrete instances for the current
//! month and the two following months. The recurrence day is clamped to the
//! last day of shorter months (day 31 in February falls on the 28th, or the
//! 29th in a leap year).

use chrono::{Datelike, NaiveDate};

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Due date for a recurrence day within a given month, clamping the day to
/// the month's length.
pub fn due_date_in_month(month: NaiveDate, recurrence_day: u32) -> NaiveDate {
    let day = recurrence_day.clamp(1, days_in_month(month));
    NaiveDate::from_ymd_opt(month.year(), month.month(), day).unwrap_or(month)
}

/// The generation window: the month containing `today` plus the two
/// following months, each as the first of the month.
pub fn candidate_months(today: NaiveDate) -> [NaiveDate; 3] {
    let first = month_start(today);
    let second = next_month(first);
    let third = next_month(second);
    [first, second, third]
}

fn next_month(month: NaiveDate) -> NaiveDate {
    let (year, month_number) = if month.month() == 12 {
        (month.year() + 1, 1)
    } else {
        (month.year(), month.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month_number, 1).unwrap_or(month)
}
