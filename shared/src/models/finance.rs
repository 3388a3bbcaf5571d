//! Financial models: expenses and the cash-flow ledger

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::PaymentMethod;

/// Direction of a cash movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    In,
    Out,
}

impl MovementDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementDirection::In => "in",
            MovementDirection::Out => "out",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in" => Some(MovementDirection::In),
            "out" => Some(MovementDirection::Out),
            _ => None,
        }
    }

    /// Sign applied when summing a movement into a balance.
    pub fn sign(&self) -> i64 {
        match self {
            MovementDirection::In => 1,
            MovementDirection::Out => -1,
        }
    }
}

/// Business event a cash movement derives from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MovementOrigin {
    Sale,
    Purchase,
    Expense,
    Manual,
}

impl MovementOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementOrigin::Sale => "sale",
            MovementOrigin::Purchase => "purchase",
            MovementOrigin::Expense => "expense",
            MovementOrigin::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sale" => Some(MovementOrigin::Sale),
            "purchase" => Some(MovementOrigin::Purchase),
            "expense" => Some(MovementOrigin::Expense),
            "manual" => Some(MovementOrigin::Manual),
            _ => None,
        }
    }
}

/// One entry in the derived cash-flow ledger.
///
/// Tied 1:1 to its source business event: at most one movement exists per
/// (origin, source reference), enforced by unique indexes at the storage
/// layer. Deleting the source record deletes the movement (cascading
/// removal, not a reversing entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashMovement {
    pub id: Uuid,
    pub pizzeria_id: Uuid,
    pub direction: MovementDirection,
    pub origin: MovementOrigin,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub moved_at: DateTime<Utc>,
    pub description: String,
    pub order_id: Option<Uuid>,
    pub purchase_id: Option<Uuid>,
    pub expense_id: Option<Uuid>,
}

impl CashMovement {
    /// Amount with direction applied, for balance sums.
    pub fn signed_amount_cents(&self) -> i64 {
        self.direction.sign() * self.amount_cents
    }
}

/// Fixed or variable expense classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseKind {
    Fixed,
    Variable,
}

impl ExpenseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseKind::Fixed => "fixed",
            ExpenseKind::Variable => "variable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fixed" => Some(ExpenseKind::Fixed),
            "variable" => Some(ExpenseKind::Variable),
            _ => None,
        }
    }
}

/// An operational expense.
///
/// A row with `recurring = true` is a template; concrete monthly instances
/// are ordinary non-recurring rows carrying `template_id` and
/// `generated_for_month` for duplicate suppression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: Uuid,
    pub pizzeria_id: Uuid,
    pub category_id: Uuid,
    pub description: String,
    pub amount_cents: i64,
    pub kind: ExpenseKind,
    pub payment_method: PaymentMethod,
    pub due_date: NaiveDate,
    pub paid: bool,
    pub paid_date: Option<NaiveDate>,
    pub recurring: bool,
    /// Day of month the recurrence falls due, 1–31, clamped to the last day
    /// of shorter months. Required when `recurring` is true.
    pub recurrence_day: Option<i16>,
    pub recurrence_start: Option<NaiveDate>,
    pub recurrence_end: Option<NaiveDate>,
    pub template_id: Option<Uuid>,
    pub generated_for_month: Option<NaiveDate>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ExpenseRecord {
    /// Whether the expense is past due and unpaid.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.paid && self.due_date < today
    }
}
