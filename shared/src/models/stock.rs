//! Stock and purchasing models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::MeasurementUnit;

/// Current on-hand quantity and price for one ingredient.
///
/// One row per ingredient, created lazily on first purchase and never
/// deleted (a sold-out ingredient persists at zero quantity). The quantity
/// is clamped at zero and must never go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPosition {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    pub unit: MeasurementUnit,
    pub minimum_quantity: Decimal,
    pub maximum_quantity: Decimal,
    /// Price per unit in cents, last-price valuation: the most recent
    /// purchase's converted price replaces this value, no averaging.
    pub current_unit_price_cents: i64,
    pub last_purchase_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl StockPosition {
    /// Whether the on-hand quantity has dropped to or below the minimum.
    pub fn is_low(&self) -> bool {
        self.quantity <= self.minimum_quantity
    }

    /// Total value of the position in cents.
    pub fn total_value_cents(&self) -> i64 {
        crate::types::round_cents(self.quantity * Decimal::from(self.current_unit_price_cents))
    }
}

/// A recorded ingredient purchase.
///
/// Immutable once created except for administrative correction. Each
/// purchase deterministically produces one price-history entry and one
/// cash movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit: MeasurementUnit,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub purchase_date: NaiveDate,
    pub note_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only log of purchase prices per ingredient, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub price_cents: i64,
    pub price_date: NaiveDate,
    pub supplier_label: String,
    pub purchase_id: Option<Uuid>,
}

/// Audit trail entry for one stock deduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLogEntry {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub order_id: Uuid,
    pub quantity: Decimal,
    pub unit: MeasurementUnit,
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn position(quantity: &str, minimum: &str, price_cents: i64) -> StockPosition {
        StockPosition {
            id: Uuid::new_v4(),
            ingredient_id: Uuid::new_v4(),
            quantity: Decimal::from_str(quantity).unwrap(),
            unit: MeasurementUnit::Kilogram,
            minimum_quantity: Decimal::from_str(minimum).unwrap(),
            maximum_quantity: Decimal::from(100),
            current_unit_price_cents: price_cents,
            last_purchase_date: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_low_stock_flag() {
        assert!(position("2.0", "5.0", 1000).is_low());
        assert!(position("5.0", "5.0", 1000).is_low());
        assert!(!position("5.001", "5.0", 1000).is_low());
    }

    #[test]
    fn test_total_value() {
        // 2.5 kg at 1000 cents/kg
        assert_eq!(position("2.5", "0", 1000).total_value_cents(), 2500);
    }
}
