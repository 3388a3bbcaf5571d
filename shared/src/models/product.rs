//! Product catalog and cost models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::MeasurementUnit;

/// A menu product (pizza, drink, dessert)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub pizzeria_id: Uuid,
    pub name: String,
    pub available: bool,
}

/// One ingredient of a product's composition, with the quantity one unit of
/// the product consumes. Unique per (product, ingredient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductComposition {
    pub id: Uuid,
    pub product_id: Uuid,
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    pub unit: MeasurementUnit,
}

/// Price record for a product.
///
/// At most one record per product is current (`valid_until` is null).
/// Superseding closes the old record and inserts a new current one; closed
/// records are never mutated. `cost_price_cents` is derived by the cost
/// cascade; `base_price_cents` and `sale_price_cents` are set by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub base_price_cents: i64,
    pub cost_price_cents: i64,
    pub sale_price_cents: i64,
    pub valid_from: NaiveDate,
    pub valid_until: Option<NaiveDate>,
}

impl CostRecord {
    /// Profit in cents: sale price minus derived cost.
    pub fn profit_cents(&self) -> i64 {
        self.sale_price_cents - self.cost_price_cents
    }

    /// Margin as a percentage of the sale price, zero when there is no sale
    /// price yet.
    pub fn margin_percent(&self) -> Decimal {
        if self.sale_price_cents == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.profit_cents()) * Decimal::from(100)
            / Decimal::from(self.sale_price_cents)
    }
}
