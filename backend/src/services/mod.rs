//! Business logic services for the pizzeria back-office engine

use rust_decimal::Decimal;
use serde::Serialize;
use shared::MeasurementUnit;
use uuid::Uuid;

pub mod cost;
pub mod expenses;
pub mod ledger;
pub mod orders;
pub mod stock;

pub use cost::CostService;
pub use expenses::ExpenseService;
pub use ledger::LedgerService;
pub use orders::OrderService;
pub use stock::StockService;

/// A non-fatal problem encountered during an engine run.
///
/// One bad ingredient never aborts a whole cascade or deduction run; the
/// affected item is skipped and the skip is reported here so the caller can
/// surface it instead of the problem staying hidden in the derived data.
#[derive(Debug, Clone, Serialize)]
pub struct EngineWarning {
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
    pub message: String,
}

impl EngineWarning {
    /// Quantity or price could not be converted between unit categories.
    pub fn unit_mismatch(
        ingredient_id: Uuid,
        from: MeasurementUnit,
        to: MeasurementUnit,
    ) -> Self {
        Self {
            code: "unit_mismatch",
            ingredient_id: Some(ingredient_id),
            product_id: None,
            message: format!("cannot convert between {} and {}", from, to),
        }
    }

    /// No stock position exists yet for the ingredient.
    pub fn missing_position(ingredient_id: Uuid) -> Self {
        Self {
            code: "missing_stock_position",
            ingredient_id: Some(ingredient_id),
            product_id: None,
            message: "ingredient has no stock position".to_string(),
        }
    }

    /// A deduction would have driven the stock negative; it was clamped at
    /// zero. Indicates more was sold than purchased.
    pub fn clamped_at_zero(ingredient_id: Uuid, deficit: Decimal, unit: MeasurementUnit) -> Self {
        Self {
            code: "stock_clamped_at_zero",
            ingredient_id: Some(ingredient_id),
            product_id: None,
            message: format!("deduction exceeded stock by {} {}", deficit, unit),
        }
    }

    pub fn for_product(mut self, product_id: Uuid) -> Self {
        self.product_id = Some(product_id);
        self
    }
}
