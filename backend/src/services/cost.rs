//! Product cost cascade
//!
//! A product's cost is its base price plus the sum of its composition,
//! each ingredient quantity converted to the stock position's unit and
//! priced at the position's current (last-purchase) price. Every purchase
//! re-runs the cascade for the products that use the purchased ingredient,
//! so recorded costs always reflect the latest prices.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::models::CostRecord;
use shared::{conversion, round_cents};

use crate::error::{AppError, AppResult};
use crate::services::{stock, EngineWarning};

#[derive(Clone)]
pub struct CostService {
    db: PgPool,
}

/// Current cost record for a product with derived profitability figures
#[derive(Debug, Serialize)]
pub struct ProductCostView {
    pub product_id: Uuid,
    pub product_name: String,
    pub base_price_cents: i64,
    pub cost_price_cents: i64,
    pub sale_price_cents: i64,
    pub profit_cents: i64,
    pub margin_percent: Decimal,
    pub valid_from: NaiveDate,
}

/// Result of recalculating one product's cost
#[derive(Debug, Serialize)]
pub struct RecalculationOutcome {
    pub record: CostRecord,
    pub warnings: Vec<EngineWarning>,
}

/// Result of a recalculate-all run
#[derive(Debug, Serialize)]
pub struct RecalculateAllOutcome {
    pub products_processed: u64,
    pub warnings: Vec<EngineWarning>,
}

#[derive(Debug, FromRow)]
struct CostRecordRow {
    id: Uuid,
    product_id: Uuid,
    base_price_cents: i64,
    cost_price_cents: i64,
    sale_price_cents: i64,
    valid_from: NaiveDate,
    valid_until: Option<NaiveDate>,
}

impl CostRecordRow {
    fn into_record(self) -> CostRecord {
        CostRecord {
            id: self.id,
            product_id: self.product_id,
            base_price_cents: self.base_price_cents,
            cost_price_cents: self.cost_price_cents,
            sale_price_cents: self.sale_price_cents,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
        }
    }
}

#[derive(Debug, FromRow)]
struct CompositionPriceRow {
    ingredient_id: Uuid,
    quantity: Decimal,
    unit: String,
    position_unit: Option<String>,
    position_price_cents: Option<i64>,
}

#[derive(Debug, FromRow)]
struct CostReportRow {
    product_id: Uuid,
    product_name: String,
    base_price_cents: i64,
    cost_price_cents: i64,
    sale_price_cents: i64,
    valid_from: NaiveDate,
}

const RECORD_COLUMNS: &str =
    "id, product_id, base_price_cents, cost_price_cents, sale_price_cents, valid_from, valid_until";

impl CostService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Current cost record for a product with margin and profit derived.
    pub async fn get_current_cost(
        &self,
        pizzeria_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<ProductCostView> {
        let row = sqlx::query_as::<_, CostReportRow>(
            r#"
            SELECT p.id AS product_id, p.name AS product_name, pp.base_price_cents,
                   pp.cost_price_cents, pp.sale_price_cents, pp.valid_from
            FROM products p
            JOIN product_prices pp ON pp.product_id = p.id AND pp.valid_until IS NULL
            WHERE p.id = $1 AND p.pizzeria_id = $2
            "#,
        )
        .bind(product_id)
        .bind(pizzeria_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product price".to_string()))?;

        Ok(Self::into_view(row))
    }

    /// Recalculate one product's cost in its own transaction.
    pub async fn recalculate(
        &self,
        pizzeria_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<RecalculationOutcome> {
        let mut tx = self.db.begin().await?;
        let outcome = recalculate_product(&mut *tx, pizzeria_id, product_id).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Recalculate costs for every product of a pizzeria.
    pub async fn recalculate_all(&self, pizzeria_id: Uuid) -> AppResult<RecalculateAllOutcome> {
        let product_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM products WHERE pizzeria_id = $1 ORDER BY name",
        )
        .bind(pizzeria_id)
        .fetch_all(&self.db)
        .await?;

        let mut warnings = Vec::new();
        let mut processed = 0u64;

        for product_id in product_ids {
            let mut tx = self.db.begin().await?;
            let outcome = recalculate_product(&mut *tx, pizzeria_id, product_id).await?;
            tx.commit().await?;
            warnings.extend(outcome.warnings);
            processed += 1;
        }

        tracing::info!(%pizzeria_id, processed, "cost recalculation completed for all products");

        Ok(RecalculateAllOutcome {
            products_processed: processed,
            warnings,
        })
    }

    /// All products with a current price record, sorted by margin ascending
    /// so the least profitable products surface first.
    pub async fn cost_report(&self, pizzeria_id: Uuid) -> AppResult<Vec<ProductCostView>> {
        let rows = sqlx::query_as::<_, CostReportRow>(
            r#"
            SELECT p.id AS product_id, p.name AS product_name, pp.base_price_cents,
                   pp.cost_price_cents, pp.sale_price_cents, pp.valid_from
            FROM products p
            JOIN product_prices pp ON pp.product_id = p.id AND pp.valid_until IS NULL
            WHERE p.pizzeria_id = $1
            "#,
        )
        .bind(pizzeria_id)
        .fetch_all(&self.db)
        .await?;

        let mut views: Vec<ProductCostView> = rows.into_iter().map(Self::into_view).collect();
        views.sort_by(|a, b| a.margin_percent.cmp(&b.margin_percent));
        Ok(views)
    }

    fn into_view(row: CostReportRow) -> ProductCostView {
        let record = CostRecord {
            id: Uuid::nil(),
            product_id: row.product_id,
            base_price_cents: row.base_price_cents,
            cost_price_cents: row.cost_price_cents,
            sale_price_cents: row.sale_price_cents,
            valid_from: row.valid_from,
            valid_until: None,
        };
        ProductCostView {
            product_id: row.product_id,
            product_name: row.product_name,
            base_price_cents: row.base_price_cents,
            cost_price_cents: row.cost_price_cents,
            sale_price_cents: row.sale_price_cents,
            profit_cents: record.profit_cents(),
            margin_percent: record.margin_percent(),
            valid_from: row.valid_from,
        }
    }
}

/// Recalculate a product's cost inside the caller's transaction.
///
/// Ingredients with no stock position or an unconvertible unit contribute
/// zero and produce a warning instead of aborting the run.
pub(crate) async fn recalculate_product(
    conn: &mut PgConnection,
    pizzeria_id: Uuid,
    product_id: Uuid,
) -> AppResult<RecalculationOutcome> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND pizzeria_id = $2)",
    )
    .bind(product_id)
    .bind(pizzeria_id)
    .fetch_one(&mut *conn)
    .await?;
    if !exists {
        return Err(AppError::NotFound("Product".to_string()));
    }

    let current = sqlx::query_as::<_, CostRecordRow>(&format!(
        "SELECT {} FROM product_prices WHERE product_id = $1 AND valid_until IS NULL FOR UPDATE",
        RECORD_COLUMNS,
    ))
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    let current = match current {
        Some(row) => row.into_record(),
        None => sqlx::query_as::<_, CostRecordRow>(&format!(
            r#"
            INSERT INTO product_prices (product_id, base_price_cents, cost_price_cents,
                                        sale_price_cents, valid_from)
            VALUES ($1, 0, 0, 0, CURRENT_DATE)
            RETURNING {}
            "#,
            RECORD_COLUMNS,
        ))
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?
        .into_record(),
    };

    let composition = sqlx::query_as::<_, CompositionPriceRow>(
        r#"
        SELECT pi.ingredient_id, pi.quantity, pi.unit,
               sp.unit AS position_unit, sp.current_unit_price_cents AS position_price_cents
        FROM product_ingredients pi
        LEFT JOIN stock_positions sp ON sp.ingredient_id = pi.ingredient_id
        WHERE pi.product_id = $1
        "#,
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut warnings = Vec::new();
    let mut ingredient_cost_cents = 0i64;

    for item in composition {
        let (position_unit, price_cents) = match (item.position_unit, item.position_price_cents) {
            (Some(unit), Some(price)) => (stock::stored_unit(&unit)?, price),
            _ => {
                warnings.push(
                    EngineWarning::missing_position(item.ingredient_id).for_product(product_id),
                );
                continue;
            }
        };
        let item_unit = stock::stored_unit(&item.unit)?;

        match conversion::convert_quantity(item.quantity, item_unit, position_unit) {
            Ok(converted) => {
                ingredient_cost_cents += round_cents(converted * Decimal::from(price_cents));
            }
            Err(_) => {
                warnings.push(
                    EngineWarning::unit_mismatch(item.ingredient_id, item_unit, position_unit)
                        .for_product(product_id),
                );
            }
        }
    }

    let cost_price_cents = current.base_price_cents + ingredient_cost_cents;

    let record = sqlx::query_as::<_, CostRecordRow>(&format!(
        "UPDATE product_prices SET cost_price_cents = $1 WHERE id = $2 RETURNING {}",
        RECORD_COLUMNS,
    ))
    .bind(cost_price_cents)
    .bind(current.id)
    .fetch_one(&mut *conn)
    .await?
    .into_record();

    Ok(RecalculationOutcome { record, warnings })
}

/// Recalculate every product that uses an ingredient, inside the caller's
/// transaction. Invoked by the purchase effect chain.
pub(crate) async fn recalculate_for_ingredient(
    conn: &mut PgConnection,
    pizzeria_id: Uuid,
    ingredient_id: Uuid,
) -> AppResult<Vec<EngineWarning>> {
    let product_ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT DISTINCT pi.product_id
        FROM product_ingredients pi
        JOIN products p ON p.id = pi.product_id
        WHERE pi.ingredient_id = $1 AND p.pizzeria_id = $2
        "#,
    )
    .bind(ingredient_id)
    .bind(pizzeria_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut warnings = Vec::new();
    for product_id in product_ids {
        let outcome = recalculate_product(&mut *conn, pizzeria_id, product_id).await?;
        warnings.extend(outcome.warnings);
    }
    Ok(warnings)
}
