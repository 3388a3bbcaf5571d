//! Stock ledger service: purchases, positions, price history and usage log
//!
//! A stock position is one row per ingredient, created lazily on the first
//! purchase. Purchases add quantity (converted to the position's unit) and
//! overwrite the position price with the converted purchase price; valuation
//! is last-price, never averaged. Deductions clamp at zero.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::models::{PriceHistoryEntry, Purchase, StockPosition, UsageLogEntry};
use shared::{conversion, round_cents, validation, MeasurementUnit, PaymentMethod};

use crate::error::{AppError, AppResult};
use crate::services::{cost, ledger, EngineWarning};

/// Stock service for purchase recording and position queries
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Input for recording an ingredient purchase
#[derive(Debug, Deserialize)]
pub struct RecordPurchaseInput {
    pub ingredient_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit: MeasurementUnit,
    pub unit_price_cents: i64,
    pub purchase_date: Option<NaiveDate>,
    pub note_number: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

/// Result of recording a purchase
#[derive(Debug, Serialize)]
pub struct RecordPurchaseOutcome {
    pub purchase: Purchase,
    pub position: StockPosition,
    pub warnings: Vec<EngineWarning>,
}

/// Stock position joined with its ingredient, for listings
#[derive(Debug, Serialize)]
pub struct PositionView {
    pub ingredient_name: String,
    #[serde(flatten)]
    pub position: StockPosition,
    pub total_value_cents: i64,
    pub is_low: bool,
}

/// Aggregate statistics over an ingredient's price history
#[derive(Debug, Serialize)]
pub struct PriceStats {
    pub entry_count: i64,
    pub min_price_cents: i64,
    pub avg_price_cents: i64,
    pub max_price_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct PriceHistoryView {
    pub entries: Vec<PriceHistoryEntry>,
    pub stats: Option<PriceStats>,
}

/// Result of one deduction attempt against a position.
///
/// Missing positions and unconvertible units are reported, not raised; the
/// caller decides whether to warn or fail.
#[derive(Debug)]
pub(crate) enum ConsumeOutcome {
    Applied {
        position_id: Uuid,
        unit: MeasurementUnit,
        quantity_deducted: Decimal,
        stock_before: Decimal,
        stock_after: Decimal,
        clamped_by: Option<Decimal>,
    },
    MissingPosition,
    Unconvertible {
        from: MeasurementUnit,
        to: MeasurementUnit,
    },
}

#[derive(Debug, FromRow)]
struct StockPositionRow {
    id: Uuid,
    ingredient_id: Uuid,
    quantity: Decimal,
    unit: String,
    minimum_quantity: Decimal,
    maximum_quantity: Decimal,
    current_unit_price_cents: i64,
    last_purchase_date: Option<NaiveDate>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: Uuid,
    ingredient_id: Uuid,
    supplier_id: Option<Uuid>,
    quantity: Decimal,
    unit: String,
    unit_price_cents: i64,
    total_price_cents: i64,
    purchase_date: NaiveDate,
    note_number: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct PositionViewRow {
    ingredient_name: String,
    id: Uuid,
    ingredient_id: Uuid,
    quantity: Decimal,
    unit: String,
    minimum_quantity: Decimal,
    maximum_quantity: Decimal,
    current_unit_price_cents: i64,
    last_purchase_date: Option<NaiveDate>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct PriceHistoryRow {
    id: Uuid,
    ingredient_id: Uuid,
    price_cents: i64,
    price_date: NaiveDate,
    supplier_label: String,
    purchase_id: Option<Uuid>,
}

#[derive(Debug, FromRow)]
struct UsageLogRow {
    id: Uuid,
    ingredient_id: Uuid,
    order_id: Uuid,
    quantity: Decimal,
    unit: String,
    stock_before: Decimal,
    stock_after: Decimal,
    created_at: DateTime<Utc>,
}

/// Parse a unit value stored in the database. Stored values are constrained
/// by a CHECK, so failure here means corrupted data.
pub(crate) fn stored_unit(value: &str) -> AppResult<MeasurementUnit> {
    MeasurementUnit::parse(value)
        .ok_or_else(|| AppError::Internal(format!("unrecognized stored unit '{}'", value)))
}

impl StockPositionRow {
    fn into_position(self) -> AppResult<StockPosition> {
        Ok(StockPosition {
            id: self.id,
            ingredient_id: self.ingredient_id,
            quantity: self.quantity,
            unit: stored_unit(&self.unit)?,
            minimum_quantity: self.minimum_quantity,
            maximum_quantity: self.maximum_quantity,
            current_unit_price_cents: self.current_unit_price_cents,
            last_purchase_date: self.last_purchase_date,
            updated_at: self.updated_at,
        })
    }
}

impl PurchaseRow {
    fn into_purchase(self) -> AppResult<Purchase> {
        Ok(Purchase {
            id: self.id,
            ingredient_id: self.ingredient_id,
            supplier_id: self.supplier_id,
            quantity: self.quantity,
            unit: stored_unit(&self.unit)?,
            unit_price_cents: self.unit_price_cents,
            total_price_cents: self.total_price_cents,
            purchase_date: self.purchase_date,
            note_number: self.note_number,
            created_at: self.created_at,
        })
    }
}

const POSITION_COLUMNS: &str = "id, ingredient_id, quantity, unit, minimum_quantity, \
     maximum_quantity, current_unit_price_cents, last_purchase_date, updated_at";

impl StockService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a purchase and run its full downstream effect chain in one
    /// transaction: stock upsert, price history append, cost cascade for
    /// products using the ingredient, and the ledger outflow.
    pub async fn record_purchase(
        &self,
        pizzeria_id: Uuid,
        input: RecordPurchaseInput,
    ) -> AppResult<RecordPurchaseOutcome> {
        validation::validate_quantity(input.quantity).map_err(|message| AppError::Validation {
            field: "quantity".to_string(),
            message: message.to_string(),
            message_pt: "A quantidade deve ser positiva".to_string(),
        })?;
        validation::validate_amount_cents(input.unit_price_cents).map_err(|message| {
            AppError::Validation {
                field: "unit_price_cents".to_string(),
                message: message.to_string(),
                message_pt: "O preço unitário deve ser positivo".to_string(),
            }
        })?;

        let ingredient_name = sqlx::query_scalar::<_, String>(
            "SELECT name FROM ingredients WHERE id = $1 AND pizzeria_id = $2",
        )
        .bind(input.ingredient_id)
        .bind(pizzeria_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient".to_string()))?;

        let supplier_label = match input.supplier_id {
            Some(supplier_id) => sqlx::query_scalar::<_, String>(
                "SELECT name FROM suppliers WHERE id = $1 AND pizzeria_id = $2",
            )
            .bind(supplier_id)
            .bind(pizzeria_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?,
            None => String::new(),
        };

        let total_cents = round_cents(input.quantity * Decimal::from(input.unit_price_cents));
        let purchase_date = input.purchase_date.unwrap_or_else(|| Utc::now().date_naive());
        let payment_method = input.payment_method.unwrap_or(PaymentMethod::Cash);
        let mut warnings = Vec::new();

        let mut tx = self.db.begin().await?;

        let purchase = sqlx::query_as::<_, PurchaseRow>(
            r#"
            INSERT INTO purchases (ingredient_id, supplier_id, quantity, unit, unit_price_cents,
                                   total_price_cents, purchase_date, note_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, ingredient_id, supplier_id, quantity, unit, unit_price_cents,
                      total_price_cents, purchase_date, note_number, created_at
            "#,
        )
        .bind(input.ingredient_id)
        .bind(input.supplier_id)
        .bind(input.quantity)
        .bind(input.unit.as_str())
        .bind(input.unit_price_cents)
        .bind(total_cents)
        .bind(purchase_date)
        .bind(&input.note_number)
        .fetch_one(&mut *tx)
        .await?
        .into_purchase()?;

        // Lock the position for the whole effect chain; create it lazily at
        // zero so the conversion below is an identity on first purchase.
        let existing = sqlx::query_as::<_, StockPositionRow>(&format!(
            "SELECT {} FROM stock_positions WHERE ingredient_id = $1 FOR UPDATE",
            POSITION_COLUMNS,
        ))
        .bind(input.ingredient_id)
        .fetch_optional(&mut *tx)
        .await?;

        let position = match existing {
            Some(row) => row.into_position()?,
            None => sqlx::query_as::<_, StockPositionRow>(&format!(
                r#"
                INSERT INTO stock_positions (ingredient_id, quantity, unit, minimum_quantity,
                                             maximum_quantity, current_unit_price_cents)
                VALUES ($1, 0, $2, 0, 0, 0)
                RETURNING {}
                "#,
                POSITION_COLUMNS,
            ))
            .bind(input.ingredient_id)
            .bind(input.unit.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::Internal("stock position insert returned no row".to_string()))?
            .into_position()?,
        };

        let position = match conversion::convert_quantity(input.quantity, input.unit, position.unit) {
            Ok(converted_quantity) => {
                // Same unit pair as the quantity, so this cannot fail here.
                let converted_price =
                    conversion::convert_price_cents(input.unit_price_cents, input.unit, position.unit)?;
                sqlx::query_as::<_, StockPositionRow>(&format!(
                    r#"
                    UPDATE stock_positions
                    SET quantity = quantity + $1, current_unit_price_cents = $2,
                        last_purchase_date = $3, updated_at = NOW()
                    WHERE id = $4
                    RETURNING {}
                    "#,
                    POSITION_COLUMNS,
                ))
                .bind(converted_quantity)
                .bind(converted_price)
                .bind(purchase_date)
                .bind(position.id)
                .fetch_one(&mut *tx)
                .await?
                .into_position()?
            }
            Err(_) => {
                // The position keeps its unit and value; the purchase is
                // still recorded and the mismatch surfaced to the caller.
                tracing::warn!(
                    ingredient_id = %input.ingredient_id,
                    purchase_unit = %input.unit,
                    position_unit = %position.unit,
                    "purchase unit not convertible to stock position unit, position left untouched"
                );
                warnings.push(EngineWarning::unit_mismatch(
                    input.ingredient_id,
                    input.unit,
                    position.unit,
                ));
                position
            }
        };

        // History keeps the price as purchased, before any conversion.
        sqlx::query(
            r#"
            INSERT INTO price_history (ingredient_id, price_cents, price_date, supplier_label, purchase_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(input.ingredient_id)
        .bind(input.unit_price_cents)
        .bind(purchase_date)
        .bind(&supplier_label)
        .bind(purchase.id)
        .execute(&mut *tx)
        .await?;

        let cascade_warnings =
            cost::recalculate_for_ingredient(&mut *tx, pizzeria_id, input.ingredient_id).await?;
        warnings.extend(cascade_warnings);

        let description = if supplier_label.is_empty() {
            format!("Compra - {}", ingredient_name)
        } else {
            format!("Compra - {} ({})", ingredient_name, supplier_label)
        };
        ledger::insert_purchase_movement(
            &mut *tx,
            pizzeria_id,
            purchase.id,
            total_cents,
            payment_method,
            purchase_date,
            &description,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            purchase_id = %purchase.id,
            ingredient_id = %input.ingredient_id,
            total_cents,
            "purchase recorded"
        );

        Ok(RecordPurchaseOutcome {
            purchase,
            position,
            warnings,
        })
    }

    /// Delete a purchase and its derived cash movement.
    ///
    /// Stock and price history are not rewound; deletion is an administrative
    /// correction of the financial record, not an inventory reversal.
    pub async fn delete_purchase(&self, pizzeria_id: Uuid, purchase_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        ledger::remove_for_purchase(&mut *tx, pizzeria_id, purchase_id).await?;

        let result = sqlx::query(
            r#"
            DELETE FROM purchases p
            USING ingredients i
            WHERE p.id = $1 AND p.ingredient_id = i.id AND i.pizzeria_id = $2
            "#,
        )
        .bind(purchase_id)
        .bind(pizzeria_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Purchase".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    /// List all stock positions for a pizzeria, with ingredient names and
    /// derived valuation.
    pub async fn list_positions(&self, pizzeria_id: Uuid) -> AppResult<Vec<PositionView>> {
        let rows = sqlx::query_as::<_, PositionViewRow>(
            r#"
            SELECT i.name AS ingredient_name, sp.id, sp.ingredient_id, sp.quantity, sp.unit,
                   sp.minimum_quantity, sp.maximum_quantity, sp.current_unit_price_cents,
                   sp.last_purchase_date, sp.updated_at
            FROM stock_positions sp
            JOIN ingredients i ON i.id = sp.ingredient_id
            WHERE i.pizzeria_id = $1
            ORDER BY i.name
            "#,
        )
        .bind(pizzeria_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Self::into_view).collect()
    }

    /// List positions at or below their minimum quantity.
    pub async fn list_low_positions(&self, pizzeria_id: Uuid) -> AppResult<Vec<PositionView>> {
        let rows = sqlx::query_as::<_, PositionViewRow>(
            r#"
            SELECT i.name AS ingredient_name, sp.id, sp.ingredient_id, sp.quantity, sp.unit,
                   sp.minimum_quantity, sp.maximum_quantity, sp.current_unit_price_cents,
                   sp.last_purchase_date, sp.updated_at
            FROM stock_positions sp
            JOIN ingredients i ON i.id = sp.ingredient_id
            WHERE i.pizzeria_id = $1 AND sp.quantity <= sp.minimum_quantity
            ORDER BY i.name
            "#,
        )
        .bind(pizzeria_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Self::into_view).collect()
    }

    fn into_view(row: PositionViewRow) -> AppResult<PositionView> {
        let position = StockPositionRow {
            id: row.id,
            ingredient_id: row.ingredient_id,
            quantity: row.quantity,
            unit: row.unit,
            minimum_quantity: row.minimum_quantity,
            maximum_quantity: row.maximum_quantity,
            current_unit_price_cents: row.current_unit_price_cents,
            last_purchase_date: row.last_purchase_date,
            updated_at: row.updated_at,
        }
        .into_position()?;

        Ok(PositionView {
            ingredient_name: row.ingredient_name,
            total_value_cents: position.total_value_cents(),
            is_low: position.is_low(),
            position,
        })
    }

    /// Price history for an ingredient, newest first, with min/avg/max stats.
    pub async fn price_history(
        &self,
        pizzeria_id: Uuid,
        ingredient_id: Uuid,
    ) -> AppResult<PriceHistoryView> {
        self.require_ingredient(pizzeria_id, ingredient_id).await?;

        let rows = sqlx::query_as::<_, PriceHistoryRow>(
            r#"
            SELECT id, ingredient_id, price_cents, price_date, supplier_label, purchase_id
            FROM price_history
            WHERE ingredient_id = $1
            ORDER BY price_date DESC, id DESC
            "#,
        )
        .bind(ingredient_id)
        .fetch_all(&self.db)
        .await?;

        let entries: Vec<PriceHistoryEntry> = rows
            .into_iter()
            .map(|r| PriceHistoryEntry {
                id: r.id,
                ingredient_id: r.ingredient_id,
                price_cents: r.price_cents,
                price_date: r.price_date,
                supplier_label: r.supplier_label,
                purchase_id: r.purchase_id,
            })
            .collect();

        let stats = if entries.is_empty() {
            None
        } else {
            let prices: Vec<i64> = entries.iter().map(|e| e.price_cents).collect();
            let sum: i64 = prices.iter().sum();
            Some(PriceStats {
                entry_count: prices.len() as i64,
                min_price_cents: *prices.iter().min().unwrap(),
                avg_price_cents: sum / prices.len() as i64,
                max_price_cents: *prices.iter().max().unwrap(),
            })
        };

        Ok(PriceHistoryView { entries, stats })
    }

    /// Deduction audit trail for an ingredient, newest first.
    pub async fn usage_log(
        &self,
        pizzeria_id: Uuid,
        ingredient_id: Uuid,
    ) -> AppResult<Vec<UsageLogEntry>> {
        self.require_ingredient(pizzeria_id, ingredient_id).await?;

        let rows = sqlx::query_as::<_, UsageLogRow>(
            r#"
            SELECT id, ingredient_id, order_id, quantity, unit, stock_before, stock_after, created_at
            FROM usage_log
            WHERE ingredient_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(ingredient_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(UsageLogEntry {
                    id: r.id,
                    ingredient_id: r.ingredient_id,
                    order_id: r.order_id,
                    quantity: r.quantity,
                    unit: stored_unit(&r.unit)?,
                    stock_before: r.stock_before,
                    stock_after: r.stock_after,
                    created_at: r.created_at,
                })
            })
            .collect()
    }

    async fn require_ingredient(&self, pizzeria_id: Uuid, ingredient_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM ingredients WHERE id = $1 AND pizzeria_id = $2)",
        )
        .bind(ingredient_id)
        .bind(pizzeria_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Ingredient".to_string()));
        }
        Ok(())
    }
}

/// Deduct a quantity from an ingredient's stock position, clamping at zero.
///
/// Runs inside the caller's transaction; the position row is locked for the
/// update. The quantity is converted to the position's unit first.
pub(crate) async fn consume(
    conn: &mut PgConnection,
    ingredient_id: Uuid,
    quantity: Decimal,
    unit: MeasurementUnit,
) -> AppResult<ConsumeOutcome> {
    let row = sqlx::query_as::<_, (Uuid, Decimal, String)>(
        "SELECT id, quantity, unit FROM stock_positions WHERE ingredient_id = $1 FOR UPDATE",
    )
    .bind(ingredient_id)
    .fetch_optional(&mut *conn)
    .await?;

    let (position_id, stock_before, unit_value) = match row {
        Some(row) => row,
        None => return Ok(ConsumeOutcome::MissingPosition),
    };
    let position_unit = stored_unit(&unit_value)?;

    let converted = match conversion::convert_quantity(quantity, unit, position_unit) {
        Ok(converted) => converted,
        Err(_) => {
            return Ok(ConsumeOutcome::Unconvertible {
                from: unit,
                to: position_unit,
            })
        }
    };

    let raw_after = stock_before - converted;
    let (stock_after, clamped_by) = if raw_after < Decimal::ZERO {
        (Decimal::ZERO, Some(-raw_after))
    } else {
        (raw_after, None)
    };

    if let Some(deficit) = clamped_by {
        tracing::warn!(
            %ingredient_id,
            %deficit,
            unit = %position_unit,
            "stock deduction exceeded on-hand quantity, clamped at zero"
        );
    }

    sqlx::query("UPDATE stock_positions SET quantity = $1, updated_at = NOW() WHERE id = $2")
        .bind(stock_after)
        .bind(position_id)
        .execute(&mut *conn)
        .await?;

    Ok(ConsumeOutcome::Applied {
        position_id,
        unit: position_unit,
        quantity_deducted: converted,
        stock_before,
        stock_after,
        clamped_by,
    })
}

/// Append one usage-log entry for a deduction applied by an order.
pub(crate) async fn log_usage(
    conn: &mut PgConnection,
    ingredient_id: Uuid,
    order_id: Uuid,
    quantity: Decimal,
    unit: MeasurementUnit,
    stock_before: Decimal,
    stock_after: Decimal,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO usage_log (ingredient_id, order_id, quantity, unit, stock_before, stock_after)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(ingredient_id)
    .bind(order_id)
    .bind(quantity)
    .bind(unit.as_str())
    .bind(stock_before)
    .bind(stock_after)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
