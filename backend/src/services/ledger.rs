//! Cash-flow ledger synchronization
//!
//! Every delivered order, purchase, and paid expense derives exactly one
//! cash movement. The 1:1 tie is enforced by partial unique indexes per
//! origin; derivation inserts with ON CONFLICT DO NOTHING so re-running a
//! trigger or the backfill never duplicates an entry.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::models::{CashMovement, MovementDirection, MovementOrigin};
use shared::{cents_to_display, validation, PaymentMethod};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// Movement listing with period totals
#[derive(Debug, Serialize)]
pub struct MovementsView {
    pub movements: Vec<CashMovement>,
    pub total_in_cents: i64,
    pub total_out_cents: i64,
    pub net_cents: i64,
}

/// Input for a manual ledger entry
#[derive(Debug, Deserialize)]
pub struct ManualMovementInput {
    pub direction: MovementDirection,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub description: String,
    pub moved_at: Option<DateTime<Utc>>,
}

/// Movements created per source by a backfill run
#[derive(Debug, Serialize)]
pub struct BackfillReport {
    pub order_movements_created: u64,
    pub purchase_movements_created: u64,
    pub expense_movements_created: u64,
}

/// Source records lacking a derived movement
#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub delivered_orders_without_movement: i64,
    pub purchases_without_movement: i64,
    pub paid_expenses_without_movement: i64,
}

#[derive(Debug, FromRow)]
struct CashMovementRow {
    id: Uuid,
    pizzeria_id: Uuid,
    direction: String,
    origin: String,
    amount_cents: i64,
    payment_method: String,
    moved_at: DateTime<Utc>,
    description: String,
    order_id: Option<Uuid>,
    purchase_id: Option<Uuid>,
    expense_id: Option<Uuid>,
}

impl CashMovementRow {
    fn into_movement(self) -> AppResult<CashMovement> {
        let direction = MovementDirection::parse(&self.direction).ok_or_else(|| {
            AppError::Internal(format!("unrecognized stored direction '{}'", self.direction))
        })?;
        let origin = MovementOrigin::parse(&self.origin).ok_or_else(|| {
            AppError::Internal(format!("unrecognized stored origin '{}'", self.origin))
        })?;
        let payment_method = PaymentMethod::parse(&self.payment_method).ok_or_else(|| {
            AppError::Internal(format!(
                "unrecognized stored payment method '{}'",
                self.payment_method
            ))
        })?;
        Ok(CashMovement {
            id: self.id,
            pizzeria_id: self.pizzeria_id,
            direction,
            origin,
            amount_cents: self.amount_cents,
            payment_method,
            moved_at: self.moved_at,
            description: self.description,
            order_id: self.order_id,
            purchase_id: self.purchase_id,
            expense_id: self.expense_id,
        })
    }
}

const MOVEMENT_COLUMNS: &str = "id, pizzeria_id, direction, origin, amount_cents, \
     payment_method, moved_at, description, order_id, purchase_id, expense_id";

fn date_to_moved_at(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl LedgerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List movements for a pizzeria, newest first, optionally restricted to
    /// a date range, with period totals.
    pub async fn list_movements(
        &self,
        pizzeria_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<MovementsView> {
        let rows = sqlx::query_as::<_, CashMovementRow>(&format!(
            r#"
            SELECT {}
            FROM cash_movements
            WHERE pizzeria_id = $1
              AND ($2::date IS NULL OR moved_at::date >= $2)
              AND ($3::date IS NULL OR moved_at::date <= $3)
            ORDER BY moved_at DESC, id DESC
            "#,
            MOVEMENT_COLUMNS,
        ))
        .bind(pizzeria_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        let movements: Vec<CashMovement> = rows
            .into_iter()
            .map(CashMovementRow::into_movement)
            .collect::<AppResult<_>>()?;

        let total_in_cents: i64 = movements
            .iter()
            .filter(|m| m.direction == MovementDirection::In)
            .map(|m| m.amount_cents)
            .sum();
        let total_out_cents: i64 = movements
            .iter()
            .filter(|m| m.direction == MovementDirection::Out)
            .map(|m| m.amount_cents)
            .sum();

        Ok(MovementsView {
            net_cents: total_in_cents - total_out_cents,
            movements,
            total_in_cents,
            total_out_cents,
        })
    }

    /// Export movements as CSV, same filtering as `list_movements`.
    pub async fn export_csv(
        &self,
        pizzeria_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<String> {
        let view = self.list_movements(pizzeria_id, start, end).await?;

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
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;

        for movement in &view.movements {
            writer
                .write_record([
                    movement.moved_at.date_naive().to_string(),
                    movement.direction.as_str().to_string(),
                    movement.origin.as_str().to_string(),
                    cents_to_display(movement.amount_cents).to_string(),
                    movement.payment_method.as_str().to_string(),
                    movement.description.clone(),
                ])
                .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV not UTF-8: {}", e)))
    }

    /// Record a manual ledger entry, unattached to any source record.
    pub async fn record_manual(
        &self,
        pizzeria_id: Uuid,
        input: ManualMovementInput,
    ) -> AppResult<CashMovement> {
        validation::validate_amount_cents(input.amount_cents).map_err(|message| {
            AppError::Validation {
                field: "amount_cents".to_string(),
                message: message.to_string(),
                message_pt: "O valor deve ser positivo".to_string(),
            }
        })?;
        if input.description.trim().is_empty() {
            return Err(AppError::Validation {
                field: "description".to_string(),
                message: "Description is required".to_string(),
                message_pt: "A descrição é obrigatória".to_string(),
            });
        }

        let moved_at = input.moved_at.unwrap_or_else(Utc::now);

        sqlx::query_as::<_, CashMovementRow>(&format!(
            r#"
            INSERT INTO cash_movements (pizzeria_id, direction, origin, amount_cents,
                                        payment_method, moved_at, description)
            VALUES ($1, $2, 'manual', $3, $4, $5, $6)
            RETURNING {}
            "#,
            MOVEMENT_COLUMNS,
        ))
        .bind(pizzeria_id)
        .bind(input.direction.as_str())
        .bind(input.amount_cents)
        .bind(input.payment_method.as_str())
        .bind(moved_at)
        .bind(input.description.trim())
        .fetch_one(&self.db)
        .await?
        .into_movement()
    }

    /// Derive missing movements for delivered orders, purchases, and paid
    /// expenses. Existing movements are untouched; the unique indexes make
    /// the run repeatable.
    pub async fn backfill(
        &self,
        pizzeria_id: Uuid,
        start_date: Option<NaiveDate>,
    ) -> AppResult<BackfillReport> {
        let mut tx = self.db.begin().await?;

        let orders = sqlx::query(
            r#"
            INSERT INTO cash_movements (pizzeria_id, direction, origin, amount_cents,
                                        payment_method, moved_at, description, order_id)
            SELECT o.pizzeria_id, 'in', 'sale', o.total_cents, o.payment_method,
                   o.created_at, 'Venda - Pedido ' || o.id, o.id
            FROM orders o
            WHERE o.pizzeria_id = $1 AND o.status = 'delivered'
              AND ($2::date IS NULL OR o.created_at::date >= $2)
            ON CONFLICT (order_id) WHERE origin = 'sale' DO NOTHING
            "#,
        )
        .bind(pizzeria_id)
        .bind(start_date)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let purchases = sqlx::query(
            r#"
            INSERT INTO cash_movements (pizzeria_id, direction, origin, amount_cents,
                                        payment_method, moved_at, description, purchase_id)
            SELECT i.pizzeria_id, 'out', 'purchase', p.total_price_cents, 'cash',
                   p.purchase_date::timestamp AT TIME ZONE 'UTC',
                   'Compra - ' || i.name, p.id
            FROM purchases p
            JOIN ingredients i ON i.id = p.ingredient_id
            WHERE i.pizzeria_id = $1
              AND ($2::date IS NULL OR p.purchase_date >= $2)
            ON CONFLICT (purchase_id) WHERE origin = 'purchase' DO NOTHING
            "#,
        )
        .bind(pizzeria_id)
        .bind(start_date)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let expenses = sqlx::query(
            r#"
            INSERT INTO cash_movements (pizzeria_id, direction, origin, amount_cents,
                                        payment_method, moved_at, description, expense_id)
            SELECT e.pizzeria_id, 'out', 'expense', e.amount_cents, e.payment_method,
                   COALESCE(e.paid_date, e.due_date)::timestamp AT TIME ZONE 'UTC',
                   'Despesa - ' || e.description, e.id
            FROM expenses e
            WHERE e.pizzeria_id = $1 AND e.paid = TRUE
              AND ($2::date IS NULL OR COALESCE(e.paid_date, e.due_date) >= $2)
            ON CONFLICT (expense_id) WHERE origin = 'expense' DO NOTHING
            "#,
        )
        .bind(pizzeria_id)
        .bind(start_date)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        tracing::info!(
            %pizzeria_id,
            orders,
            purchases,
            expenses,
            "ledger backfill completed"
        );

        Ok(BackfillReport {
            order_movements_created: orders,
            purchase_movements_created: purchases,
            expense_movements_created: expenses,
        })
    }

    /// Count source records whose derived movement is missing.
    pub async fn verify(&self, pizzeria_id: Uuid) -> AppResult<VerifyReport> {
        let orders = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM orders o
            WHERE o.pizzeria_id = $1 AND o.status = 'delivered'
              AND NOT EXISTS (
                  SELECT 1 FROM cash_movements m
                  WHERE m.origin = 'sale' AND m.order_id = o.id
              )
            "#,
        )
        .bind(pizzeria_id)
        .fetch_one(&self.db)
        .await?;

        let purchases = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM purchases p
            JOIN ingredients i ON i.id = p.ingredient_id
            WHERE i.pizzeria_id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM cash_movements m
                  WHERE m.origin = 'purchase' AND m.purchase_id = p.id
              )
            "#,
        )
        .bind(pizzeria_id)
        .fetch_one(&self.db)
        .await?;

        let expenses = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM expenses e
            WHERE e.pizzeria_id = $1 AND e.paid = TRUE
              AND NOT EXISTS (
                  SELECT 1 FROM cash_movements m
                  WHERE m.origin = 'expense' AND m.expense_id = e.id
              )
            "#,
        )
        .bind(pizzeria_id)
        .fetch_one(&self.db)
        .await?;

        Ok(VerifyReport {
            delivered_orders_without_movement: orders,
            purchases_without_movement: purchases,
            paid_expenses_without_movement: expenses,
        })
    }
}

/// Insert the sale inflow for a delivered order. A duplicate is a no-op.
///
/// The movement carries the order's creation time, not the delivery time,
/// so period reports attribute the revenue to when the order was placed.
pub(crate) async fn insert_sale_movement(
    conn: &mut PgConnection,
    pizzeria_id: Uuid,
    order_id: Uuid,
    amount_cents: i64,
    payment_method: PaymentMethod,
    moved_at: DateTime<Utc>,
    description: &str,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cash_movements (pizzeria_id, direction, origin, amount_cents,
                                    payment_method, moved_at, description, order_id)
        VALUES ($1, 'in', 'sale', $2, $3, $4, $5, $6)
        ON CONFLICT (order_id) WHERE origin = 'sale' DO NOTHING
        "#,
    )
    .bind(pizzeria_id)
    .bind(amount_cents)
    .bind(payment_method.as_str())
    .bind(moved_at)
    .bind(description)
    .bind(order_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Insert the purchase outflow. A duplicate is a no-op.
pub(crate) async fn insert_purchase_movement(
    conn: &mut PgConnection,
    pizzeria_id: Uuid,
    purchase_id: Uuid,
    amount_cents: i64,
    payment_method: PaymentMethod,
    purchase_date: NaiveDate,
    description: &str,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cash_movements (pizzeria_id, direction, origin, amount_cents,
                                    payment_method, moved_at, description, purchase_id)
        VALUES ($1, 'out', 'purchase', $2, $3, $4, $5, $6)
        ON CONFLICT (purchase_id) WHERE origin = 'purchase' DO NOTHING
        "#,
    )
    .bind(pizzeria_id)
    .bind(amount_cents)
    .bind(payment_method.as_str())
    .bind(date_to_moved_at(purchase_date))
    .bind(description)
    .bind(purchase_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Insert the expense outflow. A duplicate is a no-op.
pub(crate) async fn insert_expense_movement(
    conn: &mut PgConnection,
    pizzeria_id: Uuid,
    expense_id: Uuid,
    amount_cents: i64,
    payment_method: PaymentMethod,
    paid_date: NaiveDate,
    description: &str,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cash_movements (pizzeria_id, direction, origin, amount_cents,
                                    payment_method, moved_at, description, expense_id)
        VALUES ($1, 'out', 'expense', $2, $3, $4, $5, $6)
        ON CONFLICT (expense_id) WHERE origin = 'expense' DO NOTHING
        "#,
    )
    .bind(pizzeria_id)
    .bind(amount_cents)
    .bind(payment_method.as_str())
    .bind(date_to_moved_at(paid_date))
    .bind(description)
    .bind(expense_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Delete the movement derived from an order.
pub(crate) async fn remove_for_order(
    conn: &mut PgConnection,
    pizzeria_id: Uuid,
    order_id: Uuid,
) -> AppResult<()> {
    sqlx::query("DELETE FROM cash_movements WHERE order_id = $1 AND pizzeria_id = $2")
        .bind(order_id)
        .bind(pizzeria_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Delete the movement derived from a purchase.
pub(crate) async fn remove_for_purchase(
    conn: &mut PgConnection,
    pizzeria_id: Uuid,
    purchase_id: Uuid,
) -> AppResult<()> {
    sqlx::query("DELETE FROM cash_movements WHERE purchase_id = $1 AND pizzeria_id = $2")
        .bind(purchase_id)
        .bind(pizzeria_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Delete the movement derived from an expense.
pub(crate) async fn remove_for_expense(
    conn: &mut PgConnection,
    pizzeria_id: Uuid,
    expense_id: Uuid,
) -> AppResult<()> {
    sqlx::query("DELETE FROM cash_movements WHERE expense_id = $1 AND pizzeria_id = $2")
        .bind(expense_id)
        .bind(pizzeria_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
