//! Order lifecycle and stock deduction
//!
//! Status changes follow the forward-only kitchen flow. Entering a status
//! that commits stock (ready or delivered) deducts each order item's
//! composition from the stock positions exactly once; the order's
//! `stock_deducted` flag, not the status itself, is the idempotency guard.
//! Delivery additionally derives the sale inflow in the cash ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{Order, OrderStatus};
use shared::PaymentMethod;

use crate::error::{AppError, AppResult};
use crate::services::{ledger, stock, EngineWarning};

#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Input for a status transition
#[derive(Debug, Deserialize)]
pub struct TransitionInput {
    pub status: OrderStatus,
}

/// Result of a status transition
#[derive(Debug, Serialize)]
pub struct TransitionOutcome {
    pub order: Order,
    /// Number of ingredient deductions applied by this transition.
    pub deductions_applied: usize,
    pub warnings: Vec<EngineWarning>,
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    pizzeria_id: Uuid,
    status: String,
    payment_method: String,
    total_cents: i64,
    stock_deducted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> AppResult<Order> {
        let status = OrderStatus::parse(&self.status).ok_or_else(|| {
            AppError::Internal(format!("unrecognized stored order status '{}'", self.status))
        })?;
        let payment_method = PaymentMethod::parse(&self.payment_method).ok_or_else(|| {
            AppError::Internal(format!(
                "unrecognized stored payment method '{}'",
                self.payment_method
            ))
        })?;
        Ok(Order {
            id: self.id,
            pizzeria_id: self.pizzeria_id,
            status,
            payment_method,
            total_cents: self.total_cents,
            stock_deducted: self.stock_deducted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct DeductionRow {
    ingredient_id: Uuid,
    item_quantity: i32,
    composition_quantity: Decimal,
    composition_unit: String,
}

const ORDER_COLUMNS: &str = "id, pizzeria_id, status, payment_method, total_cents, \
     stock_deducted, created_at, updated_at";

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Move an order to a new status, applying the deduction and ledger
    /// effects of the transition in one transaction.
    pub async fn transition_status(
        &self,
        pizzeria_id: Uuid,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> AppResult<TransitionOutcome> {
        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1 AND pizzeria_id = $2 FOR UPDATE",
            ORDER_COLUMNS,
        ))
        .bind(order_id)
        .bind(pizzeria_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?
        .into_order()?;

        // A repeated request for the current status is a retry, not a
        // transition; accept it without re-running any effect.
        if order.status == new_status {
            tx.rollback().await?;
            return Ok(TransitionOutcome {
                order,
                deductions_applied: 0,
                warnings: Vec::new(),
            });
        }

        if !order.status.can_transition_to(new_status) {
            return Err(AppError::InvalidStateTransition(format!(
                "{} -> {}",
                order.status.as_str(),
                new_status.as_str()
            )));
        }

        let mut warnings = Vec::new();
        let mut deductions_applied = 0usize;

        let deduct = new_status.commits_stock() && !order.stock_deducted;
        if deduct {
            let rows = sqlx::query_as::<_, DeductionRow>(
                r#"
                SELECT pi.ingredient_id, oi.quantity AS item_quantity,
                       pi.quantity AS composition_quantity, pi.unit AS composition_unit
                FROM order_items oi
                JOIN product_ingredients pi ON pi.product_id = oi.product_id
                WHERE oi.order_id = $1
                "#,
            )
            .bind(order_id)
            .fetch_all(&mut *tx)
            .await?;

            for row in rows {
                let unit = stock::stored_unit(&row.composition_unit)?;
                let needed = row.composition_quantity * Decimal::from(row.item_quantity);

                match stock::consume(&mut *tx, row.ingredient_id, needed, unit).await? {
                    stock::ConsumeOutcome::Applied {
                        unit,
                        quantity_deducted,
                        stock_before,
                        stock_after,
                        clamped_by,
                        ..
                    } => {
                        stock::log_usage(
                            &mut *tx,
                            row.ingredient_id,
                            order_id,
                            quantity_deducted,
                            unit,
                            stock_before,
                            stock_after,
                        )
                        .await?;
                        if let Some(deficit) = clamped_by {
                            warnings.push(EngineWarning::clamped_at_zero(
                                row.ingredient_id,
                                deficit,
                                unit,
                            ));
                        }
                        deductions_applied += 1;
                    }
                    stock::ConsumeOutcome::MissingPosition => {
                        warnings.push(EngineWarning::missing_position(row.ingredient_id));
                    }
                    stock::ConsumeOutcome::Unconvertible { from, to } => {
                        warnings.push(EngineWarning::unit_mismatch(row.ingredient_id, from, to));
                    }
                }
            }
        }

        let order = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders
            SET status = $1, stock_deducted = stock_deducted OR $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            ORDER_COLUMNS,
        ))
        .bind(new_status.as_str())
        .bind(deduct)
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?
        .into_order()?;

        if new_status == OrderStatus::Delivered {
            let description = format!("Venda - Pedido {}", order_id);
            ledger::insert_sale_movement(
                &mut *tx,
                pizzeria_id,
                order_id,
                order.total_cents,
                order.payment_method,
                order.sale_moved_at(),
                &description,
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            %order_id,
            status = new_status.as_str(),
            deductions_applied,
            "order status changed"
        );

        Ok(TransitionOutcome {
            order,
            deductions_applied,
            warnings,
        })
    }

    /// Delete an order and its derived cash movement.
    ///
    /// Stock already deducted is not restored; items and usage-log rows go
    /// with the order via cascading foreign keys.
    pub async fn delete_order(&self, pizzeria_id: Uuid, order_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        ledger::remove_for_order(&mut *tx, pizzeria_id, order_id).await?;

        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND pizzeria_id = $2")
            .bind(order_id)
            .bind(pizzeria_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Order".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }
}
