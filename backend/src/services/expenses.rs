//! Expense management and the recurring expense generator
//!
//! A recurring expense row is a template; concrete monthly instances are
//! ordinary non-recurring rows carrying the template id and the month they
//! were generated for. The (template_id, generated_for_month) unique key
//! makes generation repeatable without duplicates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{ExpenseKind, ExpenseRecord};
use shared::{recurrence, validation, PaymentMethod};

use crate::error::{AppError, AppResult};
use crate::services::ledger;

#[derive(Clone)]
pub struct ExpenseService {
    db: PgPool,
}

/// Input for marking an expense paid
#[derive(Debug, Default, Deserialize)]
pub struct MarkPaidInput {
    pub paid_date: Option<NaiveDate>,
}

/// Result of a generation run for one template
#[derive(Debug, Serialize)]
pub struct GenerationReport {
    pub template_id: Uuid,
    pub months_considered: Vec<NaiveDate>,
    pub instances_created: u64,
}

#[derive(Debug, FromRow)]
struct ExpenseRow {
    id: Uuid,
    pizzeria_id: Uuid,
    category_id: Uuid,
    description: String,
    amount_cents: i64,
    kind: String,
    payment_method: String,
    due_date: NaiveDate,
    paid: bool,
    paid_date: Option<NaiveDate>,
    recurring: bool,
    recurrence_day: Option<i16>,
    recurrence_start: Option<NaiveDate>,
    recurrence_end: Option<NaiveDate>,
    template_id: Option<Uuid>,
    generated_for_month: Option<NaiveDate>,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl ExpenseRow {
    fn into_record(self) -> AppResult<ExpenseRecord> {
        let kind = ExpenseKind::parse(&self.kind).ok_or_else(|| {
            AppError::Internal(format!("unrecognized stored expense kind '{}'", self.kind))
        })?;
        let payment_method = PaymentMethod::parse(&self.payment_method).ok_or_else(|| {
            AppError::Internal(format!(
                "unrecognized stored payment method '{}'",
                self.payment_method
            ))
        })?;
        Ok(ExpenseRecord {
            id: self.id,
            pizzeria_id: self.pizzeria_id,
            category_id: self.category_id,
            description: self.description,
            amount_cents: self.amount_cents,
            kind,
            payment_method,
            due_date: self.due_date,
            paid: self.paid,
            paid_date: self.paid_date,
            recurring: self.recurring,
            recurrence_day: self.recurrence_day,
            recurrence_start: self.recurrence_start,
            recurrence_end: self.recurrence_end,
            template_id: self.template_id,
            generated_for_month: self.generated_for_month,
            note: self.note,
            created_at: self.created_at,
        })
    }
}

const EXPENSE_COLUMNS: &str = "id, pizzeria_id, category_id, description, amount_cents, kind, \
     payment_method, due_date, paid, paid_date, recurring, recurrence_day, recurrence_start, \
     recurrence_end, template_id, generated_for_month, note, created_at";

impl ExpenseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Mark an expense paid and derive its ledger outflow.
    ///
    /// Marking an already-paid expense again only updates the paid date;
    /// the unique index keeps the ledger at one movement.
    pub async fn mark_paid(
        &self,
        pizzeria_id: Uuid,
        expense_id: Uuid,
        input: MarkPaidInput,
    ) -> AppResult<ExpenseRecord> {
        let paid_date = input.paid_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;

        let expense = sqlx::query_as::<_, ExpenseRow>(&format!(
            r#"
            UPDATE expenses
            SET paid = TRUE, paid_date = $1
            WHERE id = $2 AND pizzeria_id = $3
            RETURNING {}
            "#,
            EXPENSE_COLUMNS,
        ))
        .bind(paid_date)
        .bind(expense_id)
        .bind(pizzeria_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Expense".to_string()))?
        .into_record()?;

        let description = format!("Despesa - {}", expense.description);
        ledger::insert_expense_movement(
            &mut *tx,
            pizzeria_id,
            expense_id,
            expense.amount_cents,
            expense.payment_method,
            paid_date,
            &description,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(%expense_id, %paid_date, "expense marked paid");
        Ok(expense)
    }

    /// Generate due instances for a recurring template: the current month
    /// plus the two following months, within the template's recurrence
    /// window, skipping months already generated.
    pub async fn generate_due_instances(
        &self,
        pizzeria_id: Uuid,
        template_id: Uuid,
    ) -> AppResult<GenerationReport> {
        let template = sqlx::query_as::<_, ExpenseRow>(&format!(
            "SELECT {} FROM expenses WHERE id = $1 AND pizzeria_id = $2 AND recurring = TRUE",
            EXPENSE_COLUMNS,
        ))
        .bind(template_id)
        .bind(pizzeria_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recurring expense template".to_string()))?
        .into_record()?;

        let recurrence_day = template.recurrence_day.ok_or_else(|| {
            AppError::ValidationError("recurring expense has no recurrence day".to_string())
        })?;
        validation::validate_recurrence_day(recurrence_day)
            .map_err(|message| AppError::ValidationError(message.to_string()))?;
        validation::validate_recurrence_window(template.recurrence_start, template.recurrence_end)
            .map_err(|message| AppError::ValidationError(message.to_string()))?;
        let recurrence_day = recurrence_day as u32;

        let today = Utc::now().date_naive();
        let months = recurrence::candidate_months(today);
        let note = format!("Gerada automaticamente: {}", template.description);

        let mut tx = self.db.begin().await?;
        let mut created = 0u64;
        let mut considered = Vec::new();

        for month in months {
            let due_date = recurrence::due_date_in_month(month, recurrence_day);

            if let Some(start) = template.recurrence_start {
                if due_date < start {
                    continue;
                }
            }
            if let Some(end) = template.recurrence_end {
                if due_date > end {
                    continue;
                }
            }
            considered.push(month);

            let inserted = sqlx::query(
                r#"
                INSERT INTO expenses (pizzeria_id, category_id, description, amount_cents, kind,
                                      payment_method, due_date, paid, recurring, template_id,
                                      generated_for_month, note)
                VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, FALSE, $8, $9, $10)
                ON CONFLICT (template_id, generated_for_month) WHERE template_id IS NOT NULL
                DO NOTHING
                "#,
            )
            .bind(pizzeria_id)
            .bind(template.category_id)
            .bind(&template.description)
            .bind(template.amount_cents)
            .bind(template.kind.as_str())
            .bind(template.payment_method.as_str())
            .bind(due_date)
            .bind(template_id)
            .bind(month)
            .bind(&note)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            created += inserted;
        }

        tx.commit().await?;

        tracing::info!(
            %template_id,
            months = considered.len(),
            created,
            "recurring expense instances generated"
        );

        Ok(GenerationReport {
            template_id,
            months_considered: considered,
            instances_created: created,
        })
    }

    /// Delete an expense and its derived cash movement. Deleting a template
    /// leaves already-generated instances in place with a dangling-free
    /// NULL template reference.
    pub async fn delete_expense(&self, pizzeria_id: Uuid, expense_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        ledger::remove_for_expense(&mut *tx, pizzeria_id, expense_id).await?;

        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND pizzeria_id = $2")
            .bind(expense_id)
            .bind(pizzeria_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Expense".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }
}
