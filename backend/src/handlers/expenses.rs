//! HTTP handlers for expense endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::models::ExpenseRecord;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::expenses::{ExpenseService, GenerationReport, MarkPaidInput};
use crate::AppState;

/// Mark an expense paid and record its ledger outflow
pub async fn mark_paid(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(expense_id): Path<Uuid>,
    Json(input): Json<MarkPaidInput>,
) -> AppResult<Json<ExpenseRecord>> {
    let service = ExpenseService::new(state.db);
    let expense = service
        .mark_paid(current_user.0.pizzeria_id, expense_id, input)
        .await?;
    Ok(Json(expense))
}

/// Generate due instances for a recurring expense template
pub async fn generate_instances(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(template_id): Path<Uuid>,
) -> AppResult<Json<GenerationReport>> {
    let service = ExpenseService::new(state.db);
    let report = service
        .generate_due_instances(current_user.0.pizzeria_id, template_id)
        .await?;
    Ok(Json(report))
}

/// Delete an expense and its cash movement
pub async fn delete_expense(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(expense_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ExpenseService::new(state.db);
    service
        .delete_expense(current_user.0.pizzeria_id, expense_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
