//! HTTP handlers for the cash-flow ledger endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use shared::models::CashMovement;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::ledger::{
    BackfillReport, LedgerService, ManualMovementInput, MovementsView, VerifyReport,
};
use crate::AppState;

#[derive(Deserialize)]
pub struct MovementsQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BackfillInput {
    pub start_date: Option<NaiveDate>,
}

/// List cash movements with period totals
pub async fn list_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MovementsQuery>,
) -> AppResult<Json<MovementsView>> {
    let service = LedgerService::new(state.db);
    let view = service
        .list_movements(current_user.0.pizzeria_id, query.start, query.end)
        .await?;
    Ok(Json(view))
}

/// Export cash movements as CSV
pub async fn export_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MovementsQuery>,
) -> AppResult<impl IntoResponse> {
    let service = LedgerService::new(state.db);
    let csv = service
        .export_csv(current_user.0.pizzeria_id, query.start, query.end)
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"cash_movements.csv\"",
            ),
        ],
        csv,
    ))
}

/// Record a manual ledger entry
pub async fn record_manual_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ManualMovementInput>,
) -> AppResult<Json<CashMovement>> {
    let service = LedgerService::new(state.db);
    let movement = service
        .record_manual(current_user.0.pizzeria_id, input)
        .await?;
    Ok(Json(movement))
}

/// Derive missing movements for historical source records
pub async fn backfill_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BackfillInput>,
) -> AppResult<Json<BackfillReport>> {
    let service = LedgerService::new(state.db);
    let report = service
        .backfill(current_user.0.pizzeria_id, input.start_date)
        .await?;
    Ok(Json(report))
}

/// Count source records lacking a derived movement
pub async fn verify_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<VerifyReport>> {
    let service = LedgerService::new(state.db);
    let report = service.verify(current_user.0.pizzeria_id).await?;
    Ok(Json(report))
}
