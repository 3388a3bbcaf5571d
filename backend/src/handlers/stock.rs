//! HTTP handlers for stock and purchasing endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::models::UsageLogEntry;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{
    PositionView, PriceHistoryView, RecordPurchaseInput, RecordPurchaseOutcome, StockService,
};
use crate::AppState;

/// Record an ingredient purchase
pub async fn record_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordPurchaseInput>,
) -> AppResult<Json<RecordPurchaseOutcome>> {
    let service = StockService::new(state.db);
    let outcome = service
        .record_purchase(current_user.0.pizzeria_id, input)
        .await?;
    Ok(Json(outcome))
}

/// Delete a purchase and its cash movement
pub async fn delete_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = StockService::new(state.db);
    service
        .delete_purchase(current_user.0.pizzeria_id, purchase_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List all stock positions
pub async fn list_positions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<PositionView>>> {
    let service = StockService::new(state.db);
    let positions = service.list_positions(current_user.0.pizzeria_id).await?;
    Ok(Json(positions))
}

/// List positions at or below their minimum quantity
pub async fn list_low_positions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<PositionView>>> {
    let service = StockService::new(state.db);
    let positions = service
        .list_low_positions(current_user.0.pizzeria_id)
        .await?;
    Ok(Json(positions))
}

/// Price history for an ingredient, with min/avg/max statistics
pub async fn get_price_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<PriceHistoryView>> {
    let service = StockService::new(state.db);
    let history = service
        .price_history(current_user.0.pizzeria_id, ingredient_id)
        .await?;
    Ok(Json(history))
}

/// Deduction audit trail for an ingredient
pub async fn get_usage_log(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Vec<UsageLogEntry>>> {
    let service = StockService::new(state.db);
    let entries = service
        .usage_log(current_user.0.pizzeria_id, ingredient_id)
        .await?;
    Ok(Json(entries))
}
