//! HTTP handlers for product cost endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::cost::{
    CostService, ProductCostView, RecalculateAllOutcome, RecalculationOutcome,
};
use crate::AppState;

/// Current cost record for a product with margin and profit
pub async fn get_current_cost(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductCostView>> {
    let service = CostService::new(state.db);
    let view = service
        .get_current_cost(current_user.0.pizzeria_id, product_id)
        .await?;
    Ok(Json(view))
}

/// Recalculate one product's cost from its composition
pub async fn recalculate_cost(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<RecalculationOutcome>> {
    let service = CostService::new(state.db);
    let outcome = service
        .recalculate(current_user.0.pizzeria_id, product_id)
        .await?;
    Ok(Json(outcome))
}

/// Recalculate costs for every product
pub async fn recalculate_all_costs(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<RecalculateAllOutcome>> {
    let service = CostService::new(state.db);
    let outcome = service.recalculate_all(current_user.0.pizzeria_id).await?;
    Ok(Json(outcome))
}

/// Cost report for all products, least profitable first
pub async fn get_cost_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<ProductCostView>>> {
    let service = CostService::new(state.db);
    let report = service.cost_report(current_user.0.pizzeria_id).await?;
    Ok(Json(report))
}
