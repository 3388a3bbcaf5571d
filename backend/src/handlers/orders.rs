//! HTTP handlers for order lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::orders::{OrderService, TransitionInput, TransitionOutcome};
use crate::AppState;

/// Move an order to a new status
pub async fn transition_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<TransitionInput>,
) -> AppResult<Json<TransitionOutcome>> {
    let service = OrderService::new(state.db);
    let outcome = service
        .transition_status(current_user.0.pizzeria_id, order_id, input.status)
        .await?;
    Ok(Json(outcome))
}

/// Delete an order and its cash movement
pub async fn delete_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = OrderService::new(state.db);
    service
        .delete_order(current_user.0.pizzeria_id, order_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
