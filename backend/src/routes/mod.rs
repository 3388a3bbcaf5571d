//! Route definitions for the pizzeria back-office API

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes
        .nest("/stock", stock_routes())
        .nest("/orders", order_routes())
        .nest("/expenses", expense_routes())
        .nest("/products", product_routes())
        .nest("/ledger", ledger_routes())
}

/// Stock and purchasing routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/purchases", post(handlers::record_purchase))
        .route("/purchases/:purchase_id", delete(handlers::delete_purchase))
        .route("/positions", get(handlers::list_positions))
        .route("/positions/low", get(handlers::list_low_positions))
        .route(
            "/ingredients/:ingredient_id/history",
            get(handlers::get_price_history),
        )
        .route(
            "/ingredients/:ingredient_id/usage",
            get(handlers::get_usage_log),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Order lifecycle routes (protected)
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/:order_id/status", post(handlers::transition_status))
        .route("/:order_id", delete(handlers::delete_order))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Expense routes (protected)
fn expense_routes() -> Router<AppState> {
    Router::new()
        .route("/:expense_id/pay", post(handlers::mark_paid))
        .route("/:expense_id", delete(handlers::delete_expense))
        .route(
            "/templates/:template_id/generate",
            post(handlers::generate_instances),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product cost routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/:product_id/cost", get(handlers::get_current_cost))
        .route(
            "/:product_id/cost/recalculate",
            post(handlers::recalculate_cost),
        )
        .route(
            "/cost/recalculate-all",
            post(handlers::recalculate_all_costs),
        )
        .route("/cost-report", get(handlers::get_cost_report))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Cash-flow ledger routes (protected)
fn ledger_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/movements",
            get(handlers::list_movements).post(handlers::record_manual_movement),
        )
        .route("/movements/export", get(handlers::export_movements))
        .route("/backfill", post(handlers::backfill_movements))
        .route("/verify", get(handlers::verify_movements))
        .route_layer(middleware::from_fn(auth_middleware))
}
