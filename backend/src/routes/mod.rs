//! Route definitions for the mill back-office engine

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::scope_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Scoped routes - stock ledger
        .nest("/stock", stock_routes())
        // Scoped routes - tank allocation ledger
        .nest("/tanks", tank_routes())
        // Scoped routes - store requests
        .nest("/store-requests", store_request_routes())
        // Scoped routes - purchase requests
        .nest("/purchase-requests", purchase_request_routes())
        // Scoped routes - purchase orders
        .nest("/purchase-orders", purchase_order_routes())
        // Scoped routes - goods receipts
        .nest("/goods-receipts", goods_receipt_routes())
        // Scoped routes - goods issues
        .nest("/goods-issues", goods_issue_routes())
}

/// Stock ledger routes (scoped)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(handlers::list_stock_transactions).post(handlers::post_stock))
        .route("/adjustments", post(handlers::adjust_stock))
        .route("/materials/:material_id", get(handlers::get_stock))
        .route(
            "/materials/:material_id/transactions",
            get(handlers::get_material_transactions),
        )
        .route(
            "/materials/:material_id/allocation",
            get(handlers::get_allocation_summary),
        )
        .route_layer(middleware::from_fn(scope_middleware))
}

/// Tank allocation routes (scoped)
fn tank_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_tanks))
        .route("/transfer", post(handlers::transfer_between_tanks))
        .route("/:tank_id", get(handlers::get_tank))
        .route("/:tank_id/fill", post(handlers::fill_tank))
        .route("/:tank_id/drain", post(handlers::drain_tank))
        .route("/:tank_id/transactions", get(handlers::get_tank_transactions))
        .route_layer(middleware::from_fn(scope_middleware))
}

/// Store request routes (scoped)
fn store_request_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_store_requests).post(handlers::create_store_request))
        .route(
            "/:request_id",
            get(handlers::get_store_request).delete(handlers::delete_store_request),
        )
        .route("/:request_id/submit", post(handlers::submit_store_request))
        .route("/:request_id/approve", post(handlers::approve_store_request))
        .route("/:request_id/reject", post(handlers::reject_store_request))
        .route("/:request_id/fulfil", post(handlers::fulfil_store_request))
        .route(
            "/:request_id/purchase-request",
            post(handlers::spawn_purchase_request),
        )
        .route_layer(middleware::from_fn(scope_middleware))
}

/// Purchase request routes (scoped)
fn purchase_request_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_purchase_requests).post(handlers::create_purchase_request))
        .route(
            "/:request_id",
            get(handlers::get_purchase_request).delete(handlers::delete_purchase_request),
        )
        .route("/:request_id/submit", post(handlers::submit_purchase_request))
        .route("/:request_id/approve", post(handlers::approve_purchase_request))
        .route("/:request_id/reject", post(handlers::reject_purchase_request))
        .route_layer(middleware::from_fn(scope_middleware))
}

/// Purchase order routes (scoped)
fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_purchase_orders).post(handlers::create_purchase_order))
        .route(
            "/:order_id",
            get(handlers::get_purchase_order).delete(handlers::delete_purchase_order),
        )
        .route("/:order_id/approve", post(handlers::approve_purchase_order))
        .route("/:order_id/issue", post(handlers::issue_purchase_order))
        .route("/:order_id/cancel", post(handlers::cancel_purchase_order))
        .route_layer(middleware::from_fn(scope_middleware))
}

/// Goods receipt routes (scoped)
fn goods_receipt_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_goods_receipts).post(handlers::create_goods_receipt))
        // Draft and complete in one transaction
        .route("/receive", post(handlers::receive_goods))
        .route(
            "/:receipt_id",
            get(handlers::get_goods_receipt).delete(handlers::delete_goods_receipt),
        )
        .route("/:receipt_id/complete", post(handlers::complete_goods_receipt))
        .route_layer(middleware::from_fn(scope_middleware))
}

/// Goods issue routes (scoped)
fn goods_issue_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_goods_issues).post(handlers::create_goods_issue))
        .route(
            "/:issue_id",
            get(handlers::get_goods_issue).delete(handlers::delete_goods_issue),
        )
        .route("/:issue_id/submit", post(handlers::submit_goods_issue))
        .route("/:issue_id/approve", post(handlers::approve_goods_issue))
        .route("/:issue_id/reject", post(handlers::reject_goods_issue))
        .route("/:issue_id/issue", post(handlers::issue_goods_issue))
        .route_layer(middleware::from_fn(scope_middleware))
}
