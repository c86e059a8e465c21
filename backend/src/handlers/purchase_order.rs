//! HTTP handlers for purchase order endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CompanyScope;
use crate::services::purchase_order::{
    CreatePurchaseOrderInput, IssueOrderInput, PurchaseOrder, PurchaseOrderService,
    PurchaseOrderWithItems,
};
use crate::services::store_request::ApprovalInput;
use crate::AppState;

/// Create a purchase order
pub async fn create_purchase_order(
    State(state): State<AppState>,
    scope: CompanyScope,
    Json(input): Json<CreatePurchaseOrderInput>,
) -> AppResult<Json<PurchaseOrderWithItems>> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.create(scope.0.company_id, input).await?;
    Ok(Json(order))
}

/// Record the approver on a draft purchase order
pub async fn approve_purchase_order(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(order_id): Path<Uuid>,
    Json(input): Json<ApprovalInput>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.approve(scope.0.company_id, order_id, input).await?;
    Ok(Json(order))
}

/// Issue an approved purchase order to the vendor
pub async fn issue_purchase_order(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(order_id): Path<Uuid>,
    Json(input): Json<IssueOrderInput>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.issue(scope.0.company_id, order_id, input).await?;
    Ok(Json(order))
}

/// Cancel a non-terminal purchase order
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.cancel(scope.0.company_id, order_id).await?;
    Ok(Json(order))
}

/// Delete a draft purchase order
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = PurchaseOrderService::new(state.db);
    service.delete(scope.0.company_id, order_id).await?;
    Ok(Json(()))
}

/// Get a purchase order with its items
pub async fn get_purchase_order(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrderWithItems>> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.get(scope.0.company_id, order_id).await?;
    Ok(Json(order))
}

/// List all purchase orders for the company
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    scope: CompanyScope,
) -> AppResult<Json<Vec<PurchaseOrder>>> {
    let service = PurchaseOrderService::new(state.db);
    let orders = service.list(scope.0.company_id).await?;
    Ok(Json(orders))
}
