//! HTTP handlers for purchase request endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CompanyScope;
use crate::services::purchase_request::{
    CreatePurchaseRequestInput, PurchaseRequest, PurchaseRequestService, PurchaseRequestWithItems,
};
use crate::services::store_request::ApprovalInput;
use crate::AppState;

/// Create a purchase request
pub async fn create_purchase_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Json(input): Json<CreatePurchaseRequestInput>,
) -> AppResult<Json<PurchaseRequestWithItems>> {
    let service = PurchaseRequestService::new(state.db);
    let request = service.create(scope.0.company_id, input).await?;
    Ok(Json(request))
}

/// Submit a draft purchase request for approval
pub async fn submit_purchase_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<PurchaseRequest>> {
    let service = PurchaseRequestService::new(state.db);
    let request = service.submit(scope.0.company_id, request_id).await?;
    Ok(Json(request))
}

/// Approve a pending purchase request
pub async fn approve_purchase_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(request_id): Path<Uuid>,
    Json(input): Json<ApprovalInput>,
) -> AppResult<Json<PurchaseRequest>> {
    let service = PurchaseRequestService::new(state.db);
    let request = service.approve(scope.0.company_id, request_id, input).await?;
    Ok(Json(request))
}

/// Reject a pending purchase request
pub async fn reject_purchase_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(request_id): Path<Uuid>,
    Json(input): Json<ApprovalInput>,
) -> AppResult<Json<PurchaseRequest>> {
    let service = PurchaseRequestService::new(state.db);
    let request = service.reject(scope.0.company_id, request_id, input).await?;
    Ok(Json(request))
}

/// Delete a draft purchase request
pub async fn delete_purchase_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = PurchaseRequestService::new(state.db);
    service.delete(scope.0.company_id, request_id).await?;
    Ok(Json(()))
}

/// Get a purchase request with its items
pub async fn get_purchase_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<PurchaseRequestWithItems>> {
    let service = PurchaseRequestService::new(state.db);
    let request = service.get(scope.0.company_id, request_id).await?;
    Ok(Json(request))
}

/// List all purchase requests for the company
pub async fn list_purchase_requests(
    State(state): State<AppState>,
    scope: CompanyScope,
) -> AppResult<Json<Vec<PurchaseRequest>>> {
    let service = PurchaseRequestService::new(state.db);
    let requests = service.list(scope.0.company_id).await?;
    Ok(Json(requests))
}
