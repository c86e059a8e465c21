//! HTTP handlers for store request endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CompanyScope;
use crate::services::store_request::{
    ApprovalInput, CreateStoreRequestInput, StoreRequest, StoreRequestApproval,
    StoreRequestService, StoreRequestWithItems,
};
use crate::services::workflow::{IssueInput, SpawnPurchaseRequestInput, WorkflowService};
use crate::services::purchase_request::PurchaseRequestWithItems;
use crate::services::goods_issue::GoodsIssueWithItems;
use crate::AppState;

/// Create a store request
pub async fn create_store_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Json(input): Json<CreateStoreRequestInput>,
) -> AppResult<Json<StoreRequestWithItems>> {
    let service = StoreRequestService::new(state.db);
    let request = service.create(scope.0.company_id, input).await?;
    Ok(Json(request))
}

/// Submit a draft store request for approval
pub async fn submit_store_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<StoreRequest>> {
    let service = StoreRequestService::new(state.db);
    let request = service.submit(scope.0.company_id, request_id).await?;
    Ok(Json(request))
}

/// Approve a pending store request
pub async fn approve_store_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(request_id): Path<Uuid>,
    Json(input): Json<ApprovalInput>,
) -> AppResult<Json<StoreRequestApproval>> {
    let service = StoreRequestService::new(state.db);
    let approval = service.approve(scope.0.company_id, request_id, input).await?;
    Ok(Json(approval))
}

/// Reject a pending store request
pub async fn reject_store_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(request_id): Path<Uuid>,
    Json(input): Json<ApprovalInput>,
) -> AppResult<Json<StoreRequest>> {
    let service = StoreRequestService::new(state.db);
    let request = service.reject(scope.0.company_id, request_id, input).await?;
    Ok(Json(request))
}

/// Delete a draft store request
pub async fn delete_store_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = StoreRequestService::new(state.db);
    service.delete(scope.0.company_id, request_id).await?;
    Ok(Json(()))
}

/// Get a store request with its items
pub async fn get_store_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<StoreRequestWithItems>> {
    let service = StoreRequestService::new(state.db);
    let request = service.get(scope.0.company_id, request_id).await?;
    Ok(Json(request))
}

/// List all store requests for the company
pub async fn list_store_requests(
    State(state): State<AppState>,
    scope: CompanyScope,
) -> AppResult<Json<Vec<StoreRequest>>> {
    let service = StoreRequestService::new(state.db);
    let requests = service.list(scope.0.company_id).await?;
    Ok(Json(requests))
}

/// Fulfil an approved store request: spawn a pre-approved goods issue and
/// issue it in one transaction
pub async fn fulfil_store_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(request_id): Path<Uuid>,
    Json(input): Json<IssueInput>,
) -> AppResult<Json<GoodsIssueWithItems>> {
    let service = WorkflowService::new(state.db);
    let issue = service
        .create_goods_issue_from_store_request(scope.0.company_id, request_id, input)
        .await?;
    Ok(Json(issue))
}

/// Spawn a purchase request from a store request's shortfall items
pub async fn spawn_purchase_request(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(request_id): Path<Uuid>,
    Json(input): Json<SpawnPurchaseRequestInput>,
) -> AppResult<Json<PurchaseRequestWithItems>> {
    let service = WorkflowService::new(state.db);
    let request = service
        .create_purchase_request_from_store_request(scope.0.company_id, request_id, input)
        .await?;
    Ok(Json(request))
}
