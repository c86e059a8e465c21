//! HTTP handlers for goods issue endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CompanyScope;
use crate::services::goods_issue::{
    CreateGoodsIssueInput, GoodsIssue, GoodsIssueService, GoodsIssueWithItems,
};
use crate::services::store_request::ApprovalInput;
use crate::services::workflow::{IssueInput, WorkflowService};
use crate::AppState;

/// Create a draft goods issue
pub async fn create_goods_issue(
    State(state): State<AppState>,
    scope: CompanyScope,
    Json(input): Json<CreateGoodsIssueInput>,
) -> AppResult<Json<GoodsIssueWithItems>> {
    let service = GoodsIssueService::new(state.db);
    let issue = service.create(scope.0.company_id, input).await?;
    Ok(Json(issue))
}

/// Submit a draft goods issue for approval
pub async fn submit_goods_issue(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(issue_id): Path<Uuid>,
) -> AppResult<Json<GoodsIssue>> {
    let service = GoodsIssueService::new(state.db);
    let issue = service.submit(scope.0.company_id, issue_id).await?;
    Ok(Json(issue))
}

/// Approve a pending goods issue
pub async fn approve_goods_issue(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(issue_id): Path<Uuid>,
    Json(input): Json<ApprovalInput>,
) -> AppResult<Json<GoodsIssue>> {
    let service = GoodsIssueService::new(state.db);
    let issue = service.approve(scope.0.company_id, issue_id, input).await?;
    Ok(Json(issue))
}

/// Reject a pending goods issue
pub async fn reject_goods_issue(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(issue_id): Path<Uuid>,
    Json(input): Json<ApprovalInput>,
) -> AppResult<Json<GoodsIssue>> {
    let service = GoodsIssueService::new(state.db);
    let issue = service.reject(scope.0.company_id, issue_id, input).await?;
    Ok(Json(issue))
}

/// Issue an approved goods issue, posting stock OUT and pricing the items
pub async fn issue_goods_issue(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(issue_id): Path<Uuid>,
    Json(input): Json<IssueInput>,
) -> AppResult<Json<GoodsIssueWithItems>> {
    let service = WorkflowService::new(state.db);
    let issue = service
        .issue_goods_issue(scope.0.company_id, issue_id, input)
        .await?;
    Ok(Json(issue))
}

/// Delete a draft goods issue
pub async fn delete_goods_issue(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(issue_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = GoodsIssueService::new(state.db);
    service.delete(scope.0.company_id, issue_id).await?;
    Ok(Json(()))
}

/// Get a goods issue with its items
pub async fn get_goods_issue(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(issue_id): Path<Uuid>,
) -> AppResult<Json<GoodsIssueWithItems>> {
    let service = GoodsIssueService::new(state.db);
    let issue = service.get(scope.0.company_id, issue_id).await?;
    Ok(Json(issue))
}

/// List all goods issues for the company
pub async fn list_goods_issues(
    State(state): State<AppState>,
    scope: CompanyScope,
) -> AppResult<Json<Vec<GoodsIssue>>> {
    let service = GoodsIssueService::new(state.db);
    let issues = service.list(scope.0.company_id).await?;
    Ok(Json(issues))
}
