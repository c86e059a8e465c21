//! HTTP handlers for goods receipt endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CompanyScope;
use crate::services::goods_receipt::{
    CreateGoodsReceiptInput, GoodsReceipt, GoodsReceiptService, GoodsReceiptWithItems,
};
use crate::services::workflow::WorkflowService;
use crate::AppState;

/// Create a draft goods receipt
pub async fn create_goods_receipt(
    State(state): State<AppState>,
    scope: CompanyScope,
    Json(input): Json<CreateGoodsReceiptInput>,
) -> AppResult<Json<GoodsReceiptWithItems>> {
    let service = GoodsReceiptService::new(state.db);
    let receipt = service.create(scope.0.company_id, input).await?;
    Ok(Json(receipt))
}

/// Complete a draft goods receipt, posting stock and updating the linked
/// purchase order in one transaction
pub async fn complete_goods_receipt(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(receipt_id): Path<Uuid>,
) -> AppResult<Json<GoodsReceiptWithItems>> {
    let service = WorkflowService::new(state.db);
    let receipt = service
        .complete_goods_receipt(scope.0.company_id, receipt_id)
        .await?;
    Ok(Json(receipt))
}

/// Create and complete a goods receipt as one unit
pub async fn receive_goods(
    State(state): State<AppState>,
    scope: CompanyScope,
    Json(input): Json<CreateGoodsReceiptInput>,
) -> AppResult<Json<GoodsReceiptWithItems>> {
    let service = WorkflowService::new(state.db);
    let receipt = service
        .create_and_complete_goods_receipt(scope.0.company_id, input)
        .await?;
    Ok(Json(receipt))
}

/// Delete a draft goods receipt
pub async fn delete_goods_receipt(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(receipt_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = GoodsReceiptService::new(state.db);
    service.delete(scope.0.company_id, receipt_id).await?;
    Ok(Json(()))
}

/// Get a goods receipt with its items
pub async fn get_goods_receipt(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(receipt_id): Path<Uuid>,
) -> AppResult<Json<GoodsReceiptWithItems>> {
    let service = GoodsReceiptService::new(state.db);
    let receipt = service.get(scope.0.company_id, receipt_id).await?;
    Ok(Json(receipt))
}

/// List all goods receipts for the company
pub async fn list_goods_receipts(
    State(state): State<AppState>,
    scope: CompanyScope,
) -> AppResult<Json<Vec<GoodsReceipt>>> {
    let service = GoodsReceiptService::new(state.db);
    let receipts = service.list(scope.0.company_id).await?;
    Ok(Json(receipts))
}
