//! HTTP handlers for stock ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CompanyScope;
use crate::services::stock_ledger::{
    AdjustStockInput, InventoryTransaction, MaterialStock, PostStockInput, StockLedgerService,
};
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

/// Post a stock movement
pub async fn post_stock(
    State(state): State<AppState>,
    scope: CompanyScope,
    Json(input): Json<PostStockInput>,
) -> AppResult<Json<InventoryTransaction>> {
    let service = StockLedgerService::new(state.db);
    let transaction = service.post(scope.0.company_id, input).await?;
    Ok(Json(transaction))
}

/// Post a signed stock adjustment
pub async fn adjust_stock(
    State(state): State<AppState>,
    scope: CompanyScope,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<InventoryTransaction>> {
    let service = StockLedgerService::new(state.db);
    let transaction = service.adjust(scope.0.company_id, input).await?;
    Ok(Json(transaction))
}

/// Get current stock for a material
pub async fn get_stock(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(material_id): Path<Uuid>,
) -> AppResult<Json<MaterialStock>> {
    let service = StockLedgerService::new(state.db);
    let stock = service.get_stock(scope.0.company_id, material_id).await?;
    Ok(Json(stock))
}

/// Get the transaction log for a material
pub async fn get_material_transactions(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(material_id): Path<Uuid>,
) -> AppResult<Json<Vec<InventoryTransaction>>> {
    let service = StockLedgerService::new(state.db);
    let transactions = service
        .get_transactions(scope.0.company_id, material_id)
        .await?;
    Ok(Json(transactions))
}

/// List stock transactions for the company, paginated
pub async fn list_stock_transactions(
    State(state): State<AppState>,
    scope: CompanyScope,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<InventoryTransaction>>> {
    let service = StockLedgerService::new(state.db);
    let transactions = service
        .list_transactions(scope.0.company_id, pagination)
        .await?;
    Ok(Json(transactions))
}
