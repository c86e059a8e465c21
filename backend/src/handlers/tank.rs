//! HTTP handlers for tank allocation endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CompanyScope;
use crate::services::tank::{
    AllocationSummary, Tank, TankMovementInput, TankService, TankTransaction, TankTransferInput,
    TankTransferResult,
};
use crate::AppState;

/// Fill a tank
pub async fn fill_tank(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(tank_id): Path<Uuid>,
    Json(input): Json<TankMovementInput>,
) -> AppResult<Json<TankTransaction>> {
    let service = TankService::new(state.db);
    let transaction = service.fill(scope.0.company_id, tank_id, input).await?;
    Ok(Json(transaction))
}

/// Drain a tank
pub async fn drain_tank(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(tank_id): Path<Uuid>,
    Json(input): Json<TankMovementInput>,
) -> AppResult<Json<TankTransaction>> {
    let service = TankService::new(state.db);
    let transaction = service.drain(scope.0.company_id, tank_id, input).await?;
    Ok(Json(transaction))
}

/// Transfer between two tanks holding the same material
pub async fn transfer_between_tanks(
    State(state): State<AppState>,
    scope: CompanyScope,
    Json(input): Json<TankTransferInput>,
) -> AppResult<Json<TankTransferResult>> {
    let service = TankService::new(state.db);
    let result = service.transfer(scope.0.company_id, input).await?;
    Ok(Json(result))
}

/// Get a tank
pub async fn get_tank(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(tank_id): Path<Uuid>,
) -> AppResult<Json<Tank>> {
    let service = TankService::new(state.db);
    let tank = service.get_tank(scope.0.company_id, tank_id).await?;
    Ok(Json(tank))
}

/// List all tanks for the company
pub async fn list_tanks(
    State(state): State<AppState>,
    scope: CompanyScope,
) -> AppResult<Json<Vec<Tank>>> {
    let service = TankService::new(state.db);
    let tanks = service.list_tanks(scope.0.company_id).await?;
    Ok(Json(tanks))
}

/// Get the movement log for a tank
pub async fn get_tank_transactions(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(tank_id): Path<Uuid>,
) -> AppResult<Json<Vec<TankTransaction>>> {
    let service = TankService::new(state.db);
    let transactions = service.get_transactions(scope.0.company_id, tank_id).await?;
    Ok(Json(transactions))
}

/// Tank allocation summary for a material, shown next to the material's
/// ledger stock
pub async fn get_allocation_summary(
    State(state): State<AppState>,
    scope: CompanyScope,
    Path(material_id): Path<Uuid>,
) -> AppResult<Json<AllocationSummary>> {
    let service = TankService::new(state.db);
    let summary = service
        .allocation_summary(scope.0.company_id, material_id)
        .await?;
    Ok(Json(summary))
}
