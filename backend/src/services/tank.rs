//! Tank allocation ledger service
//!
//! Tracks how material stock is physically distributed across storage
//! tanks. Tank contents are an independent counter from material stock:
//! a fill is not checked against the material's stock on hand, and the
//! difference between the two is surfaced as the unbinned quantity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{apply_drain, apply_fill, tank_remaining_capacity, TankTransactionType};
use shared::validation::{validate_person_name, validate_quantity};

/// Tank allocation service
#[derive(Clone)]
pub struct TankService {
    db: PgPool,
}

/// Storage tank bound to one material
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tank {
    pub id: Uuid,
    pub company_id: Uuid,
    pub code: String,
    pub material_id: Uuid,
    pub capacity: Decimal,
    pub current_volume: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tank movement log entry with post-transaction volume snapshot
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TankTransaction {
    pub id: Uuid,
    pub company_id: Uuid,
    pub tank_id: Uuid,
    pub transaction_type: String,
    pub quantity: Decimal,
    pub volume_after: Decimal,
    pub reference: Option<String>,
    pub operator: String,
    pub created_at: DateTime<Utc>,
}

/// Input for fill and drain operations
#[derive(Debug, Clone, Deserialize)]
pub struct TankMovementInput {
    pub quantity: Decimal,
    pub reference: Option<String>,
    pub operator: String,
}

/// Input for a tank-to-tank transfer
#[derive(Debug, Clone, Deserialize)]
pub struct TankTransferInput {
    pub from_tank_id: Uuid,
    pub to_tank_id: Uuid,
    pub quantity: Decimal,
    pub operator: String,
}

/// Result of a transfer: the paired OUT and IN log entries
#[derive(Debug, Clone, Serialize)]
pub struct TankTransferResult {
    pub transfer_out: TankTransaction,
    pub transfer_in: TankTransaction,
}

/// Reconciliation view of a material's stock against its tanks.
/// `unbinned` is stock not yet placed in any tank; the two counters are
/// displayed together, never forced to agree.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationSummary {
    pub material_id: Uuid,
    pub material_name: String,
    pub stock_on_hand: Decimal,
    pub total_in_tanks: Decimal,
    pub unbinned: Decimal,
    pub tanks: Vec<TankAllocation>,
}

/// Per-tank slice of the allocation summary
#[derive(Debug, Clone, Serialize)]
pub struct TankAllocation {
    pub tank_id: Uuid,
    pub code: String,
    pub capacity: Decimal,
    pub current_volume: Decimal,
    pub remaining_capacity: Decimal,
}

/// Tank row locked for movement
#[derive(Debug, FromRow)]
struct TankForUpdate {
    id: Uuid,
    code: String,
    material_id: Uuid,
    capacity: Decimal,
    current_volume: Decimal,
}

impl TankService {
    /// Create a new TankService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fill a tank. Rejected when the quantity exceeds the remaining
    /// capacity; the material's total stock is deliberately not consulted.
    pub async fn fill(
        &self,
        company_id: Uuid,
        tank_id: Uuid,
        input: TankMovementInput,
    ) -> AppResult<TankTransaction> {
        Self::validate_movement(&input)?;

        let mut tx = self.db.begin().await?;
        let tank = Self::lock_tank(&mut tx, company_id, tank_id).await?;

        let new_volume = apply_fill(tank.capacity, tank.current_volume, input.quantity).ok_or(
            AppError::CapacityExceeded {
                tank: tank.code.clone(),
                requested: input.quantity,
                remaining: tank_remaining_capacity(tank.capacity, tank.current_volume),
            },
        )?;

        let logged = Self::apply_movement(
            &mut tx,
            company_id,
            &tank,
            TankTransactionType::Fill,
            input.quantity,
            new_volume,
            input.reference.as_deref(),
            &input.operator,
        )
        .await?;
        tx.commit().await?;

        Ok(logged)
    }

    /// Drain a tank. Rejected when the quantity exceeds current contents.
    pub async fn drain(
        &self,
        company_id: Uuid,
        tank_id: Uuid,
        input: TankMovementInput,
    ) -> AppResult<TankTransaction> {
        Self::validate_movement(&input)?;

        let mut tx = self.db.begin().await?;
        let tank = Self::lock_tank(&mut tx, company_id, tank_id).await?;

        let new_volume = apply_drain(tank.current_volume, input.quantity).ok_or(
            AppError::InsufficientTankStock {
                tank: tank.code.clone(),
                requested: input.quantity,
                available: tank.current_volume,
            },
        )?;

        let logged = Self::apply_movement(
            &mut tx,
            company_id,
            &tank,
            TankTransactionType::Drain,
            input.quantity,
            new_volume,
            input.reference.as_deref(),
            &input.operator,
        )
        .await?;
        tx.commit().await?;

        Ok(logged)
    }

    /// Transfer between two tanks of the same material, as one atomic
    /// unit. If either leg fails, neither tank changes.
    pub async fn transfer(
        &self,
        company_id: Uuid,
        input: TankTransferInput,
    ) -> AppResult<TankTransferResult> {
        validate_quantity(input.quantity).map_err(|msg| {
            AppError::validation("quantity", msg, "Jumlah harus positif")
        })?;
        validate_person_name(&input.operator).map_err(|msg| {
            AppError::validation("operator", msg, "Nama operator wajib diisi")
        })?;
        if input.from_tank_id == input.to_tank_id {
            return Err(AppError::validation(
                "to_tank_id",
                "Source and destination tank must differ",
                "Tangki asal dan tujuan harus berbeda",
            ));
        }

        let mut tx = self.db.begin().await?;

        // Lock both rows in id order so two opposing transfers cannot
        // deadlock
        let (first, second) = if input.from_tank_id < input.to_tank_id {
            (input.from_tank_id, input.to_tank_id)
        } else {
            (input.to_tank_id, input.from_tank_id)
        };
        let first_tank = Self::lock_tank(&mut tx, company_id, first).await?;
        let second_tank = Self::lock_tank(&mut tx, company_id, second).await?;
        let (from, to) = if first_tank.id == input.from_tank_id {
            (first_tank, second_tank)
        } else {
            (second_tank, first_tank)
        };

        if from.material_id != to.material_id {
            return Err(AppError::validation(
                "to_tank_id",
                "Tanks hold different materials",
                "Kedua tangki menyimpan material yang berbeda",
            ));
        }

        let from_volume = apply_drain(from.current_volume, input.quantity).ok_or(
            AppError::InsufficientTankStock {
                tank: from.code.clone(),
                requested: input.quantity,
                available: from.current_volume,
            },
        )?;
        let to_volume = apply_fill(to.capacity, to.current_volume, input.quantity).ok_or(
            AppError::CapacityExceeded {
                tank: to.code.clone(),
                requested: input.quantity,
                remaining: tank_remaining_capacity(to.capacity, to.current_volume),
            },
        )?;

        // Both legs share a reference so each tank's log is self-contained
        let reference = format!("TRF-{}", Uuid::new_v4());

        let transfer_out = Self::apply_movement(
            &mut tx,
            company_id,
            &from,
            TankTransactionType::TransferOut,
            input.quantity,
            from_volume,
            Some(&reference),
            &input.operator,
        )
        .await?;
        let transfer_in = Self::apply_movement(
            &mut tx,
            company_id,
            &to,
            TankTransactionType::TransferIn,
            input.quantity,
            to_volume,
            Some(&reference),
            &input.operator,
        )
        .await?;
        tx.commit().await?;

        Ok(TankTransferResult {
            transfer_out,
            transfer_in,
        })
    }

    /// Reconciliation summary of a material's stock against its tanks
    pub async fn allocation_summary(
        &self,
        company_id: Uuid,
        material_id: Uuid,
    ) -> AppResult<AllocationSummary> {
        let material = sqlx::query_as::<_, (String, Decimal)>(
            "SELECT name, stock_on_hand FROM materials WHERE id = $1 AND company_id = $2",
        )
        .bind(material_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Material".to_string()))?;

        let tanks = sqlx::query_as::<_, (Uuid, String, Decimal, Decimal)>(
            r#"
            SELECT id, code, capacity, current_volume
            FROM tanks
            WHERE material_id = $1 AND company_id = $2
            ORDER BY code
            "#,
        )
        .bind(material_id)
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        let total_in_tanks: Decimal = tanks.iter().map(|t| t.3).sum();

        Ok(AllocationSummary {
            material_id,
            material_name: material.0,
            stock_on_hand: material.1,
            total_in_tanks,
            unbinned: material.1 - total_in_tanks,
            tanks: tanks
                .into_iter()
                .map(|(tank_id, code, capacity, current_volume)| TankAllocation {
                    tank_id,
                    code,
                    capacity,
                    current_volume,
                    remaining_capacity: tank_remaining_capacity(capacity, current_volume),
                })
                .collect(),
        })
    }

    /// Get a tank by id
    pub async fn get_tank(&self, company_id: Uuid, tank_id: Uuid) -> AppResult<Tank> {
        sqlx::query_as::<_, Tank>(
            r#"
            SELECT id, company_id, code, material_id, capacity, current_volume,
                   created_at, updated_at
            FROM tanks
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(tank_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tank".to_string()))
    }

    /// List all tanks for a company
    pub async fn list_tanks(&self, company_id: Uuid) -> AppResult<Vec<Tank>> {
        let tanks = sqlx::query_as::<_, Tank>(
            r#"
            SELECT id, company_id, code, material_id, capacity, current_volume,
                   created_at, updated_at
            FROM tanks
            WHERE company_id = $1
            ORDER BY code
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(tanks)
    }

    /// Get the movement log for a tank, newest first
    pub async fn get_transactions(
        &self,
        company_id: Uuid,
        tank_id: Uuid,
    ) -> AppResult<Vec<TankTransaction>> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tanks WHERE id = $1 AND company_id = $2)",
        )
        .bind(tank_id)
        .bind(company_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Tank".to_string()));
        }

        let transactions = sqlx::query_as::<_, TankTransaction>(
            r#"
            SELECT id, company_id, tank_id, transaction_type, quantity, volume_after,
                   reference, operator, created_at
            FROM tank_transactions
            WHERE tank_id = $1 AND company_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(tank_id)
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(transactions)
    }

    fn validate_movement(input: &TankMovementInput) -> AppResult<()> {
        validate_quantity(input.quantity).map_err(|msg| {
            AppError::validation("quantity", msg, "Jumlah harus positif")
        })?;
        validate_person_name(&input.operator).map_err(|msg| {
            AppError::validation("operator", msg, "Nama operator wajib diisi")
        })?;
        Ok(())
    }

    async fn lock_tank(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        tank_id: Uuid,
    ) -> AppResult<TankForUpdate> {
        sqlx::query_as::<_, TankForUpdate>(
            r#"
            SELECT id, code, material_id, capacity, current_volume
            FROM tanks
            WHERE id = $1 AND company_id = $2
            FOR UPDATE
            "#,
        )
        .bind(tank_id)
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Tank".to_string()))
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply_movement(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        tank: &TankForUpdate,
        transaction_type: TankTransactionType,
        quantity: Decimal,
        new_volume: Decimal,
        reference: Option<&str>,
        operator: &str,
    ) -> AppResult<TankTransaction> {
        sqlx::query("UPDATE tanks SET current_volume = $1, updated_at = now() WHERE id = $2")
            .bind(new_volume)
            .bind(tank.id)
            .execute(&mut **tx)
            .await?;

        let logged = sqlx::query_as::<_, TankTransaction>(
            r#"
            INSERT INTO tank_transactions (
                company_id, tank_id, transaction_type, quantity, volume_after,
                reference, operator
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, company_id, tank_id, transaction_type, quantity, volume_after,
                      reference, operator, created_at
            "#,
        )
        .bind(company_id)
        .bind(tank.id)
        .bind(transaction_type.as_str())
        .bind(quantity)
        .bind(new_volume)
        .bind(reference)
        .bind(operator)
        .fetch_one(&mut **tx)
        .await?;

        Ok(logged)
    }
}
