//! Stock ledger service
//!
//! The single point of truth for material stock. Every quantity change goes
//! through one atomic path: lock the material row, guard the posting, write
//! the new stock, and append the immutable transaction row carrying the
//! post-transaction snapshot. Nothing else in the system mutates
//! `materials.stock_on_hand`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{
    apply_posting, stock_level_status, trailing_average_price, StockDirection, StockLevelStatus,
    TransactionType, PRICE_WINDOW,
};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_person_name, validate_quantity};

/// Stock ledger service owning material stock and the transaction log
#[derive(Clone)]
pub struct StockLedgerService {
    db: PgPool,
}

/// Immutable ledger entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub company_id: Uuid,
    pub material_id: Uuid,
    pub transaction_type: String,
    pub quantity_in: Decimal,
    pub quantity_out: Decimal,
    /// Material stock immediately after this posting
    pub stock_on_hand: Decimal,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub reference: Option<String>,
    pub operator: String,
    pub created_at: DateTime<Utc>,
}

/// Input for posting a stock movement
#[derive(Debug, Clone, Deserialize)]
pub struct PostStockInput {
    pub material_id: Uuid,
    pub direction: StockDirection,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    pub reference: Option<String>,
    pub operator: String,
}

/// Input for a signed adjustment posting
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustStockInput {
    pub material_id: Uuid,
    /// Signed delta; positive restocks, negative writes off
    pub delta: Decimal,
    pub unit_price: Option<Decimal>,
    pub reference: Option<String>,
    pub operator: String,
}

/// Current stock view with advisory threshold classification
#[derive(Debug, Clone, Serialize)]
pub struct MaterialStock {
    pub material_id: Uuid,
    pub part_number: String,
    pub name: String,
    pub unit: String,
    pub stock_on_hand: Decimal,
    pub min_stock: Option<Decimal>,
    pub max_stock: Option<Decimal>,
    pub level_status: StockLevelStatus,
}

/// Material row locked for posting
#[derive(Debug, FromRow)]
struct MaterialForUpdate {
    name: String,
    stock_on_hand: Decimal,
}

impl StockLedgerService {
    /// Create a new StockLedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Post a stock movement as its own atomic unit
    pub async fn post(
        &self,
        company_id: Uuid,
        input: PostStockInput,
    ) -> AppResult<InventoryTransaction> {
        let transaction_type = match input.direction {
            StockDirection::In => TransactionType::In,
            StockDirection::Out => TransactionType::Out,
        };

        let mut tx = self.db.begin().await?;
        let posted = Self::post_in_tx(
            &mut tx,
            company_id,
            input.material_id,
            transaction_type,
            input.direction,
            input.quantity,
            input.unit_price,
            input.reference.as_deref(),
            &input.operator,
        )
        .await?;
        tx.commit().await?;

        Ok(posted)
    }

    /// Post a signed adjustment through the same atomic path and the same
    /// non-negative stock guard
    pub async fn adjust(
        &self,
        company_id: Uuid,
        input: AdjustStockInput,
    ) -> AppResult<InventoryTransaction> {
        if input.delta.is_zero() {
            return Err(AppError::validation(
                "delta",
                "Adjustment delta must not be zero",
                "Delta penyesuaian tidak boleh nol",
            ));
        }

        let direction = if input.delta > Decimal::ZERO {
            StockDirection::In
        } else {
            StockDirection::Out
        };

        let mut tx = self.db.begin().await?;
        let posted = Self::post_in_tx(
            &mut tx,
            company_id,
            input.material_id,
            TransactionType::Adjustment,
            direction,
            input.delta.abs(),
            input.unit_price,
            input.reference.as_deref(),
            &input.operator,
        )
        .await?;
        tx.commit().await?;

        Ok(posted)
    }

    /// Core posting primitive, usable inside a caller-owned transaction.
    ///
    /// Locks the material row before reading the stock and holds the lock
    /// until the caller commits, so concurrent OUT postings serialize on
    /// the material.
    #[allow(clippy::too_many_arguments)]
    pub async fn post_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        material_id: Uuid,
        transaction_type: TransactionType,
        direction: StockDirection,
        quantity: Decimal,
        unit_price: Option<Decimal>,
        reference: Option<&str>,
        operator: &str,
    ) -> AppResult<InventoryTransaction> {
        validate_quantity(quantity).map_err(|msg| {
            AppError::validation("quantity", msg, "Jumlah harus positif")
        })?;
        validate_person_name(operator).map_err(|msg| {
            AppError::validation("operator", msg, "Nama operator wajib diisi")
        })?;

        let material = sqlx::query_as::<_, MaterialForUpdate>(
            "SELECT name, stock_on_hand FROM materials WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(material_id)
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Material".to_string()))?;

        let new_stock = apply_posting(material.stock_on_hand, direction, quantity).ok_or(
            AppError::InsufficientStock {
                material: material.name.clone(),
                requested: quantity,
                available: material.stock_on_hand,
            },
        )?;

        sqlx::query("UPDATE materials SET stock_on_hand = $1, updated_at = now() WHERE id = $2")
            .bind(new_stock)
            .bind(material_id)
            .execute(&mut **tx)
            .await?;

        let (quantity_in, quantity_out) = match direction {
            StockDirection::In => (quantity, Decimal::ZERO),
            StockDirection::Out => (Decimal::ZERO, quantity),
        };
        let total_price = unit_price.map(|p| p * quantity);

        let transaction = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            INSERT INTO inventory_transactions (
                company_id, material_id, transaction_type, quantity_in, quantity_out,
                stock_on_hand, unit_price, total_price, reference, operator
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, company_id, material_id, transaction_type, quantity_in, quantity_out,
                      stock_on_hand, unit_price, total_price, reference, operator, created_at
            "#,
        )
        .bind(company_id)
        .bind(material_id)
        .bind(transaction_type.as_str())
        .bind(quantity_in)
        .bind(quantity_out)
        .bind(new_stock)
        .bind(unit_price)
        .bind(total_price)
        .bind(reference)
        .bind(operator)
        .fetch_one(&mut **tx)
        .await?;

        Ok(transaction)
    }

    /// Quantity-weighted average unit price over the material's trailing
    /// priced transactions, for goods-issue pricing. `None` when the
    /// material has no priced history.
    pub async fn trailing_unit_price_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        material_id: Uuid,
    ) -> AppResult<Option<Decimal>> {
        let rows = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT quantity_in + quantity_out, unit_price
            FROM inventory_transactions
            WHERE material_id = $1 AND company_id = $2 AND unit_price IS NOT NULL
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(material_id)
        .bind(company_id)
        .bind(PRICE_WINDOW)
        .fetch_all(&mut **tx)
        .await?;

        Ok(trailing_average_price(&rows))
    }

    /// Get the current stock view for a material
    pub async fn get_stock(&self, company_id: Uuid, material_id: Uuid) -> AppResult<MaterialStock> {
        let row = sqlx::query_as::<_, (String, String, String, Decimal, Option<Decimal>, Option<Decimal>)>(
            r#"
            SELECT part_number, name, unit, stock_on_hand, min_stock, max_stock
            FROM materials
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(material_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Material".to_string()))?;

        Ok(MaterialStock {
            material_id,
            part_number: row.0,
            name: row.1,
            unit: row.2,
            stock_on_hand: row.3,
            min_stock: row.4,
            max_stock: row.5,
            level_status: stock_level_status(row.3, row.4, row.5),
        })
    }

    /// Get the transaction log for a material, newest first
    pub async fn get_transactions(
        &self,
        company_id: Uuid,
        material_id: Uuid,
    ) -> AppResult<Vec<InventoryTransaction>> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM materials WHERE id = $1 AND company_id = $2)",
        )
        .bind(material_id)
        .bind(company_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Material".to_string()));
        }

        let transactions = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            SELECT id, company_id, material_id, transaction_type, quantity_in, quantity_out,
                   stock_on_hand, unit_price, total_price, reference, operator, created_at
            FROM inventory_transactions
            WHERE material_id = $1 AND company_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(material_id)
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(transactions)
    }

    /// List transactions for a company, newest first, one page at a time
    pub async fn list_transactions(
        &self,
        company_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<InventoryTransaction>> {
        let total_items = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM inventory_transactions WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_one(&self.db)
        .await?;

        let transactions = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            SELECT id, company_id, material_id, transaction_type, quantity_in, quantity_out,
                   stock_on_hand, unit_price, total_price, reference, operator, created_at
            FROM inventory_transactions
            WHERE company_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id)
        .bind(pagination.per_page() as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: transactions,
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }
}
