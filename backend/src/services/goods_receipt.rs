//! Goods receipt (GR) service
//!
//! Drafting and reads only. Completion posts stock and updates the linked
//! purchase order, so it lives in the workflow service where the whole
//! sequence shares one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::document_number;
use shared::models::{
    DocumentType, GoodsReceiptStatus, PurchaseOrderStatus, PurchaseRequestStatus, PurchaseType,
};
use shared::validation::{validate_person_name, validate_quantity};

/// Goods receipt service
#[derive(Clone)]
pub struct GoodsReceiptService {
    db: PgPool,
}

/// Goods receipt header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GoodsReceipt {
    pub id: Uuid,
    pub company_id: Uuid,
    pub document_number: String,
    pub purchase_order_id: Option<Uuid>,
    pub purchase_request_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub vendor_name: Option<String>,
    pub status: String,
    pub received_by: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Goods receipt line item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GoodsReceiptItem {
    pub id: Uuid,
    pub goods_receipt_id: Uuid,
    pub material_id: Uuid,
    pub purchase_order_item_id: Option<Uuid>,
    pub quantity_received: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Goods receipt with its items
#[derive(Debug, Clone, Serialize)]
pub struct GoodsReceiptWithItems {
    #[serde(flatten)]
    pub receipt: GoodsReceipt,
    pub items: Vec<GoodsReceiptItem>,
}

/// Input for creating a goods receipt
#[derive(Debug, Deserialize)]
pub struct CreateGoodsReceiptInput {
    pub purchase_order_id: Option<Uuid>,
    /// Direct-purchase request being received, when no PO is involved
    pub purchase_request_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub vendor_name: Option<String>,
    pub received_by: String,
    pub notes: Option<String>,
    pub items: Vec<GoodsReceiptItemInput>,
}

/// Line item input
#[derive(Debug, Deserialize)]
pub struct GoodsReceiptItemInput {
    pub material_id: Uuid,
    pub purchase_order_item_id: Option<Uuid>,
    pub quantity_received: Decimal,
    pub unit_price: Decimal,
}

impl GoodsReceiptService {
    /// Create a new GoodsReceiptService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a goods receipt in DRAFT
    pub async fn create(
        &self,
        company_id: Uuid,
        input: CreateGoodsReceiptInput,
    ) -> AppResult<GoodsReceiptWithItems> {
        let mut tx = self.db.begin().await?;
        let receipt = Self::create_in_tx(&mut tx, company_id, input).await?;
        tx.commit().await?;
        Ok(receipt)
    }

    /// Draft a receipt inside a caller-owned transaction. The workflow's
    /// create-and-complete path drafts and completes in one unit.
    pub(crate) async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        input: CreateGoodsReceiptInput,
    ) -> AppResult<GoodsReceiptWithItems> {
        validate_person_name(&input.received_by).map_err(|msg| {
            AppError::validation("received_by", msg, "Nama penerima wajib diisi")
        })?;
        if input.items.is_empty() {
            return Err(AppError::validation(
                "items",
                "At least one item is required",
                "Minimal satu barang harus diterima",
            ));
        }
        for item in &input.items {
            validate_quantity(item.quantity_received).map_err(|msg| {
                AppError::validation("quantity_received", msg, "Jumlah diterima harus positif")
            })?;
            if item.unit_price < Decimal::ZERO {
                return Err(AppError::validation(
                    "unit_price",
                    "Unit price cannot be negative",
                    "Harga satuan tidak boleh negatif",
                ));
            }
            if item.purchase_order_item_id.is_some() && input.purchase_order_id.is_none() {
                return Err(AppError::validation(
                    "purchase_order_item_id",
                    "Item references a purchase order item but no purchase order is linked",
                    "Barang merujuk ke item PO tetapi tidak ada PO yang ditautkan",
                ));
            }
        }

        if let Some(po_id) = input.purchase_order_id {
            let status = sqlx::query_scalar::<_, String>(
                "SELECT status FROM purchase_orders WHERE id = $1 AND company_id = $2",
            )
            .bind(po_id)
            .bind(company_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

            let status = PurchaseOrderStatus::from_str(&status).ok_or_else(|| {
                AppError::Internal(format!("Unknown purchase order status: {}", status))
            })?;
            if !status.accepts_receipts() {
                return Err(AppError::validation(
                    "purchase_order_id",
                    "Purchase order is not open for receipts",
                    "Pesanan pembelian tidak terbuka untuk penerimaan",
                ));
            }

            for item in &input.items {
                if let Some(po_item_id) = item.purchase_order_item_id {
                    let belongs = sqlx::query_scalar::<_, bool>(
                        "SELECT EXISTS(SELECT 1 FROM purchase_order_items WHERE id = $1 AND purchase_order_id = $2)",
                    )
                    .bind(po_item_id)
                    .bind(po_id)
                    .fetch_one(&mut **tx)
                    .await?;
                    if !belongs {
                        return Err(AppError::NotFound("Purchase order item".to_string()));
                    }
                }
            }
        }

        // A receipt closing a purchase request must still be able to close
        // it: only approved direct-purchase requests qualify
        if let Some(pr_id) = input.purchase_request_id {
            let row = sqlx::query_as::<_, (String, String)>(
                "SELECT status, purchase_type FROM purchase_requests WHERE id = $1 AND company_id = $2",
            )
            .bind(pr_id)
            .bind(company_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase request".to_string()))?;

            let status = PurchaseRequestStatus::from_str(&row.0).ok_or_else(|| {
                AppError::Internal(format!("Unknown purchase request status: {}", row.0))
            })?;
            if status != PurchaseRequestStatus::Approved {
                return Err(AppError::validation(
                    "purchase_request_id",
                    "Purchase request is not approved for receipt",
                    "Permintaan pembelian belum disetujui untuk penerimaan",
                ));
            }
            if PurchaseType::from_str(&row.1) != Some(PurchaseType::DirectPurchase) {
                return Err(AppError::validation(
                    "purchase_request_id",
                    "Purchase request is not a direct purchase",
                    "Permintaan pembelian bukan pembelian langsung",
                ));
            }
        }

        for item in &input.items {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM materials WHERE id = $1 AND company_id = $2)",
            )
            .bind(item.material_id)
            .bind(company_id)
            .fetch_one(&mut **tx)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Material".to_string()));
            }
        }

        let number =
            document_number::next_number(tx, company_id, DocumentType::GoodsReceipt).await?;

        let receipt = sqlx::query_as::<_, GoodsReceipt>(
            r#"
            INSERT INTO goods_receipts (
                company_id, document_number, purchase_order_id, purchase_request_id,
                vendor_id, vendor_name, status, received_by, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, company_id, document_number, purchase_order_id, purchase_request_id,
                      vendor_id, vendor_name, status, received_by, notes, created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(&number)
        .bind(input.purchase_order_id)
        .bind(input.purchase_request_id)
        .bind(input.vendor_id)
        .bind(&input.vendor_name)
        .bind(GoodsReceiptStatus::Draft.as_str())
        .bind(input.received_by.trim())
        .bind(&input.notes)
        .fetch_one(&mut **tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, GoodsReceiptItem>(
                r#"
                INSERT INTO goods_receipt_items (
                    goods_receipt_id, material_id, purchase_order_item_id,
                    quantity_received, unit_price, total_price
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, goods_receipt_id, material_id, purchase_order_item_id,
                          quantity_received, unit_price, total_price
                "#,
            )
            .bind(receipt.id)
            .bind(item.material_id)
            .bind(item.purchase_order_item_id)
            .bind(item.quantity_received)
            .bind(item.unit_price)
            .bind(item.quantity_received * item.unit_price)
            .fetch_one(&mut **tx)
            .await?;
            items.push(row);
        }

        Ok(GoodsReceiptWithItems { receipt, items })
    }

    /// Delete a receipt. Only DRAFT documents may be deleted.
    pub async fn delete(&self, company_id: Uuid, receipt_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, receipt_id).await?;
        if !current.is_deletable() {
            return Err(AppError::validation(
                "status",
                "Only draft goods receipts can be deleted",
                "Hanya penerimaan barang berstatus draft yang dapat dihapus",
            ));
        }

        sqlx::query("DELETE FROM goods_receipts WHERE id = $1")
            .bind(receipt_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    /// Get a goods receipt with its items
    pub async fn get(&self, company_id: Uuid, receipt_id: Uuid) -> AppResult<GoodsReceiptWithItems> {
        let receipt = sqlx::query_as::<_, GoodsReceipt>(
            r#"
            SELECT id, company_id, document_number, purchase_order_id, purchase_request_id,
                   vendor_id, vendor_name, status, received_by, notes, created_at, updated_at
            FROM goods_receipts
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(receipt_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Goods receipt".to_string()))?;

        let items = Self::load_items(&self.db, receipt_id).await?;

        Ok(GoodsReceiptWithItems { receipt, items })
    }

    /// List all goods receipts for a company, newest first
    pub async fn list(&self, company_id: Uuid) -> AppResult<Vec<GoodsReceipt>> {
        let receipts = sqlx::query_as::<_, GoodsReceipt>(
            r#"
            SELECT id, company_id, document_number, purchase_order_id, purchase_request_id,
                   vendor_id, vendor_name, status, received_by, notes, created_at, updated_at
            FROM goods_receipts
            WHERE company_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(receipts)
    }

    pub(crate) async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        receipt_id: Uuid,
    ) -> AppResult<GoodsReceiptStatus> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM goods_receipts WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(receipt_id)
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Goods receipt".to_string()))?;

        GoodsReceiptStatus::from_str(&status)
            .ok_or_else(|| AppError::Internal(format!("Unknown goods receipt status: {}", status)))
    }

    pub(crate) async fn load_header_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        receipt_id: Uuid,
    ) -> AppResult<GoodsReceipt> {
        sqlx::query_as::<_, GoodsReceipt>(
            r#"
            SELECT id, company_id, document_number, purchase_order_id, purchase_request_id,
                   vendor_id, vendor_name, status, received_by, notes, created_at, updated_at
            FROM goods_receipts
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(receipt_id)
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Goods receipt".to_string()))
    }

    pub(crate) async fn load_items_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        receipt_id: Uuid,
    ) -> AppResult<Vec<GoodsReceiptItem>> {
        let items = sqlx::query_as::<_, GoodsReceiptItem>(
            r#"
            SELECT id, goods_receipt_id, material_id, purchase_order_item_id,
                   quantity_received, unit_price, total_price
            FROM goods_receipt_items
            WHERE goods_receipt_id = $1
            "#,
        )
        .bind(receipt_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(items)
    }

    pub(crate) async fn mark_completed_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        receipt_id: Uuid,
    ) -> AppResult<()> {
        sqlx::query("UPDATE goods_receipts SET status = $1, updated_at = now() WHERE id = $2")
            .bind(GoodsReceiptStatus::Completed.as_str())
            .bind(receipt_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn load_items(db: &PgPool, receipt_id: Uuid) -> AppResult<Vec<GoodsReceiptItem>> {
        let items = sqlx::query_as::<_, GoodsReceiptItem>(
            r#"
            SELECT id, goods_receipt_id, material_id, purchase_order_item_id,
                   quantity_received, unit_price, total_price
            FROM goods_receipt_items
            WHERE goods_receipt_id = $1
            "#,
        )
        .bind(receipt_id)
        .fetch_all(db)
        .await?;

        Ok(items)
    }
}
