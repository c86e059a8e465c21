//! Purchase order (PO) service
//!
//! Vendor order with per-item ordered and cumulative received quantities.
//! The aggregate status is derived from item progress and refreshed inside
//! every goods-receipt transaction, never left stale.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::document_number;
use crate::services::purchase_request::PurchaseRequestService;
use crate::services::store_request::ApprovalInput;
use shared::models::{
    derive_po_status, DocumentType, PoItemProgress, PurchaseOrderStatus, PurchaseRequestStatus,
    PurchaseType,
};
use shared::validation::{validate_person_name, validate_quantity};

/// Purchase order service
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: PgPool,
}

/// Purchase order header with vendor snapshot and money totals
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub company_id: Uuid,
    pub document_number: String,
    pub purchase_request_id: Option<Uuid>,
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub vendor_address: Option<String>,
    pub status: String,
    pub approved_by: Option<String>,
    pub issued_by: Option<String>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Purchase order line item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrderItem {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub material_id: Uuid,
    pub quantity_ordered: Decimal,
    /// Cumulative received across goods receipts
    pub quantity_received: Decimal,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Purchase order with its items
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderWithItems {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}

/// Input for creating a purchase order
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseOrderInput {
    /// Approved PO-track purchase request this order fulfils, if any
    pub purchase_request_id: Option<Uuid>,
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub vendor_address: Option<String>,
    pub tax: Option<Decimal>,
    pub shipping_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub items: Vec<PurchaseOrderItemInput>,
}

/// Line item input
#[derive(Debug, Deserialize)]
pub struct PurchaseOrderItemInput {
    pub material_id: Uuid,
    pub quantity_ordered: Decimal,
    pub unit_price: Decimal,
}

/// Input for issuing an order
#[derive(Debug, Deserialize)]
pub struct IssueOrderInput {
    pub issuer: String,
}

impl PurchaseOrderService {
    /// Create a new PurchaseOrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a purchase order in DRAFT.
    ///
    /// When created from a purchase request, the request must be an
    /// approved PO-track request and is marked PO_CREATED in the same
    /// transaction.
    pub async fn create(
        &self,
        company_id: Uuid,
        input: CreatePurchaseOrderInput,
    ) -> AppResult<PurchaseOrderWithItems> {
        if input.vendor_name.trim().is_empty() {
            return Err(AppError::validation(
                "vendor_name",
                "Vendor name is required",
                "Nama vendor wajib diisi",
            ));
        }
        if input.items.is_empty() {
            return Err(AppError::validation(
                "items",
                "At least one item is required",
                "Minimal satu barang harus dipesan",
            ));
        }
        for item in &input.items {
            validate_quantity(item.quantity_ordered).map_err(|msg| {
                AppError::validation("quantity_ordered", msg, "Jumlah pesanan harus positif")
            })?;
            if item.unit_price < Decimal::ZERO {
                return Err(AppError::validation(
                    "unit_price",
                    "Unit price cannot be negative",
                    "Harga satuan tidak boleh negatif",
                ));
            }
        }

        let tax = input.tax.unwrap_or(Decimal::ZERO);
        let shipping_cost = input.shipping_cost.unwrap_or(Decimal::ZERO);

        let mut tx = self.db.begin().await?;

        if let Some(pr_id) = input.purchase_request_id {
            let row = sqlx::query_as::<_, (String, String)>(
                "SELECT status, purchase_type FROM purchase_requests WHERE id = $1 AND company_id = $2 FOR UPDATE",
            )
            .bind(pr_id)
            .bind(company_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase request".to_string()))?;

            let status = PurchaseRequestStatus::from_str(&row.0).ok_or_else(|| {
                AppError::Internal(format!("Unknown purchase request status: {}", row.0))
            })?;
            if status != PurchaseRequestStatus::Approved {
                return Err(AppError::InvalidTransition {
                    document: "purchase request".to_string(),
                    from: status.to_string(),
                    to: PurchaseRequestStatus::PoCreated.to_string(),
                });
            }
            if PurchaseType::from_str(&row.1) != Some(PurchaseType::PoSubmission) {
                return Err(AppError::validation(
                    "purchase_request_id",
                    "Purchase request is not on the purchase-order track",
                    "Permintaan pembelian bukan jalur pengajuan PO",
                ));
            }
        }

        for item in &input.items {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM materials WHERE id = $1 AND company_id = $2)",
            )
            .bind(item.material_id)
            .bind(company_id)
            .fetch_one(&mut *tx)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Material".to_string()));
            }
        }

        let subtotal: Decimal = input
            .items
            .iter()
            .map(|i| i.quantity_ordered * i.unit_price)
            .sum();
        let total = subtotal + tax + shipping_cost;

        let number =
            document_number::next_number(&mut tx, company_id, DocumentType::PurchaseOrder).await?;

        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            INSERT INTO purchase_orders (
                company_id, document_number, purchase_request_id, vendor_id, vendor_name,
                vendor_address, status, subtotal, tax, shipping_cost, total, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, company_id, document_number, purchase_request_id, vendor_id,
                      vendor_name, vendor_address, status, approved_by, issued_by,
                      subtotal, tax, shipping_cost, total, notes, created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(&number)
        .bind(input.purchase_request_id)
        .bind(input.vendor_id)
        .bind(input.vendor_name.trim())
        .bind(&input.vendor_address)
        .bind(PurchaseOrderStatus::Draft.as_str())
        .bind(subtotal)
        .bind(tax)
        .bind(shipping_cost)
        .bind(total)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, PurchaseOrderItem>(
                r#"
                INSERT INTO purchase_order_items (
                    purchase_order_id, material_id, quantity_ordered, unit_price, subtotal
                )
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, purchase_order_id, material_id, quantity_ordered,
                          quantity_received, unit_price, subtotal
                "#,
            )
            .bind(order.id)
            .bind(item.material_id)
            .bind(item.quantity_ordered)
            .bind(item.unit_price)
            .bind(item.quantity_ordered * item.unit_price)
            .fetch_one(&mut *tx)
            .await?;
            items.push(row);
        }

        if let Some(pr_id) = input.purchase_request_id {
            PurchaseRequestService::mark_po_created_in_tx(&mut tx, company_id, pr_id).await?;
        }

        tx.commit().await?;

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// Record the approver on a draft order. The order stays DRAFT;
    /// issuing is a separate step that requires the approval.
    pub async fn approve(
        &self,
        company_id: Uuid,
        order_id: Uuid,
        input: ApprovalInput,
    ) -> AppResult<PurchaseOrder> {
        validate_person_name(&input.approver).map_err(|msg| {
            AppError::validation("approver", msg, "Nama penyetuju wajib diisi")
        })?;

        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, order_id).await?;
        if current != PurchaseOrderStatus::Draft {
            return Err(AppError::InvalidTransition {
                document: "purchase order".to_string(),
                from: current.to_string(),
                to: "approved draft".to_string(),
            });
        }

        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            UPDATE purchase_orders
            SET approved_by = $1, updated_at = now()
            WHERE id = $2
            RETURNING id, company_id, document_number, purchase_request_id, vendor_id,
                      vendor_name, vendor_address, status, approved_by, issued_by,
                      subtotal, tax, shipping_cost, total, notes, created_at, updated_at
            "#,
        )
        .bind(input.approver.trim())
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(order)
    }

    /// Issue an approved draft order to the vendor
    pub async fn issue(
        &self,
        company_id: Uuid,
        order_id: Uuid,
        input: IssueOrderInput,
    ) -> AppResult<PurchaseOrder> {
        validate_person_name(&input.issuer).map_err(|msg| {
            AppError::validation("issuer", msg, "Nama penerbit wajib diisi")
        })?;

        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, order_id).await?;
        Self::guard(current, PurchaseOrderStatus::Issued)?;

        let approved = sqlx::query_scalar::<_, Option<String>>(
            "SELECT approved_by FROM purchase_orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;
        if approved.as_deref().unwrap_or("").trim().is_empty() {
            return Err(AppError::validation(
                "approved_by",
                "Purchase order has not been approved",
                "Pesanan pembelian belum disetujui",
            ));
        }

        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            UPDATE purchase_orders
            SET status = $1, issued_by = $2, updated_at = now()
            WHERE id = $3
            RETURNING id, company_id, document_number, purchase_request_id, vendor_id,
                      vendor_name, vendor_address, status, approved_by, issued_by,
                      subtotal, tax, shipping_cost, total, notes, created_at, updated_at
            "#,
        )
        .bind(PurchaseOrderStatus::Issued.as_str())
        .bind(input.issuer.trim())
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(order)
    }

    /// Cancel a non-terminal order. The record is retained, not deletable.
    pub async fn cancel(&self, company_id: Uuid, order_id: Uuid) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, order_id).await?;
        Self::guard(current, PurchaseOrderStatus::Cancelled)?;

        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            UPDATE purchase_orders
            SET status = $1, updated_at = now()
            WHERE id = $2
            RETURNING id, company_id, document_number, purchase_request_id, vendor_id,
                      vendor_name, vendor_address, status, approved_by, issued_by,
                      subtotal, tax, shipping_cost, total, notes, created_at, updated_at
            "#,
        )
        .bind(PurchaseOrderStatus::Cancelled.as_str())
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(order)
    }

    /// Delete an order. Only DRAFT documents may be deleted.
    pub async fn delete(&self, company_id: Uuid, order_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, order_id).await?;
        if !current.is_deletable() {
            return Err(AppError::validation(
                "status",
                "Only draft purchase orders can be deleted",
                "Hanya pesanan pembelian berstatus draft yang dapat dihapus",
            ));
        }

        sqlx::query("DELETE FROM purchase_orders WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    /// Get a purchase order with its items
    pub async fn get(&self, company_id: Uuid, order_id: Uuid) -> AppResult<PurchaseOrderWithItems> {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT id, company_id, document_number, purchase_request_id, vendor_id,
                   vendor_name, vendor_address, status, approved_by, issued_by,
                   subtotal, tax, shipping_cost, total, notes, created_at, updated_at
            FROM purchase_orders
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(order_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let items = sqlx::query_as::<_, PurchaseOrderItem>(
            r#"
            SELECT id, purchase_order_id, material_id, quantity_ordered,
                   quantity_received, unit_price, subtotal
            FROM purchase_order_items
            WHERE purchase_order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// List all purchase orders for a company, newest first
    pub async fn list(&self, company_id: Uuid) -> AppResult<Vec<PurchaseOrder>> {
        let orders = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT id, company_id, document_number, purchase_request_id, vendor_id,
                   vendor_name, vendor_address, status, approved_by, issued_by,
                   subtotal, tax, shipping_cost, total, notes, created_at, updated_at
            FROM purchase_orders
            WHERE company_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(orders)
    }

    /// Bump a PO item's cumulative received quantity inside a receipt
    /// transaction
    pub(crate) async fn receive_item_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        po_item_id: Uuid,
        quantity: Decimal,
    ) -> AppResult<()> {
        let updated = sqlx::query(
            "UPDATE purchase_order_items SET quantity_received = quantity_received + $1 WHERE id = $2",
        )
        .bind(quantity)
        .bind(po_item_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::NotFound("Purchase order item".to_string()));
        }
        Ok(())
    }

    /// Re-derive the aggregate status from item progress inside the same
    /// transaction as the receipt that changed it
    pub(crate) async fn refresh_status_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<PurchaseOrderStatus> {
        let current = Self::lock_status(tx, company_id, order_id).await?;

        let progress = sqlx::query_as::<_, (Decimal, Decimal)>(
            "SELECT quantity_ordered, quantity_received FROM purchase_order_items WHERE purchase_order_id = $1",
        )
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await?
        .into_iter()
        .map(|(quantity_ordered, quantity_received)| PoItemProgress {
            quantity_ordered,
            quantity_received,
        })
        .collect::<Vec<_>>();

        let derived = derive_po_status(&progress, current);
        if derived != current {
            Self::guard(current, derived)?;
            sqlx::query("UPDATE purchase_orders SET status = $1, updated_at = now() WHERE id = $2")
                .bind(derived.as_str())
                .bind(order_id)
                .execute(&mut **tx)
                .await?;
        }

        Ok(derived)
    }

    pub(crate) async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<PurchaseOrderStatus> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM purchase_orders WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(order_id)
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        PurchaseOrderStatus::from_str(&status)
            .ok_or_else(|| AppError::Internal(format!("Unknown purchase order status: {}", status)))
    }

    fn guard(current: PurchaseOrderStatus, next: PurchaseOrderStatus) -> AppResult<()> {
        if current.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                document: "purchase order".to_string(),
                from: current.to_string(),
                to: next.to_string(),
            })
        }
    }
}
