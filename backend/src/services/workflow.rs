//! Workflow orchestrator
//!
//! Cross-document sequences that must not be observable half-done: completing
//! a goods receipt, issuing a goods issue, and spawning follow-up documents
//! from a store request. Each sequence runs inside a single transaction so
//! the stock ledger, the document statuses, and the linked documents move
//! together or not at all.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::goods_issue::{
    CreateGoodsIssueInput, GoodsIssue, GoodsIssueItem, GoodsIssueItemInput, GoodsIssueService,
    GoodsIssueWithItems,
};
use crate::services::goods_receipt::{
    CreateGoodsReceiptInput, GoodsReceipt, GoodsReceiptItem, GoodsReceiptService,
    GoodsReceiptWithItems,
};
use crate::services::purchase_order::PurchaseOrderService;
use crate::services::purchase_request::{
    CreatePurchaseRequestInput, PurchaseRequestItemInput, PurchaseRequestService,
    PurchaseRequestWithItems,
};
use crate::services::stock_ledger::StockLedgerService;
use crate::services::store_request::{StoreRequestItem, StoreRequestService};
use shared::models::{
    GoodsIssueStatus, GoodsReceiptStatus, PurchaseRequestStatus, PurchaseType, StockDirection,
    StoreRequestStatus, TransactionType,
};
use shared::validation::validate_person_name;

/// Orchestrates multi-document transactions
#[derive(Clone)]
pub struct WorkflowService {
    db: PgPool,
    goods_receipts: GoodsReceiptService,
    goods_issues: GoodsIssueService,
}

/// Input for operations performed by a named issuer
#[derive(Debug, Deserialize)]
pub struct IssueInput {
    pub issuer: String,
}

/// Input for spawning a purchase request from a store request's shortfalls
#[derive(Debug, Deserialize)]
pub struct SpawnPurchaseRequestInput {
    pub purchase_type: PurchaseType,
    pub vendor_id: Option<Uuid>,
    pub vendor_name: Option<String>,
    pub requested_by: String,
    pub notes: Option<String>,
}

impl WorkflowService {
    /// Create a new WorkflowService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            goods_receipts: GoodsReceiptService::new(db.clone()),
            goods_issues: GoodsIssueService::new(db.clone()),
            db,
        }
    }

    /// Complete a draft goods receipt.
    ///
    /// Posts IN per item, bumps the linked purchase order items, re-derives
    /// the order status, marks the receipt completed and closes a
    /// direct-purchase source request, all in one transaction.
    pub async fn complete_goods_receipt(
        &self,
        company_id: Uuid,
        receipt_id: Uuid,
    ) -> AppResult<GoodsReceiptWithItems> {
        let mut tx = self.db.begin().await?;

        let current = GoodsReceiptService::lock_status(&mut tx, company_id, receipt_id).await?;
        if !current.can_transition_to(GoodsReceiptStatus::Completed) {
            return Err(AppError::InvalidTransition {
                document: "goods receipt".to_string(),
                from: current.to_string(),
                to: GoodsReceiptStatus::Completed.to_string(),
            });
        }

        let receipt = GoodsReceiptService::load_header_in_tx(&mut tx, company_id, receipt_id).await?;
        let items = GoodsReceiptService::load_items_in_tx(&mut tx, receipt_id).await?;

        Self::complete_receipt_in_tx(&mut tx, company_id, &receipt, &items).await?;
        tx.commit().await?;

        self.goods_receipts.get(company_id, receipt_id).await
    }

    /// Draft and complete a goods receipt as one unit
    pub async fn create_and_complete_goods_receipt(
        &self,
        company_id: Uuid,
        input: CreateGoodsReceiptInput,
    ) -> AppResult<GoodsReceiptWithItems> {
        let mut tx = self.db.begin().await?;

        let drafted = GoodsReceiptService::create_in_tx(&mut tx, company_id, input).await?;
        Self::complete_receipt_in_tx(&mut tx, company_id, &drafted.receipt, &drafted.items).await?;
        tx.commit().await?;

        self.goods_receipts.get(company_id, drafted.receipt.id).await
    }

    /// Issue an approved goods issue.
    ///
    /// Stock is re-checked at issue time: each OUT posting locks the material
    /// row and fails the whole transaction on insufficiency, however long ago
    /// the approval happened. Item prices are derived here, not earlier.
    pub async fn issue_goods_issue(
        &self,
        company_id: Uuid,
        issue_id: Uuid,
        input: IssueInput,
    ) -> AppResult<GoodsIssueWithItems> {
        validate_person_name(&input.issuer).map_err(|msg| {
            AppError::validation("issuer", msg, "Nama penerbit wajib diisi")
        })?;

        let mut tx = self.db.begin().await?;

        let current = GoodsIssueService::lock_status(&mut tx, company_id, issue_id).await?;
        if !current.can_transition_to(GoodsIssueStatus::Completed) {
            return Err(AppError::InvalidTransition {
                document: "goods issue".to_string(),
                from: current.to_string(),
                to: GoodsIssueStatus::Completed.to_string(),
            });
        }

        let issue = GoodsIssueService::load_header_in_tx(&mut tx, company_id, issue_id).await?;
        let items = GoodsIssueService::load_items_in_tx(&mut tx, issue_id).await?;

        Self::issue_in_tx(&mut tx, company_id, &issue, &items, input.issuer.trim()).await?;
        tx.commit().await?;

        self.goods_issues.get(company_id, issue_id).await
    }

    /// Spawn a pre-approved goods issue from an approved store request and
    /// issue it immediately, completing the store request, all in one
    /// transaction.
    pub async fn create_goods_issue_from_store_request(
        &self,
        company_id: Uuid,
        store_request_id: Uuid,
        input: IssueInput,
    ) -> AppResult<GoodsIssueWithItems> {
        validate_person_name(&input.issuer).map_err(|msg| {
            AppError::validation("issuer", msg, "Nama penerbit wajib diisi")
        })?;

        let mut tx = self.db.begin().await?;

        let current =
            StoreRequestService::lock_status(&mut tx, company_id, store_request_id).await?;
        if current != StoreRequestStatus::Approved {
            return Err(AppError::InvalidTransition {
                document: "store request".to_string(),
                from: current.to_string(),
                to: StoreRequestStatus::Completed.to_string(),
            });
        }

        let source = sqlx::query_as::<_, (String, String, Option<String>)>(
            "SELECT division, requested_by, approved_by FROM store_requests WHERE id = $1",
        )
        .bind(store_request_id)
        .fetch_one(&mut *tx)
        .await?;
        let source_items = Self::load_store_request_items(&mut tx, store_request_id).await?;

        let issue_input = CreateGoodsIssueInput {
            store_request_id: Some(store_request_id),
            division: Some(source.0),
            requested_by: source.1,
            notes: None,
            items: source_items
                .iter()
                .map(|item| GoodsIssueItemInput {
                    material_id: item.material_id,
                    quantity_issued: item.quantity_requested,
                })
                .collect(),
        };

        let drafted = GoodsIssueService::create_in_tx(
            &mut tx,
            company_id,
            issue_input,
            GoodsIssueStatus::Approved,
            source.2.as_deref(),
        )
        .await?;

        Self::issue_in_tx(
            &mut tx,
            company_id,
            &drafted.issue,
            &drafted.items,
            input.issuer.trim(),
        )
        .await?;
        tx.commit().await?;

        self.goods_issues.get(company_id, drafted.issue.id).await
    }

    /// Spawn a purchase request from a store request routed to
    /// NEED_PURCHASE_REQUEST, copying its shortfall items.
    ///
    /// The store request's row lock is held until the purchase request
    /// exists, so two concurrent spawns serialize; the loser sees the
    /// request already covered and is refused.
    pub async fn create_purchase_request_from_store_request(
        &self,
        company_id: Uuid,
        store_request_id: Uuid,
        input: SpawnPurchaseRequestInput,
    ) -> AppResult<PurchaseRequestWithItems> {
        let mut tx = self.db.begin().await?;
        let current =
            StoreRequestService::lock_status(&mut tx, company_id, store_request_id).await?;
        if current != StoreRequestStatus::NeedPurchaseRequest {
            return Err(AppError::validation(
                "store_request_id",
                "Store request has no outstanding shortfall to purchase",
                "Permintaan gudang tidak memiliki kekurangan yang perlu dibeli",
            ));
        }

        let covered = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM purchase_requests WHERE store_request_id = $1 AND status <> $2)",
        )
        .bind(store_request_id)
        .bind(PurchaseRequestStatus::Rejected.as_str())
        .fetch_one(&mut *tx)
        .await?;
        if covered {
            return Err(AppError::validation(
                "store_request_id",
                "A purchase request already covers this store request",
                "Permintaan pembelian untuk permintaan gudang ini sudah dibuat",
            ));
        }

        let items = Self::load_store_request_items(&mut tx, store_request_id).await?;
        let shortfall: Vec<PurchaseRequestItemInput> = items
            .into_iter()
            .filter(|item| item.quantity_short > Decimal::ZERO)
            .map(|item| PurchaseRequestItemInput {
                material_id: item.material_id,
                quantity_requested: item.quantity_short,
                unit_price: None,
                notes: item.notes,
            })
            .collect();

        if shortfall.is_empty() {
            return Err(AppError::validation(
                "items",
                "Store request has no shortfall items",
                "Permintaan gudang tidak memiliki barang yang kurang",
            ));
        }

        let request = PurchaseRequestService::create_in_tx(
            &mut tx,
            company_id,
            CreatePurchaseRequestInput {
                purchase_type: input.purchase_type,
                store_request_id: Some(store_request_id),
                vendor_id: input.vendor_id,
                vendor_name: input.vendor_name,
                requested_by: input.requested_by,
                notes: input.notes,
                items: shortfall,
            },
        )
        .await?;
        tx.commit().await?;

        Ok(request)
    }

    async fn complete_receipt_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        receipt: &GoodsReceipt,
        items: &[GoodsReceiptItem],
    ) -> AppResult<()> {
        for item in items {
            StockLedgerService::post_in_tx(
                tx,
                company_id,
                item.material_id,
                TransactionType::In,
                StockDirection::In,
                item.quantity_received,
                Some(item.unit_price),
                Some(&receipt.document_number),
                &receipt.received_by,
            )
            .await?;

            if let Some(po_item_id) = item.purchase_order_item_id {
                PurchaseOrderService::receive_item_in_tx(tx, po_item_id, item.quantity_received)
                    .await?;
            }
        }

        if let Some(po_id) = receipt.purchase_order_id {
            PurchaseOrderService::refresh_status_in_tx(tx, company_id, po_id).await?;
        }

        GoodsReceiptService::mark_completed_in_tx(tx, receipt.id).await?;

        if let Some(pr_id) = receipt.purchase_request_id {
            PurchaseRequestService::complete_in_tx(tx, company_id, pr_id).await?;
        }

        Ok(())
    }

    async fn issue_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        issue: &GoodsIssue,
        items: &[GoodsIssueItem],
        issuer: &str,
    ) -> AppResult<()> {
        for item in items {
            let unit_price = match StockLedgerService::trailing_unit_price_in_tx(
                tx,
                company_id,
                item.material_id,
            )
            .await?
            {
                Some(price) => price,
                None => {
                    sqlx::query_scalar::<_, Decimal>(
                        "SELECT unit_price FROM materials WHERE id = $1",
                    )
                    .bind(item.material_id)
                    .fetch_one(&mut **tx)
                    .await?
                }
            };
            let total_price = unit_price * item.quantity_issued;

            StockLedgerService::post_in_tx(
                tx,
                company_id,
                item.material_id,
                TransactionType::Out,
                StockDirection::Out,
                item.quantity_issued,
                Some(unit_price),
                Some(&issue.document_number),
                issuer,
            )
            .await?;

            GoodsIssueService::price_item_in_tx(tx, item.id, unit_price, total_price).await?;
        }

        GoodsIssueService::mark_completed_in_tx(tx, issue.id, issuer).await?;

        if let Some(sr_id) = issue.store_request_id {
            StoreRequestService::complete_in_tx(tx, company_id, sr_id).await?;
        }

        Ok(())
    }

    async fn load_store_request_items(
        tx: &mut Transaction<'_, Postgres>,
        store_request_id: Uuid,
    ) -> AppResult<Vec<StoreRequestItem>> {
        let items = sqlx::query_as::<_, StoreRequestItem>(
            r#"
            SELECT id, store_request_id, material_id, quantity_requested, quantity_short, notes
            FROM store_request_items
            WHERE store_request_id = $1
            "#,
        )
        .bind(store_request_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(items)
    }
}
