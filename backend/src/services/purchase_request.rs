//! Purchase request (PR) service
//!
//! Procurement demand, either bought directly from a vendor or routed
//! through a purchase order. Direct purchases carry the vendor on the
//! request itself; PO-track requests get their vendor on the order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::document_number;
use crate::services::store_request::ApprovalInput;
use shared::models::{DocumentType, PurchaseRequestStatus, PurchaseType, StoreRequestStatus};
use shared::validation::{validate_person_name, validate_quantity};

/// Purchase request service
#[derive(Clone)]
pub struct PurchaseRequestService {
    db: PgPool,
}

/// Purchase request header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseRequest {
    pub id: Uuid,
    pub company_id: Uuid,
    pub document_number: String,
    pub purchase_type: String,
    pub store_request_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub vendor_name: Option<String>,
    pub status: String,
    pub requested_by: String,
    pub approved_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Purchase request line item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseRequestItem {
    pub id: Uuid,
    pub purchase_request_id: Uuid,
    pub material_id: Uuid,
    pub quantity_requested: Decimal,
    pub unit_price: Option<Decimal>,
    pub notes: Option<String>,
}

/// Purchase request with its items
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseRequestWithItems {
    #[serde(flatten)]
    pub request: PurchaseRequest,
    pub items: Vec<PurchaseRequestItem>,
}

/// Input for creating a purchase request
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequestInput {
    pub purchase_type: PurchaseType,
    pub store_request_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub vendor_name: Option<String>,
    pub requested_by: String,
    pub notes: Option<String>,
    pub items: Vec<PurchaseRequestItemInput>,
}

/// Line item input
#[derive(Debug, Deserialize)]
pub struct PurchaseRequestItemInput {
    pub material_id: Uuid,
    pub quantity_requested: Decimal,
    pub unit_price: Option<Decimal>,
    pub notes: Option<String>,
}

impl PurchaseRequestService {
    /// Create a new PurchaseRequestService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a purchase request in DRAFT.
    ///
    /// Direct purchases require the vendor fields; PO-track requests leave
    /// them empty. An originating store request, when given, must be on the
    /// purchase-request track.
    pub async fn create(
        &self,
        company_id: Uuid,
        input: CreatePurchaseRequestInput,
    ) -> AppResult<PurchaseRequestWithItems> {
        let mut tx = self.db.begin().await?;
        let request = Self::create_in_tx(&mut tx, company_id, input).await?;
        tx.commit().await?;

        Ok(request)
    }

    /// Draft a request inside a caller-owned transaction. The workflow
    /// spawns shortfall requests under the store request's row lock.
    pub(crate) async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        input: CreatePurchaseRequestInput,
    ) -> AppResult<PurchaseRequestWithItems> {
        validate_person_name(&input.requested_by).map_err(|msg| {
            AppError::validation("requested_by", msg, "Nama pemohon wajib diisi")
        })?;
        if input.items.is_empty() {
            return Err(AppError::validation(
                "items",
                "At least one item is required",
                "Minimal satu barang harus diminta",
            ));
        }
        for item in &input.items {
            validate_quantity(item.quantity_requested).map_err(|msg| {
                AppError::validation("quantity_requested", msg, "Jumlah permintaan harus positif")
            })?;
        }
        match input.purchase_type {
            PurchaseType::DirectPurchase => {
                if input.vendor_id.is_none()
                    || input.vendor_name.as_deref().unwrap_or("").trim().is_empty()
                {
                    return Err(AppError::validation(
                        "vendor_name",
                        "Vendor is required for direct purchases",
                        "Vendor wajib diisi untuk pembelian langsung",
                    ));
                }
            }
            PurchaseType::PoSubmission => {}
        }

        if let Some(sr_id) = input.store_request_id {
            let status = sqlx::query_scalar::<_, String>(
                "SELECT status FROM store_requests WHERE id = $1 AND company_id = $2",
            )
            .bind(sr_id)
            .bind(company_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Store request".to_string()))?;

            let status = StoreRequestStatus::from_str(&status).ok_or_else(|| {
                AppError::Internal(format!("Unknown store request status: {}", status))
            })?;
            if !matches!(
                status,
                StoreRequestStatus::Approved | StoreRequestStatus::NeedPurchaseRequest
            ) {
                return Err(AppError::validation(
                    "store_request_id",
                    "Store request is not approved",
                    "Permintaan gudang belum disetujui",
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
            document_number::next_number(tx, company_id, DocumentType::PurchaseRequest).await?;

        let request = sqlx::query_as::<_, PurchaseRequest>(
            r#"
            INSERT INTO purchase_requests (
                company_id, document_number, purchase_type, store_request_id,
                vendor_id, vendor_name, status, requested_by, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, company_id, document_number, purchase_type, store_request_id,
                      vendor_id, vendor_name, status, requested_by, approved_by, notes,
                      created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(&number)
        .bind(input.purchase_type.as_str())
        .bind(input.store_request_id)
        .bind(input.vendor_id)
        .bind(input.vendor_name.as_deref().map(str::trim))
        .bind(PurchaseRequestStatus::Draft.as_str())
        .bind(input.requested_by.trim())
        .bind(&input.notes)
        .fetch_one(&mut **tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, PurchaseRequestItem>(
                r#"
                INSERT INTO purchase_request_items (
                    purchase_request_id, material_id, quantity_requested, unit_price, notes
                )
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, purchase_request_id, material_id, quantity_requested, unit_price, notes
                "#,
            )
            .bind(request.id)
            .bind(item.material_id)
            .bind(item.quantity_requested)
            .bind(item.unit_price)
            .bind(&item.notes)
            .fetch_one(&mut **tx)
            .await?;
            items.push(row);
        }

        Ok(PurchaseRequestWithItems { request, items })
    }

    /// Submit a draft for approval
    pub async fn submit(&self, company_id: Uuid, request_id: Uuid) -> AppResult<PurchaseRequest> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, request_id).await?;
        Self::guard(current, PurchaseRequestStatus::Pending)?;

        let request =
            Self::write_status(&mut tx, request_id, PurchaseRequestStatus::Pending, None).await?;
        tx.commit().await?;

        Ok(request)
    }

    /// Approve a pending request
    pub async fn approve(
        &self,
        company_id: Uuid,
        request_id: Uuid,
        input: ApprovalInput,
    ) -> AppResult<PurchaseRequest> {
        validate_person_name(&input.approver).map_err(|msg| {
            AppError::validation("approver", msg, "Nama penyetuju wajib diisi")
        })?;

        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, request_id).await?;
        Self::guard(current, PurchaseRequestStatus::Approved)?;

        let request = Self::write_status(
            &mut tx,
            request_id,
            PurchaseRequestStatus::Approved,
            Some(input.approver.trim()),
        )
        .await?;
        tx.commit().await?;

        Ok(request)
    }

    /// Reject a pending request. The record is retained, not deletable.
    pub async fn reject(
        &self,
        company_id: Uuid,
        request_id: Uuid,
        input: ApprovalInput,
    ) -> AppResult<PurchaseRequest> {
        validate_person_name(&input.approver).map_err(|msg| {
            AppError::validation("approver", msg, "Nama penyetuju wajib diisi")
        })?;

        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, request_id).await?;
        Self::guard(current, PurchaseRequestStatus::Rejected)?;

        let request = Self::write_status(
            &mut tx,
            request_id,
            PurchaseRequestStatus::Rejected,
            Some(input.approver.trim()),
        )
        .await?;
        tx.commit().await?;

        Ok(request)
    }

    /// Delete a request. Only DRAFT documents may be deleted.
    pub async fn delete(&self, company_id: Uuid, request_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, request_id).await?;
        if !current.is_deletable() {
            return Err(AppError::validation(
                "status",
                "Only draft purchase requests can be deleted",
                "Hanya permintaan pembelian berstatus draft yang dapat dihapus",
            ));
        }

        sqlx::query("DELETE FROM purchase_requests WHERE id = $1")
            .bind(request_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    /// Get a purchase request with its items
    pub async fn get(
        &self,
        company_id: Uuid,
        request_id: Uuid,
    ) -> AppResult<PurchaseRequestWithItems> {
        let request = sqlx::query_as::<_, PurchaseRequest>(
            r#"
            SELECT id, company_id, document_number, purchase_type, store_request_id,
                   vendor_id, vendor_name, status, requested_by, approved_by, notes,
                   created_at, updated_at
            FROM purchase_requests
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(request_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase request".to_string()))?;

        let items = sqlx::query_as::<_, PurchaseRequestItem>(
            r#"
            SELECT id, purchase_request_id, material_id, quantity_requested, unit_price, notes
            FROM purchase_request_items
            WHERE purchase_request_id = $1
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PurchaseRequestWithItems { request, items })
    }

    /// List all purchase requests for a company, newest first
    pub async fn list(&self, company_id: Uuid) -> AppResult<Vec<PurchaseRequest>> {
        let requests = sqlx::query_as::<_, PurchaseRequest>(
            r#"
            SELECT id, company_id, document_number, purchase_type, store_request_id,
                   vendor_id, vendor_name, status, requested_by, approved_by, notes,
                   created_at, updated_at
            FROM purchase_requests
            WHERE company_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(requests)
    }

    /// Mark a request PO_CREATED inside the transaction creating the order
    pub(crate) async fn mark_po_created_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        request_id: Uuid,
    ) -> AppResult<()> {
        let current = Self::lock_status(tx, company_id, request_id).await?;
        Self::guard(current, PurchaseRequestStatus::PoCreated)?;
        Self::write_status(tx, request_id, PurchaseRequestStatus::PoCreated, None).await?;
        Ok(())
    }

    /// Mark a direct-purchase request COMPLETED inside the receipt
    /// transaction
    pub(crate) async fn complete_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        request_id: Uuid,
    ) -> AppResult<()> {
        let current = Self::lock_status(tx, company_id, request_id).await?;
        Self::guard(current, PurchaseRequestStatus::Completed)?;
        Self::write_status(tx, request_id, PurchaseRequestStatus::Completed, None).await?;
        Ok(())
    }

    pub(crate) async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        request_id: Uuid,
    ) -> AppResult<PurchaseRequestStatus> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM purchase_requests WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(request_id)
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase request".to_string()))?;

        PurchaseRequestStatus::from_str(&status).ok_or_else(|| {
            AppError::Internal(format!("Unknown purchase request status: {}", status))
        })
    }

    fn guard(current: PurchaseRequestStatus, next: PurchaseRequestStatus) -> AppResult<()> {
        if current.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                document: "purchase request".to_string(),
                from: current.to_string(),
                to: next.to_string(),
            })
        }
    }

    async fn write_status(
        tx: &mut Transaction<'_, Postgres>,
        request_id: Uuid,
        status: PurchaseRequestStatus,
        approved_by: Option<&str>,
    ) -> AppResult<PurchaseRequest> {
        let request = sqlx::query_as::<_, PurchaseRequest>(
            r#"
            UPDATE purchase_requests
            SET status = $1, approved_by = COALESCE($2, approved_by), updated_at = now()
            WHERE id = $3
            RETURNING id, company_id, document_number, purchase_type, store_request_id,
                      vendor_id, vendor_name, status, requested_by, approved_by, notes,
                      created_at, updated_at
            "#,
        )
        .bind(status.as_str())
        .bind(approved_by)
        .bind(request_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(request)
    }
}
