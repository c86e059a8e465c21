//! Store request (SR) service
//!
//! Internal material demand from a division. Approval checks stock
//! sufficiency per item but never fails on it: shortfalls are recorded on
//! the items and route the request to the purchase-request track.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::document_number;
use shared::models::{DocumentType, StoreRequestStatus};
use shared::validation::{validate_person_name, validate_quantity};

/// Store request service
#[derive(Clone)]
pub struct StoreRequestService {
    db: PgPool,
}

/// Store request header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StoreRequest {
    pub id: Uuid,
    pub company_id: Uuid,
    pub document_number: String,
    pub division: String,
    pub requested_by: String,
    pub status: String,
    pub approved_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Store request line item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StoreRequestItem {
    pub id: Uuid,
    pub store_request_id: Uuid,
    pub material_id: Uuid,
    pub quantity_requested: Decimal,
    /// Shortfall against stock on hand, set at approval time
    pub quantity_short: Decimal,
    pub notes: Option<String>,
}

/// Store request with its items
#[derive(Debug, Clone, Serialize)]
pub struct StoreRequestWithItems {
    #[serde(flatten)]
    pub request: StoreRequest,
    pub items: Vec<StoreRequestItem>,
}

/// Input for creating a store request
#[derive(Debug, Deserialize)]
pub struct CreateStoreRequestInput {
    pub division: String,
    pub requested_by: String,
    pub notes: Option<String>,
    pub items: Vec<StoreRequestItemInput>,
}

/// Line item input
#[derive(Debug, Deserialize)]
pub struct StoreRequestItemInput {
    pub material_id: Uuid,
    pub quantity_requested: Decimal,
    pub notes: Option<String>,
}

/// Input for approval-gated transitions
#[derive(Debug, Deserialize)]
pub struct ApprovalInput {
    pub approver: String,
}

/// Outcome of an approval, including the per-item shortfalls that decided
/// the routing
#[derive(Debug, Clone, Serialize)]
pub struct StoreRequestApproval {
    #[serde(flatten)]
    pub request: StoreRequestWithItems,
    pub needs_purchase_request: bool,
}

impl StoreRequestService {
    /// Create a new StoreRequestService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a store request in DRAFT with a fresh document number
    pub async fn create(
        &self,
        company_id: Uuid,
        input: CreateStoreRequestInput,
    ) -> AppResult<StoreRequestWithItems> {
        validate_person_name(&input.requested_by).map_err(|msg| {
            AppError::validation("requested_by", msg, "Nama pemohon wajib diisi")
        })?;
        if input.division.trim().is_empty() {
            return Err(AppError::validation(
                "division",
                "Division is required",
                "Divisi wajib diisi",
            ));
        }
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

        let mut tx = self.db.begin().await?;

        for item in &input.items {
            Self::ensure_material(&mut tx, company_id, item.material_id).await?;
        }

        let number =
            document_number::next_number(&mut tx, company_id, DocumentType::StoreRequest).await?;

        let request = sqlx::query_as::<_, StoreRequest>(
            r#"
            INSERT INTO store_requests (company_id, document_number, division, requested_by, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, company_id, document_number, division, requested_by, status,
                      approved_by, notes, created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(&number)
        .bind(input.division.trim())
        .bind(input.requested_by.trim())
        .bind(StoreRequestStatus::Draft.as_str())
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, StoreRequestItem>(
                r#"
                INSERT INTO store_request_items (store_request_id, material_id, quantity_requested, notes)
                VALUES ($1, $2, $3, $4)
                RETURNING id, store_request_id, material_id, quantity_requested, quantity_short, notes
                "#,
            )
            .bind(request.id)
            .bind(item.material_id)
            .bind(item.quantity_requested)
            .bind(&item.notes)
            .fetch_one(&mut *tx)
            .await?;
            items.push(row);
        }

        tx.commit().await?;

        Ok(StoreRequestWithItems { request, items })
    }

    /// Submit a draft for approval
    pub async fn submit(&self, company_id: Uuid, request_id: Uuid) -> AppResult<StoreRequest> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, request_id).await?;
        Self::guard(current, StoreRequestStatus::Pending)?;

        let request = Self::write_status(
            &mut tx,
            request_id,
            StoreRequestStatus::Pending,
            None,
        )
        .await?;
        tx.commit().await?;

        Ok(request)
    }

    /// Approve a pending request.
    ///
    /// Stock sufficiency is evaluated per item and recorded as shortfalls;
    /// any shortfall routes the request to NEED_PURCHASE_REQUEST instead
    /// of failing the approval.
    pub async fn approve(
        &self,
        company_id: Uuid,
        request_id: Uuid,
        input: ApprovalInput,
    ) -> AppResult<StoreRequestApproval> {
        validate_person_name(&input.approver).map_err(|msg| {
            AppError::validation("approver", msg, "Nama penyetuju wajib diisi")
        })?;

        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, request_id).await?;
        Self::guard(current, StoreRequestStatus::Approved)?;

        // Record per-item shortfalls against current stock
        let shortfalls = sqlx::query_as::<_, (Uuid, Decimal)>(
            r#"
            SELECT sri.id, GREATEST(sri.quantity_requested - m.stock_on_hand, 0)
            FROM store_request_items sri
            JOIN materials m ON m.id = sri.material_id
            WHERE sri.store_request_id = $1
            "#,
        )
        .bind(request_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut needs_pr = false;
        for (item_id, short) in &shortfalls {
            if *short > Decimal::ZERO {
                needs_pr = true;
            }
            sqlx::query("UPDATE store_request_items SET quantity_short = $1 WHERE id = $2")
                .bind(short)
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        }

        // Routing is the composite PENDING -> APPROVED -> NEED_PURCHASE_REQUEST;
        // the second hop goes through the transition table like the first
        let final_status = if needs_pr {
            Self::guard(
                StoreRequestStatus::Approved,
                StoreRequestStatus::NeedPurchaseRequest,
            )?;
            StoreRequestStatus::NeedPurchaseRequest
        } else {
            StoreRequestStatus::Approved
        };
        let request =
            Self::write_status(&mut tx, request_id, final_status, Some(input.approver.trim()))
                .await?;

        let items = Self::load_items(&mut tx, request_id).await?;
        tx.commit().await?;

        Ok(StoreRequestApproval {
            request: StoreRequestWithItems { request, items },
            needs_purchase_request: needs_pr,
        })
    }

    /// Reject a pending request. The record is retained, not deletable.
    pub async fn reject(
        &self,
        company_id: Uuid,
        request_id: Uuid,
        input: ApprovalInput,
    ) -> AppResult<StoreRequest> {
        validate_person_name(&input.approver).map_err(|msg| {
            AppError::validation("approver", msg, "Nama penyetuju wajib diisi")
        })?;

        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, request_id).await?;
        Self::guard(current, StoreRequestStatus::Rejected)?;

        let request = Self::write_status(
            &mut tx,
            request_id,
            StoreRequestStatus::Rejected,
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
                "Only draft store requests can be deleted",
                "Hanya permintaan gudang berstatus draft yang dapat dihapus",
            ));
        }

        sqlx::query("DELETE FROM store_requests WHERE id = $1")
            .bind(request_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    /// Get a store request with its items
    pub async fn get(&self, company_id: Uuid, request_id: Uuid) -> AppResult<StoreRequestWithItems> {
        let request = sqlx::query_as::<_, StoreRequest>(
            r#"
            SELECT id, company_id, document_number, division, requested_by, status,
                   approved_by, notes, created_at, updated_at
            FROM store_requests
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(request_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Store request".to_string()))?;

        let items = sqlx::query_as::<_, StoreRequestItem>(
            r#"
            SELECT id, store_request_id, material_id, quantity_requested, quantity_short, notes
            FROM store_request_items
            WHERE store_request_id = $1
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.db)
        .await?;

        Ok(StoreRequestWithItems { request, items })
    }

    /// List all store requests for a company, newest first
    pub async fn list(&self, company_id: Uuid) -> AppResult<Vec<StoreRequest>> {
        let requests = sqlx::query_as::<_, StoreRequest>(
            r#"
            SELECT id, company_id, document_number, division, requested_by, status,
                   approved_by, notes, created_at, updated_at
            FROM store_requests
            WHERE company_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(requests)
    }

    /// Mark a store request COMPLETED inside an orchestrated transaction
    pub(crate) async fn complete_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        request_id: Uuid,
    ) -> AppResult<()> {
        let current = Self::lock_status(tx, company_id, request_id).await?;
        Self::guard(current, StoreRequestStatus::Completed)?;
        Self::write_status(tx, request_id, StoreRequestStatus::Completed, None).await?;
        Ok(())
    }

    pub(crate) async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        request_id: Uuid,
    ) -> AppResult<StoreRequestStatus> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM store_requests WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(request_id)
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Store request".to_string()))?;

        StoreRequestStatus::from_str(&status)
            .ok_or_else(|| AppError::Internal(format!("Unknown store request status: {}", status)))
    }

    fn guard(current: StoreRequestStatus, next: StoreRequestStatus) -> AppResult<()> {
        if current.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                document: "store request".to_string(),
                from: current.to_string(),
                to: next.to_string(),
            })
        }
    }

    async fn write_status(
        tx: &mut Transaction<'_, Postgres>,
        request_id: Uuid,
        status: StoreRequestStatus,
        approved_by: Option<&str>,
    ) -> AppResult<StoreRequest> {
        let request = sqlx::query_as::<_, StoreRequest>(
            r#"
            UPDATE store_requests
            SET status = $1, approved_by = COALESCE($2, approved_by), updated_at = now()
            WHERE id = $3
            RETURNING id, company_id, document_number, division, requested_by, status,
                      approved_by, notes, created_at, updated_at
            "#,
        )
        .bind(status.as_str())
        .bind(approved_by)
        .bind(request_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(request)
    }

    async fn load_items(
        tx: &mut Transaction<'_, Postgres>,
        request_id: Uuid,
    ) -> AppResult<Vec<StoreRequestItem>> {
        let items = sqlx::query_as::<_, StoreRequestItem>(
            r#"
            SELECT id, store_request_id, material_id, quantity_requested, quantity_short, notes
            FROM store_request_items
            WHERE store_request_id = $1
            "#,
        )
        .bind(request_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(items)
    }

    async fn ensure_material(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        material_id: Uuid,
    ) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM materials WHERE id = $1 AND company_id = $2)",
        )
        .bind(material_id)
        .bind(company_id)
        .fetch_one(&mut **tx)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Material".to_string()));
        }
        Ok(())
    }
}
