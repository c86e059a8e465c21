//! Goods issue (GI) service
//!
//! Draft, submit, approve and reject. The actual issue posts stock OUT and
//! prices the items, so it lives in the workflow service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::document_number;
use crate::services::store_request::ApprovalInput;
use shared::models::{DocumentType, GoodsIssueStatus};
use shared::validation::{validate_person_name, validate_quantity};

/// Goods issue service
#[derive(Clone)]
pub struct GoodsIssueService {
    db: PgPool,
}

/// Goods issue header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GoodsIssue {
    pub id: Uuid,
    pub company_id: Uuid,
    pub document_number: String,
    pub store_request_id: Option<Uuid>,
    pub division: Option<String>,
    pub status: String,
    pub requested_by: String,
    pub approved_by: Option<String>,
    pub issued_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Goods issue line item. Prices are derived at issue time.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GoodsIssueItem {
    pub id: Uuid,
    pub goods_issue_id: Uuid,
    pub material_id: Uuid,
    pub quantity_issued: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Goods issue with its items
#[derive(Debug, Clone, Serialize)]
pub struct GoodsIssueWithItems {
    #[serde(flatten)]
    pub issue: GoodsIssue,
    pub items: Vec<GoodsIssueItem>,
}

/// Input for creating a goods issue
#[derive(Debug, Deserialize)]
pub struct CreateGoodsIssueInput {
    pub store_request_id: Option<Uuid>,
    pub division: Option<String>,
    pub requested_by: String,
    pub notes: Option<String>,
    pub items: Vec<GoodsIssueItemInput>,
}

/// Line item input. No price field; pricing is not user-entered.
#[derive(Debug, Deserialize)]
pub struct GoodsIssueItemInput {
    pub material_id: Uuid,
    pub quantity_issued: Decimal,
}

impl GoodsIssueService {
    /// Create a new GoodsIssueService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a goods issue in DRAFT
    pub async fn create(
        &self,
        company_id: Uuid,
        input: CreateGoodsIssueInput,
    ) -> AppResult<GoodsIssueWithItems> {
        let mut tx = self.db.begin().await?;
        let issue =
            Self::create_in_tx(&mut tx, company_id, input, GoodsIssueStatus::Draft, None).await?;
        tx.commit().await?;
        Ok(issue)
    }

    /// Draft an issue inside a caller-owned transaction. The workflow uses
    /// this to spawn a pre-approved issue from an approved store request.
    pub(crate) async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        input: CreateGoodsIssueInput,
        status: GoodsIssueStatus,
        approved_by: Option<&str>,
    ) -> AppResult<GoodsIssueWithItems> {
        validate_person_name(&input.requested_by).map_err(|msg| {
            AppError::validation("requested_by", msg, "Nama pemohon wajib diisi")
        })?;
        if input.items.is_empty() {
            return Err(AppError::validation(
                "items",
                "At least one item is required",
                "Minimal satu barang harus dikeluarkan",
            ));
        }
        for item in &input.items {
            validate_quantity(item.quantity_issued).map_err(|msg| {
                AppError::validation("quantity_issued", msg, "Jumlah dikeluarkan harus positif")
            })?;
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
            document_number::next_number(tx, company_id, DocumentType::GoodsIssue).await?;

        let issue = sqlx::query_as::<_, GoodsIssue>(
            r#"
            INSERT INTO goods_issues (
                company_id, document_number, store_request_id, division, status,
                requested_by, approved_by, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, company_id, document_number, store_request_id, division, status,
                      requested_by, approved_by, issued_by, notes, created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(&number)
        .bind(input.store_request_id)
        .bind(&input.division)
        .bind(status.as_str())
        .bind(input.requested_by.trim())
        .bind(approved_by)
        .bind(&input.notes)
        .fetch_one(&mut **tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, GoodsIssueItem>(
                r#"
                INSERT INTO goods_issue_items (goods_issue_id, material_id, quantity_issued)
                VALUES ($1, $2, $3)
                RETURNING id, goods_issue_id, material_id, quantity_issued, unit_price, total_price
                "#,
            )
            .bind(issue.id)
            .bind(item.material_id)
            .bind(item.quantity_issued)
            .fetch_one(&mut **tx)
            .await?;
            items.push(row);
        }

        Ok(GoodsIssueWithItems { issue, items })
    }

    /// Submit a draft issue for approval
    pub async fn submit(&self, company_id: Uuid, issue_id: Uuid) -> AppResult<GoodsIssue> {
        self.transition(company_id, issue_id, GoodsIssueStatus::Pending, None)
            .await
    }

    /// Approve a pending issue. Stock is only re-checked at issue time.
    pub async fn approve(
        &self,
        company_id: Uuid,
        issue_id: Uuid,
        input: ApprovalInput,
    ) -> AppResult<GoodsIssue> {
        validate_person_name(&input.approver).map_err(|msg| {
            AppError::validation("approver", msg, "Nama penyetuju wajib diisi")
        })?;
        self.transition(
            company_id,
            issue_id,
            GoodsIssueStatus::Approved,
            Some(input.approver.trim()),
        )
        .await
    }

    /// Reject a pending issue
    pub async fn reject(
        &self,
        company_id: Uuid,
        issue_id: Uuid,
        input: ApprovalInput,
    ) -> AppResult<GoodsIssue> {
        validate_person_name(&input.approver).map_err(|msg| {
            AppError::validation("approver", msg, "Nama penyetuju wajib diisi")
        })?;
        self.transition(
            company_id,
            issue_id,
            GoodsIssueStatus::Rejected,
            Some(input.approver.trim()),
        )
        .await
    }

    /// Delete an issue. Only DRAFT documents may be deleted.
    pub async fn delete(&self, company_id: Uuid, issue_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, issue_id).await?;
        if !current.is_deletable() {
            return Err(AppError::validation(
                "status",
                "Only draft goods issues can be deleted",
                "Hanya pengeluaran barang berstatus draft yang dapat dihapus",
            ));
        }

        sqlx::query("DELETE FROM goods_issues WHERE id = $1")
            .bind(issue_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    /// Get a goods issue with its items
    pub async fn get(&self, company_id: Uuid, issue_id: Uuid) -> AppResult<GoodsIssueWithItems> {
        let issue = sqlx::query_as::<_, GoodsIssue>(
            r#"
            SELECT id, company_id, document_number, store_request_id, division, status,
                   requested_by, approved_by, issued_by, notes, created_at, updated_at
            FROM goods_issues
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(issue_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Goods issue".to_string()))?;

        let items = sqlx::query_as::<_, GoodsIssueItem>(
            r#"
            SELECT id, goods_issue_id, material_id, quantity_issued, unit_price, total_price
            FROM goods_issue_items
            WHERE goods_issue_id = $1
            "#,
        )
        .bind(issue_id)
        .fetch_all(&self.db)
        .await?;

        Ok(GoodsIssueWithItems { issue, items })
    }

    /// List all goods issues for a company, newest first
    pub async fn list(&self, company_id: Uuid) -> AppResult<Vec<GoodsIssue>> {
        let issues = sqlx::query_as::<_, GoodsIssue>(
            r#"
            SELECT id, company_id, document_number, store_request_id, division, status,
                   requested_by, approved_by, issued_by, notes, created_at, updated_at
            FROM goods_issues
            WHERE company_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(issues)
    }

    pub(crate) async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        issue_id: Uuid,
    ) -> AppResult<GoodsIssueStatus> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM goods_issues WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(issue_id)
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Goods issue".to_string()))?;

        GoodsIssueStatus::from_str(&status)
            .ok_or_else(|| AppError::Internal(format!("Unknown goods issue status: {}", status)))
    }

    pub(crate) async fn load_header_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        issue_id: Uuid,
    ) -> AppResult<GoodsIssue> {
        sqlx::query_as::<_, GoodsIssue>(
            r#"
            SELECT id, company_id, document_number, store_request_id, division, status,
                   requested_by, approved_by, issued_by, notes, created_at, updated_at
            FROM goods_issues
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(issue_id)
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Goods issue".to_string()))
    }

    pub(crate) async fn load_items_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        issue_id: Uuid,
    ) -> AppResult<Vec<GoodsIssueItem>> {
        let items = sqlx::query_as::<_, GoodsIssueItem>(
            r#"
            SELECT id, goods_issue_id, material_id, quantity_issued, unit_price, total_price
            FROM goods_issue_items
            WHERE goods_issue_id = $1
            "#,
        )
        .bind(issue_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(items)
    }

    /// Write the derived price onto an item at issue time
    pub(crate) async fn price_item_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        unit_price: Decimal,
        total_price: Decimal,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE goods_issue_items SET unit_price = $1, total_price = $2 WHERE id = $3",
        )
        .bind(unit_price)
        .bind(total_price)
        .bind(item_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub(crate) async fn mark_completed_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        issue_id: Uuid,
        issued_by: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE goods_issues SET status = $1, issued_by = $2, updated_at = now() WHERE id = $3",
        )
        .bind(GoodsIssueStatus::Completed.as_str())
        .bind(issued_by)
        .bind(issue_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn transition(
        &self,
        company_id: Uuid,
        issue_id: Uuid,
        next: GoodsIssueStatus,
        actor: Option<&str>,
    ) -> AppResult<GoodsIssue> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock_status(&mut tx, company_id, issue_id).await?;
        if !current.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                document: "goods issue".to_string(),
                from: current.to_string(),
                to: next.to_string(),
            });
        }

        let issue = sqlx::query_as::<_, GoodsIssue>(
            r#"
            UPDATE goods_issues
            SET status = $1, approved_by = COALESCE($2, approved_by), updated_at = now()
            WHERE id = $3
            RETURNING id, company_id, document_number, store_request_id, division, status,
                      requested_by, approved_by, issued_by, notes, created_at, updated_at
            "#,
        )
        .bind(next.as_str())
        .bind(actor)
        .bind(issue_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(issue)
    }
}
