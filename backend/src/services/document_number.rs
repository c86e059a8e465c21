//! Document number allocation
//!
//! Numbers follow `{PREFIX}/{YYYYMM}/{NNNN}` per company per month. They
//! come from a dedicated counter table bumped with an atomic upsert, so two
//! concurrent creates in the same month cannot read the same last number.
//! Allocation always runs inside the transaction that creates the document;
//! a rolled-back create returns its number to nobody, leaving a gap, which
//! is acceptable.

use chrono::{Datelike, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppResult;
use shared::models::{document_period, format_document_number, DocumentType};

/// Allocate the next document number for a company within the caller's
/// transaction
pub async fn next_number(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    doc_type: DocumentType,
) -> AppResult<String> {
    let now = Utc::now();
    let (year, month) = (now.year(), now.month());

    let sequence = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO document_counters (company_id, prefix, period, last_number)
        VALUES ($1, $2, $3, 1)
        ON CONFLICT (company_id, prefix, period)
        DO UPDATE SET last_number = document_counters.last_number + 1
        RETURNING last_number
        "#,
    )
    .bind(company_id)
    .bind(doc_type.prefix())
    .bind(document_period(year, month))
    .fetch_one(&mut **tx)
    .await?;

    Ok(format_document_number(doc_type, year, month, sequence))
}
