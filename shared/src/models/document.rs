//! Document identity: types and running numbers
//!
//! Every procurement document carries a number of the form
//! `{PREFIX}/{YYYYMM}/{NNNN}` allocated per company per month.

use serde::{Deserialize, Serialize};

/// The five document types tracked by the procurement engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    StoreRequest,
    PurchaseRequest,
    PurchaseOrder,
    GoodsReceipt,
    GoodsIssue,
}

impl DocumentType {
    /// Number prefix used in the document number
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentType::StoreRequest => "SR",
            DocumentType::PurchaseRequest => "PR",
            DocumentType::PurchaseOrder => "PO",
            DocumentType::GoodsReceipt => "GR",
            DocumentType::GoodsIssue => "GI",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "SR" => Some(DocumentType::StoreRequest),
            "PR" => Some(DocumentType::PurchaseRequest),
            "PO" => Some(DocumentType::PurchaseOrder),
            "GR" => Some(DocumentType::GoodsReceipt),
            "GI" => Some(DocumentType::GoodsIssue),
            _ => None,
        }
    }
}

/// Format a document number, e.g. `GI/202501/0001`
pub fn format_document_number(doc_type: DocumentType, year: i32, month: u32, sequence: i32) -> String {
    format!("{}/{:04}{:02}/{:04}", doc_type.prefix(), year, month, sequence)
}

/// The `YYYYMM` period key a counter row is scoped to
pub fn document_period(year: i32, month: u32) -> String {
    format!("{:04}{:02}", year, month)
}

/// Parse a document number back into its parts
pub fn parse_document_number(number: &str) -> Option<(DocumentType, i32, u32, i32)> {
    let mut parts = number.split('/');
    let doc_type = DocumentType::from_prefix(parts.next()?)?;
    let period = parts.next()?;
    let sequence = parts.next()?;
    if parts.next().is_some() || period.len() != 6 || sequence.len() != 4 {
        return None;
    }
    let year: i32 = period[..4].parse().ok()?;
    let month: u32 = period[4..].parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((doc_type, year, month, sequence.parse().ok()?))
}
