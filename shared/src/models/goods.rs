//! Goods receipt (GR) and goods issue (GI) state machines
//!
//! Completion of a receipt and issue of an issue are the only transitions
//! that move stock; both run inside a single database transaction with the
//! ledger postings they trigger.

use serde::{Deserialize, Serialize};

/// Goods receipt lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodsReceiptStatus {
    Draft,
    Completed,
}

impl GoodsReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoodsReceiptStatus::Draft => "draft",
            GoodsReceiptStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(GoodsReceiptStatus::Draft),
            "completed" => Some(GoodsReceiptStatus::Completed),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: GoodsReceiptStatus) -> bool {
        matches!(
            (self, next),
            (GoodsReceiptStatus::Draft, GoodsReceiptStatus::Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GoodsReceiptStatus::Completed)
    }

    pub fn is_deletable(&self) -> bool {
        matches!(self, GoodsReceiptStatus::Draft)
    }
}

impl std::fmt::Display for GoodsReceiptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Goods issue lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodsIssueStatus {
    Draft,
    Pending,
    Approved,
    Completed,
    Rejected,
}

impl GoodsIssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoodsIssueStatus::Draft => "draft",
            GoodsIssueStatus::Pending => "pending",
            GoodsIssueStatus::Approved => "approved",
            GoodsIssueStatus::Completed => "completed",
            GoodsIssueStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(GoodsIssueStatus::Draft),
            "pending" => Some(GoodsIssueStatus::Pending),
            "approved" => Some(GoodsIssueStatus::Approved),
            "completed" => Some(GoodsIssueStatus::Completed),
            "rejected" => Some(GoodsIssueStatus::Rejected),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: GoodsIssueStatus) -> bool {
        use GoodsIssueStatus::*;
        matches!(
            (self, next),
            (Draft, Pending) | (Pending, Approved) | (Pending, Rejected) | (Approved, Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GoodsIssueStatus::Completed | GoodsIssueStatus::Rejected)
    }

    pub fn is_deletable(&self) -> bool {
        matches!(self, GoodsIssueStatus::Draft)
    }
}

impl std::fmt::Display for GoodsIssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
