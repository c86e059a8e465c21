//! Purchase request (PR) and purchase order (PO) state machines
//!
//! The PO aggregate status is never stored authoritatively; it is re-derived
//! from item receipt progress inside every goods-receipt transaction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How an approved purchase request is fulfilled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseType {
    /// Bought directly from a vendor; receipt completes the PR itself
    DirectPurchase,
    /// Routed through a purchase order
    PoSubmission,
}

impl PurchaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseType::DirectPurchase => "direct_purchase",
            PurchaseType::PoSubmission => "po_submission",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "direct_purchase" => Some(PurchaseType::DirectPurchase),
            "po_submission" => Some(PurchaseType::PoSubmission),
            _ => None,
        }
    }
}

/// Purchase request lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseRequestStatus {
    Draft,
    Pending,
    Approved,
    PoCreated,
    Completed,
    Rejected,
}

impl PurchaseRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseRequestStatus::Draft => "draft",
            PurchaseRequestStatus::Pending => "pending",
            PurchaseRequestStatus::Approved => "approved",
            PurchaseRequestStatus::PoCreated => "po_created",
            PurchaseRequestStatus::Completed => "completed",
            PurchaseRequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PurchaseRequestStatus::Draft),
            "pending" => Some(PurchaseRequestStatus::Pending),
            "approved" => Some(PurchaseRequestStatus::Approved),
            "po_created" => Some(PurchaseRequestStatus::PoCreated),
            "completed" => Some(PurchaseRequestStatus::Completed),
            "rejected" => Some(PurchaseRequestStatus::Rejected),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: PurchaseRequestStatus) -> bool {
        use PurchaseRequestStatus::*;
        matches!(
            (self, next),
            (Draft, Pending)
                | (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, PoCreated)
                | (Approved, Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PurchaseRequestStatus::PoCreated
                | PurchaseRequestStatus::Completed
                | PurchaseRequestStatus::Rejected
        )
    }

    pub fn is_deletable(&self) -> bool {
        matches!(self, PurchaseRequestStatus::Draft)
    }
}

impl std::fmt::Display for PurchaseRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purchase order lifecycle states
///
/// Approval (`approved_by`) is recorded while the order is still `Draft`;
/// only `issue` moves the state forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    Issued,
    PartialReceived,
    Completed,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Draft => "draft",
            PurchaseOrderStatus::Issued => "issued",
            PurchaseOrderStatus::PartialReceived => "partial_received",
            PurchaseOrderStatus::Completed => "completed",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PurchaseOrderStatus::Draft),
            "issued" => Some(PurchaseOrderStatus::Issued),
            "partial_received" => Some(PurchaseOrderStatus::PartialReceived),
            "completed" => Some(PurchaseOrderStatus::Completed),
            "cancelled" => Some(PurchaseOrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: PurchaseOrderStatus) -> bool {
        use PurchaseOrderStatus::*;
        match (self, next) {
            (Draft, Issued) => true,
            (Issued, PartialReceived) | (Issued, Completed) => true,
            (PartialReceived, Completed) => true,
            // Any non-terminal order may be cancelled
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchaseOrderStatus::Completed | PurchaseOrderStatus::Cancelled)
    }

    pub fn is_deletable(&self) -> bool {
        matches!(self, PurchaseOrderStatus::Draft)
    }

    /// Orders accept receipts once issued and until fully received
    pub fn accepts_receipts(&self) -> bool {
        matches!(self, PurchaseOrderStatus::Issued | PurchaseOrderStatus::PartialReceived)
    }
}

impl std::fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receipt progress of one purchase order item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoItemProgress {
    pub quantity_ordered: Decimal,
    pub quantity_received: Decimal,
}

/// Derive the aggregate order status from item receipt progress.
///
/// Completed when every item's cumulative received covers the ordered
/// quantity, partial when anything has arrived, otherwise unchanged.
pub fn derive_po_status(
    items: &[PoItemProgress],
    current: PurchaseOrderStatus,
) -> PurchaseOrderStatus {
    if !items.is_empty()
        && items
            .iter()
            .all(|i| i.quantity_received >= i.quantity_ordered)
    {
        return PurchaseOrderStatus::Completed;
    }
    if items.iter().any(|i| i.quantity_received > Decimal::ZERO) {
        return PurchaseOrderStatus::PartialReceived;
    }
    current
}
