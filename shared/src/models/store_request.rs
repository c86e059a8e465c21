//! Store request (SR) state machine
//!
//! A store request is an internal demand for material. Approval never hard
//! fails on stock sufficiency; a shortfall routes the request to the
//! purchase-request track (`NeedPurchaseRequest`) instead.

use serde::{Deserialize, Serialize};

/// Store request lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreRequestStatus {
    Draft,
    Pending,
    Approved,
    NeedPurchaseRequest,
    Completed,
    Rejected,
}

impl StoreRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreRequestStatus::Draft => "draft",
            StoreRequestStatus::Pending => "pending",
            StoreRequestStatus::Approved => "approved",
            StoreRequestStatus::NeedPurchaseRequest => "need_purchase_request",
            StoreRequestStatus::Completed => "completed",
            StoreRequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(StoreRequestStatus::Draft),
            "pending" => Some(StoreRequestStatus::Pending),
            "approved" => Some(StoreRequestStatus::Approved),
            "need_purchase_request" => Some(StoreRequestStatus::NeedPurchaseRequest),
            "completed" => Some(StoreRequestStatus::Completed),
            "rejected" => Some(StoreRequestStatus::Rejected),
            _ => None,
        }
    }

    /// Transition table. No edge re-enters `Draft`.
    pub fn can_transition_to(&self, next: StoreRequestStatus) -> bool {
        use StoreRequestStatus::*;
        matches!(
            (self, next),
            (Draft, Pending)
                | (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, NeedPurchaseRequest)
                | (Approved, Completed)
                | (NeedPurchaseRequest, Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StoreRequestStatus::Completed | StoreRequestStatus::Rejected)
    }

    /// Only never-submitted documents may be deleted
    pub fn is_deletable(&self) -> bool {
        matches!(self, StoreRequestStatus::Draft)
    }
}

impl std::fmt::Display for StoreRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
