//! Tank allocation vocabulary
//!
//! Tanks model the physical placement of a material, not its ownership:
//! the sum of tank contents for a material may legitimately sit below the
//! material's total stock. The difference is the not-yet-binned quantity,
//! surfaced by the allocation summary and never auto-reconciled.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tank movement types. A transfer logs one `TransferOut` on the source
/// tank and one `TransferIn` on the destination, sharing a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TankTransactionType {
    Fill,
    Drain,
    TransferIn,
    TransferOut,
}

impl TankTransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TankTransactionType::Fill => "fill",
            TankTransactionType::Drain => "drain",
            TankTransactionType::TransferIn => "transfer_in",
            TankTransactionType::TransferOut => "transfer_out",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fill" => Some(TankTransactionType::Fill),
            "drain" => Some(TankTransactionType::Drain),
            "transfer_in" => Some(TankTransactionType::TransferIn),
            "transfer_out" => Some(TankTransactionType::TransferOut),
            _ => None,
        }
    }
}

/// Remaining room in a tank
pub fn tank_remaining_capacity(capacity: Decimal, current_volume: Decimal) -> Decimal {
    capacity - current_volume
}

/// Volume after a fill, or `None` when the fill exceeds remaining capacity
pub fn apply_fill(capacity: Decimal, current_volume: Decimal, quantity: Decimal) -> Option<Decimal> {
    if quantity > capacity - current_volume {
        None
    } else {
        Some(current_volume + quantity)
    }
}

/// Volume after a drain, or `None` when the drain exceeds current contents
pub fn apply_drain(current_volume: Decimal, quantity: Decimal) -> Option<Decimal> {
    if quantity > current_volume {
        None
    } else {
        Some(current_volume - quantity)
    }
}
