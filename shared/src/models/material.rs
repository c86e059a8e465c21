//! Material stock and ledger transaction vocabulary

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ledger entry types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    In,
    Out,
    Adjustment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "in",
            TransactionType::Out => "out",
            TransactionType::Adjustment => "adjustment",
        }
    }
}

/// Direction of a stock posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockDirection {
    In,
    Out,
}

impl StockDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockDirection::In => "in",
            StockDirection::Out => "out",
        }
    }
}

/// Advisory stock level classification against min/max thresholds.
/// Never enforced, only surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevelStatus {
    BelowMinimum,
    Normal,
    AboveMaximum,
}

/// Classify current stock against the advisory thresholds
pub fn stock_level_status(
    stock_on_hand: Decimal,
    min_stock: Option<Decimal>,
    max_stock: Option<Decimal>,
) -> StockLevelStatus {
    if let Some(min) = min_stock {
        if stock_on_hand < min {
            return StockLevelStatus::BelowMinimum;
        }
    }
    if let Some(max) = max_stock {
        if stock_on_hand > max {
            return StockLevelStatus::AboveMaximum;
        }
    }
    StockLevelStatus::Normal
}

/// Apply a posting to a running stock figure.
///
/// Returns the post-transaction stock, or `None` when an OUT posting would
/// drive the stock negative. This is the single guard the whole ledger
/// hangs on; the service layer maps `None` to an insufficient-stock error.
pub fn apply_posting(
    stock_on_hand: Decimal,
    direction: StockDirection,
    quantity: Decimal,
) -> Option<Decimal> {
    match direction {
        StockDirection::In => Some(stock_on_hand + quantity),
        StockDirection::Out => {
            if quantity > stock_on_hand {
                None
            } else {
                Some(stock_on_hand - quantity)
            }
        }
    }
}

/// Quantity-weighted average price over a set of ledger entries,
/// `(quantity, unit_price)` pairs. `None` when no priced quantity exists.
///
/// Used for goods-issue pricing over the trailing window of a material's
/// transactions; callers fall back to the material's static unit price.
pub fn trailing_average_price(entries: &[(Decimal, Decimal)]) -> Option<Decimal> {
    let total_quantity: Decimal = entries.iter().map(|(q, _)| *q).sum();
    if total_quantity <= Decimal::ZERO {
        return None;
    }
    let total_value: Decimal = entries.iter().map(|(q, p)| q * p).sum();
    Some(total_value / total_quantity)
}

/// How many trailing transactions feed the goods-issue price average
pub const PRICE_WINDOW: i64 = 10;
