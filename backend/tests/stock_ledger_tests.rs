//! Stock ledger tests
//!
//! Tests for the material stock ledger including:
//! - Non-negative stock invariant under any posting sequence
//! - Post-transaction snapshot consistency
//! - Signed adjustments routed through the same guard
//! - Trailing-average goods-issue pricing

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{
    apply_posting, stock_level_status, trailing_average_price, StockDirection, StockLevelStatus,
    TransactionType, PRICE_WINDOW,
};
use shared::validation::validate_quantity;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_transaction_type_labels() {
        assert_eq!(TransactionType::In.as_str(), "in");
        assert_eq!(TransactionType::Out.as_str(), "out");
        assert_eq!(TransactionType::Adjustment.as_str(), "adjustment");
    }

    #[test]
    fn test_in_posting_adds_stock() {
        let result = apply_posting(dec("100.0"), StockDirection::In, dec("25.5"));
        assert_eq!(result, Some(dec("125.5")));
    }

    #[test]
    fn test_out_posting_subtracts_stock() {
        let result = apply_posting(dec("100.0"), StockDirection::Out, dec("30.0"));
        assert_eq!(result, Some(dec("70.0")));
    }

    #[test]
    fn test_out_posting_to_exactly_zero() {
        let result = apply_posting(dec("42.0"), StockDirection::Out, dec("42.0"));
        assert_eq!(result, Some(Decimal::ZERO));
    }

    /// An OUT exceeding stock is refused outright, never clamped
    #[test]
    fn test_out_posting_exceeding_stock_rejected() {
        let result = apply_posting(dec("50.0"), StockDirection::Out, dec("50.001"));
        assert_eq!(result, None);
    }

    #[test]
    fn test_out_posting_from_empty_stock_rejected() {
        let result = apply_posting(Decimal::ZERO, StockDirection::Out, dec("0.001"));
        assert_eq!(result, None);
    }

    #[test]
    fn test_zero_quantity_fails_validation() {
        assert!(validate_quantity(Decimal::ZERO).is_err());
        assert!(validate_quantity(dec("-1.0")).is_err());
        assert!(validate_quantity(dec("0.001")).is_ok());
    }

    /// A negative adjustment is an OUT through the same guard: writing off
    /// more than exists is refused
    #[test]
    fn test_adjustment_write_off_guarded() {
        let stock = dec("10.0");
        let delta = dec("-12.0");
        let result = apply_posting(stock, StockDirection::Out, delta.abs());
        assert_eq!(result, None);
    }

    #[test]
    fn test_adjustment_restock() {
        let stock = dec("10.0");
        let delta = dec("5.0");
        let result = apply_posting(stock, StockDirection::In, delta.abs());
        assert_eq!(result, Some(dec("15.0")));
    }

    #[test]
    fn test_stock_level_below_minimum() {
        let status = stock_level_status(dec("5.0"), Some(dec("10.0")), Some(dec("100.0")));
        assert_eq!(status, StockLevelStatus::BelowMinimum);
    }

    #[test]
    fn test_stock_level_above_maximum() {
        let status = stock_level_status(dec("150.0"), Some(dec("10.0")), Some(dec("100.0")));
        assert_eq!(status, StockLevelStatus::AboveMaximum);
    }

    #[test]
    fn test_stock_level_normal_without_thresholds() {
        let status = stock_level_status(dec("5.0"), None, None);
        assert_eq!(status, StockLevelStatus::Normal);
    }

    /// Thresholds are advisory: a below-minimum level never blocks a posting
    #[test]
    fn test_thresholds_never_block_postings() {
        let stock = dec("5.0");
        assert_eq!(
            stock_level_status(stock, Some(dec("10.0")), None),
            StockLevelStatus::BelowMinimum
        );
        // The posting guard only checks non-negativity
        assert_eq!(
            apply_posting(stock, StockDirection::Out, dec("5.0")),
            Some(Decimal::ZERO)
        );
    }

    #[test]
    fn test_trailing_average_single_entry() {
        let entries = vec![(dec("10.0"), dec("25.0"))];
        assert_eq!(trailing_average_price(&entries), Some(dec("25.0")));
    }

    /// The average is quantity-weighted, not a simple mean of prices
    #[test]
    fn test_trailing_average_quantity_weighted() {
        // 100 kg at 20 + 50 kg at 26 = 3300 over 150 kg = 22
        let entries = vec![(dec("100.0"), dec("20.0")), (dec("50.0"), dec("26.0"))];
        assert_eq!(trailing_average_price(&entries), Some(dec("22")));
    }

    #[test]
    fn test_trailing_average_empty_history() {
        assert_eq!(trailing_average_price(&[]), None);
    }

    #[test]
    fn test_price_window_is_ten() {
        assert_eq!(PRICE_WINDOW, 10);
    }
}

// ============================================================================
// Ledger Simulation
// ============================================================================

#[cfg(test)]
mod ledger_simulation {
    use super::*;

    /// One simulated ledger row: direction, quantity, and the snapshot
    /// recorded after the posting
    pub struct SimulatedEntry {
        pub direction: StockDirection,
        pub quantity: Decimal,
        pub stock_on_hand: Decimal,
    }

    /// Run a posting sequence against an in-memory material, recording
    /// snapshots the way the service writes transaction rows. Rejected
    /// postings leave no trace.
    pub fn run_postings(
        initial: Decimal,
        postings: &[(StockDirection, Decimal)],
    ) -> (Decimal, Vec<SimulatedEntry>) {
        let mut stock = initial;
        let mut log = Vec::new();
        for (direction, quantity) in postings {
            if let Some(next) = apply_posting(stock, *direction, *quantity) {
                stock = next;
                log.push(SimulatedEntry {
                    direction: *direction,
                    quantity: *quantity,
                    stock_on_hand: stock,
                });
            }
        }
        (stock, log)
    }

    #[test]
    fn test_snapshot_matches_running_stock() {
        let (final_stock, log) = run_postings(
            dec("100.0"),
            &[
                (StockDirection::In, dec("50.0")),
                (StockDirection::Out, dec("30.0")),
                (StockDirection::Out, dec("200.0")), // rejected
                (StockDirection::In, dec("10.0")),
            ],
        );

        assert_eq!(final_stock, dec("130.0"));
        assert_eq!(log.len(), 3);
        assert_eq!(log.last().unwrap().stock_on_hand, final_stock);
    }

    /// Two issues racing for the last stock: whichever serializes second is
    /// refused in full
    #[test]
    fn test_competing_issues_serialize() {
        let stock = dec("100.0");
        let first = apply_posting(stock, StockDirection::Out, dec("80.0")).unwrap();
        assert_eq!(first, dec("20.0"));

        // The second issue sees the committed stock, not the original
        let second = apply_posting(first, StockDirection::Out, dec("80.0"));
        assert_eq!(second, None);
    }

    #[test]
    fn test_rejected_posting_leaves_no_entry() {
        let (final_stock, log) = run_postings(
            dec("10.0"),
            &[(StockDirection::Out, dec("10.5"))],
        );
        assert_eq!(final_stock, dec("10.0"));
        assert!(log.is_empty());
    }
}

// ============================================================================
// Pagination
// ============================================================================

#[cfg(test)]
mod pagination_tests {
    use shared::types::{Pagination, PaginationMeta};

    #[test]
    fn test_defaults() {
        let pagination = Pagination::default();
        assert_eq!(pagination.page(), 1);
        assert_eq!(pagination.per_page(), 20);
        assert_eq!(pagination.offset(), 0);
    }

    #[test]
    fn test_offset_for_later_pages() {
        let pagination = Pagination { page: 3, per_page: 50 };
        assert_eq!(pagination.offset(), 100);
    }

    #[test]
    fn test_zero_page_clamped() {
        let pagination = Pagination { page: 0, per_page: 0 };
        assert_eq!(pagination.page(), 1);
        assert_eq!(pagination.per_page(), 1);
    }

    #[test]
    fn test_meta_rounds_pages_up() {
        let pagination = Pagination { page: 1, per_page: 20 };
        let meta = PaginationMeta::new(&pagination, 41);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.total_items, 41);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 3)) // 0.001 to 100.000
    }

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1000000i64).prop_map(|n| Decimal::new(n, 2)) // 0.01 to 10000.00
    }

    fn direction_strategy() -> impl Strategy<Value = StockDirection> {
        prop_oneof![Just(StockDirection::In), Just(StockDirection::Out)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Stock never goes negative, whatever the posting sequence
        #[test]
        fn prop_stock_never_negative(
            initial in quantity_strategy(),
            postings in prop::collection::vec(
                (direction_strategy(), quantity_strategy()),
                0..30
            )
        ) {
            let mut stock = initial;
            for (direction, quantity) in &postings {
                if let Some(next) = apply_posting(stock, *direction, *quantity) {
                    stock = next;
                }
                prop_assert!(stock >= Decimal::ZERO);
            }
        }

        /// Accepted postings account exactly: final = initial + in - out
        #[test]
        fn prop_accepted_postings_account_exactly(
            initial in quantity_strategy(),
            postings in prop::collection::vec(
                (direction_strategy(), quantity_strategy()),
                0..30
            )
        ) {
            let mut stock = initial;
            let mut total_in = Decimal::ZERO;
            let mut total_out = Decimal::ZERO;
            for (direction, quantity) in &postings {
                if let Some(next) = apply_posting(stock, *direction, *quantity) {
                    stock = next;
                    match direction {
                        StockDirection::In => total_in += quantity,
                        StockDirection::Out => total_out += quantity,
                    }
                }
            }
            prop_assert_eq!(stock, initial + total_in - total_out);
        }

        /// An OUT posting either succeeds in full or not at all
        #[test]
        fn prop_out_all_or_nothing(
            stock in quantity_strategy(),
            quantity in quantity_strategy()
        ) {
            match apply_posting(stock, StockDirection::Out, quantity) {
                Some(next) => prop_assert_eq!(next, stock - quantity),
                None => prop_assert!(quantity > stock),
            }
        }

        /// The trailing average lies between the minimum and maximum entry
        /// prices
        #[test]
        fn prop_trailing_average_bounded(
            entries in prop::collection::vec(
                (quantity_strategy(), price_strategy()),
                1..10
            )
        ) {
            let average = trailing_average_price(&entries).unwrap();
            let min_price = entries.iter().map(|(_, p)| *p).min().unwrap();
            let max_price = entries.iter().map(|(_, p)| *p).max().unwrap();
            prop_assert!(average >= min_price);
            prop_assert!(average <= max_price);
        }

        /// Uniform prices average to themselves regardless of quantities
        #[test]
        fn prop_uniform_price_average(
            quantities in prop::collection::vec(quantity_strategy(), 1..10),
            price in price_strategy()
        ) {
            let entries: Vec<_> = quantities.iter().map(|q| (*q, price)).collect();
            let average = trailing_average_price(&entries).unwrap();
            prop_assert_eq!(average, price);
        }
    }
}
