//! Document state machine tests
//!
//! Tests for the five document lifecycles and document numbering:
//! - Transition tables for SR, PR, PO, GR and GI
//! - Terminal states admit no further transitions
//! - Deletion only from DRAFT
//! - Purchase order status derivation from item progress
//! - Document number format and parsing

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{
    derive_po_status, document_period, format_document_number, parse_document_number,
    DocumentType, GoodsIssueStatus, GoodsReceiptStatus, PoItemProgress, PurchaseOrderStatus,
    PurchaseRequestStatus, PurchaseType, StoreRequestStatus,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod store_request_tests {
    use super::*;
    use StoreRequestStatus::*;

    #[test]
    fn test_happy_path() {
        assert!(Draft.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Completed));
    }

    #[test]
    fn test_shortfall_routing() {
        assert!(Approved.can_transition_to(NeedPurchaseRequest));
        assert!(NeedPurchaseRequest.can_transition_to(Completed));
    }

    /// Shortfall routing is the composite PENDING -> APPROVED ->
    /// NEED_PURCHASE_REQUEST; there is no direct edge from PENDING
    #[test]
    fn test_shortfall_routing_is_two_hops() {
        assert!(!Pending.can_transition_to(NeedPurchaseRequest));
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(NeedPurchaseRequest));
    }

    #[test]
    fn test_rejection_only_from_pending() {
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Draft.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Rejected));
    }

    #[test]
    fn test_no_skipping_approval() {
        assert!(!Draft.can_transition_to(Approved));
        assert!(!Draft.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(Completed.is_terminal());
        assert!(Rejected.is_terminal());
        assert!(!Draft.is_terminal());
        assert!(!NeedPurchaseRequest.is_terminal());
    }

    #[test]
    fn test_only_draft_deletable() {
        assert!(Draft.is_deletable());
        for status in [Pending, Approved, NeedPurchaseRequest, Completed, Rejected] {
            assert!(!status.is_deletable(), "{:?} must not be deletable", status);
        }
    }

    #[test]
    fn test_round_trips_through_strings() {
        for status in [Draft, Pending, Approved, NeedPurchaseRequest, Completed, Rejected] {
            assert_eq!(StoreRequestStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(StoreRequestStatus::from_str("bogus"), None);
    }
}

#[cfg(test)]
mod purchase_request_tests {
    use super::*;
    use PurchaseRequestStatus::*;

    #[test]
    fn test_direct_purchase_path() {
        // PEMBELIAN LANGSUNG closes on goods receipt, without a PO
        assert!(Draft.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Completed));
    }

    #[test]
    fn test_po_submission_path() {
        // PENGAJUAN PO hands over to a purchase order and ends there
        assert!(Approved.can_transition_to(PoCreated));
        assert!(PoCreated.is_terminal());
        assert!(!PoCreated.can_transition_to(Completed));
    }

    #[test]
    fn test_rejection_only_from_pending() {
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Rejected));
    }

    #[test]
    fn test_only_draft_deletable() {
        assert!(Draft.is_deletable());
        for status in [Pending, Approved, PoCreated, Completed, Rejected] {
            assert!(!status.is_deletable());
        }
    }

    #[test]
    fn test_purchase_type_labels() {
        assert_eq!(PurchaseType::DirectPurchase.as_str(), "direct_purchase");
        assert_eq!(PurchaseType::PoSubmission.as_str(), "po_submission");
        assert_eq!(
            PurchaseType::from_str("direct_purchase"),
            Some(PurchaseType::DirectPurchase)
        );
    }
}

#[cfg(test)]
mod purchase_order_tests {
    use super::*;
    use PurchaseOrderStatus::*;

    #[test]
    fn test_issue_then_receive() {
        assert!(Draft.can_transition_to(Issued));
        assert!(Issued.can_transition_to(PartialReceived));
        assert!(PartialReceived.can_transition_to(Completed));
        assert!(Issued.can_transition_to(Completed));
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        assert!(Draft.can_transition_to(Cancelled));
        assert!(Issued.can_transition_to(Cancelled));
        assert!(PartialReceived.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_receipts_only_while_open() {
        assert!(Issued.accepts_receipts());
        assert!(PartialReceived.accepts_receipts());
        assert!(!Draft.accepts_receipts());
        assert!(!Completed.accepts_receipts());
        assert!(!Cancelled.accepts_receipts());
    }

    #[test]
    fn test_derive_untouched_order_keeps_status() {
        let items = [PoItemProgress {
            quantity_ordered: dec("10.0"),
            quantity_received: Decimal::ZERO,
        }];
        assert_eq!(derive_po_status(&items, Issued), Issued);
    }

    #[test]
    fn test_derive_partial_receipt() {
        let items = [
            PoItemProgress {
                quantity_ordered: dec("10.0"),
                quantity_received: dec("10.0"),
            },
            PoItemProgress {
                quantity_ordered: dec("5.0"),
                quantity_received: Decimal::ZERO,
            },
        ];
        assert_eq!(derive_po_status(&items, Issued), PartialReceived);
    }

    #[test]
    fn test_derive_completed_when_all_covered() {
        let items = [
            PoItemProgress {
                quantity_ordered: dec("10.0"),
                quantity_received: dec("10.0"),
            },
            PoItemProgress {
                quantity_ordered: dec("5.0"),
                quantity_received: dec("6.0"), // over-receipt still covers
            },
        ];
        assert_eq!(derive_po_status(&items, PartialReceived), Completed);
    }

    #[test]
    fn test_derive_empty_order_never_completes() {
        assert_eq!(derive_po_status(&[], Issued), Issued);
    }
}

#[cfg(test)]
mod goods_document_tests {
    use super::*;

    #[test]
    fn test_goods_receipt_single_step() {
        assert!(GoodsReceiptStatus::Draft.can_transition_to(GoodsReceiptStatus::Completed));
        assert!(GoodsReceiptStatus::Completed.is_terminal());
        assert!(GoodsReceiptStatus::Draft.is_deletable());
        assert!(!GoodsReceiptStatus::Completed.is_deletable());
    }

    #[test]
    fn test_goods_issue_lifecycle() {
        use GoodsIssueStatus::*;
        assert!(Draft.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Completed));
        assert!(!Draft.can_transition_to(Completed));
        assert!(!Approved.can_transition_to(Rejected));
    }

    #[test]
    fn test_goods_issue_terminal_states() {
        assert!(GoodsIssueStatus::Completed.is_terminal());
        assert!(GoodsIssueStatus::Rejected.is_terminal());
        assert!(GoodsIssueStatus::Draft.is_deletable());
        assert!(!GoodsIssueStatus::Approved.is_deletable());
    }
}

#[cfg(test)]
mod document_number_tests {
    use super::*;

    #[test]
    fn test_format() {
        let number = format_document_number(DocumentType::GoodsIssue, 2025, 1, 1);
        assert_eq!(number, "GI/202501/0001");

        let number = format_document_number(DocumentType::PurchaseOrder, 2024, 12, 137);
        assert_eq!(number, "PO/202412/0137");
    }

    #[test]
    fn test_period_key() {
        assert_eq!(document_period(2025, 3), "202503");
        assert_eq!(document_period(2025, 11), "202511");
    }

    #[test]
    fn test_parse() {
        let parsed = parse_document_number("SR/202506/0042").unwrap();
        assert_eq!(parsed, (DocumentType::StoreRequest, 2025, 6, 42));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_document_number("XX/202506/0042").is_none());
        assert!(parse_document_number("SR/20256/0042").is_none());
        assert!(parse_document_number("SR/202513/0042").is_none());
        assert!(parse_document_number("SR/202506/42").is_none());
        assert!(parse_document_number("SR/202506/0042/extra").is_none());
    }

    #[test]
    fn test_validation_wraps_parsing() {
        use shared::validation::validate_document_number;
        assert!(validate_document_number("PR/202502/0007").is_ok());
        assert!(validate_document_number("PR-202502-0007").is_err());
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(DocumentType::StoreRequest.prefix(), "SR");
        assert_eq!(DocumentType::PurchaseRequest.prefix(), "PR");
        assert_eq!(DocumentType::PurchaseOrder.prefix(), "PO");
        assert_eq!(DocumentType::GoodsReceipt.prefix(), "GR");
        assert_eq!(DocumentType::GoodsIssue.prefix(), "GI");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn sr_status_strategy() -> impl Strategy<Value = StoreRequestStatus> {
        use StoreRequestStatus::*;
        prop_oneof![
            Just(Draft),
            Just(Pending),
            Just(Approved),
            Just(NeedPurchaseRequest),
            Just(Completed),
            Just(Rejected),
        ]
    }

    fn po_status_strategy() -> impl Strategy<Value = PurchaseOrderStatus> {
        use PurchaseOrderStatus::*;
        prop_oneof![
            Just(Draft),
            Just(Issued),
            Just(PartialReceived),
            Just(Completed),
            Just(Cancelled),
        ]
    }

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 3))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Terminal states admit no outgoing transition at all
        #[test]
        fn prop_terminal_states_are_final(
            from in sr_status_strategy(),
            to in sr_status_strategy()
        ) {
            if from.is_terminal() {
                prop_assert!(!from.can_transition_to(to));
            }
        }

        /// Cancellation is exactly the non-terminal edge
        #[test]
        fn prop_po_cancel_iff_non_terminal(from in po_status_strategy()) {
            prop_assert_eq!(
                from.can_transition_to(PurchaseOrderStatus::Cancelled),
                !from.is_terminal()
            );
        }

        /// Derived status is monotone: receiving more never moves an order
        /// away from completion
        #[test]
        fn prop_po_derivation_monotone(
            ordered in prop::collection::vec(quantity_strategy(), 1..8),
            received_fraction in prop::collection::vec(0u8..=100u8, 1..8),
            extra in quantity_strategy()
        ) {
            let len = ordered.len().min(received_fraction.len());
            let items: Vec<PoItemProgress> = (0..len)
                .map(|i| PoItemProgress {
                    quantity_ordered: ordered[i],
                    quantity_received: ordered[i] * Decimal::from(received_fraction[i]) / Decimal::from(100),
                })
                .collect();

            let before = derive_po_status(&items, PurchaseOrderStatus::Issued);

            // Receive more on the first item
            let mut bumped = items.clone();
            bumped[0].quantity_received += extra;
            let after = derive_po_status(&bumped, PurchaseOrderStatus::Issued);

            if before == PurchaseOrderStatus::Completed {
                prop_assert_eq!(after, PurchaseOrderStatus::Completed);
            }
            if after == PurchaseOrderStatus::Issued {
                prop_assert_eq!(before, PurchaseOrderStatus::Issued);
            }
        }

        /// Formatted numbers always parse back to their parts
        #[test]
        fn prop_document_number_round_trip(
            year in 2000i32..=2099,
            month in 1u32..=12,
            sequence in 1i32..=9999
        ) {
            let number = format_document_number(DocumentType::GoodsReceipt, year, month, sequence);
            let parsed = parse_document_number(&number);
            prop_assert_eq!(parsed, Some((DocumentType::GoodsReceipt, year, month, sequence)));
        }
    }
}
