//! Validation utilities for the mill back-office platform

use rust_decimal::Decimal;

use crate::models::parse_document_number;

/// Validate that a posted or requested quantity is strictly positive
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate an approver/issuer name. Approval-gated transitions require a
/// non-blank name.
pub fn validate_person_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name is required");
    }
    if name.len() > 100 {
        return Err("Name must be at most 100 characters");
    }
    Ok(())
}

/// Validate a document number of the form `{PREFIX}/{YYYYMM}/{NNNN}`
pub fn validate_document_number(number: &str) -> Result<(), &'static str> {
    match parse_document_number(number) {
        Some(_) => Ok(()),
        None => Err("Invalid document number format"),
    }
}

