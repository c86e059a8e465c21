//! Shared types and models for the mill back-office platform
//!
//! This crate contains the domain vocabulary shared between the backend
//! services and their tests: document status machines, ledger transaction
//! types, document numbering, and the pure calculation rules the
//! procurement engine is built on.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
