//! Request middleware for the mill back-office platform

mod scope;

pub use scope::{scope_middleware, CompanyScope, ScopeContext};
