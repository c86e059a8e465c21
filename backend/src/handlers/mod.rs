//! HTTP handlers for the mill back-office engine

pub mod goods_issue;
pub mod goods_receipt;
pub mod health;
pub mod purchase_order;
pub mod purchase_request;
pub mod stock;
pub mod store_request;
pub mod tank;

pub use goods_issue::*;
pub use goods_receipt::*;
pub use health::*;
pub use purchase_order::*;
pub use purchase_request::*;
pub use stock::*;
pub use store_request::*;
pub use tank::*;
