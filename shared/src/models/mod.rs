//! Domain models for the mill back-office platform

mod document;
mod goods;
mod material;
mod purchase;
mod store_request;
mod tank;

pub use document::*;
pub use goods::*;
pub use material::*;
pub use purchase::*;
pub use store_request::*;
pub use tank::*;
