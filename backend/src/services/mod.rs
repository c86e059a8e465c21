//! Business logic services for the mill back-office engine

pub mod document_number;
pub mod goods_issue;
pub mod goods_receipt;
pub mod purchase_order;
pub mod purchase_request;
pub mod stock_ledger;
pub mod store_request;
pub mod tank;
pub mod workflow;

pub use goods_issue::GoodsIssueService;
pub use goods_receipt::GoodsReceiptService;
pub use purchase_order::PurchaseOrderService;
pub use purchase_request::PurchaseRequestService;
pub use stock_ledger::StockLedgerService;
pub use store_request::StoreRequestService;
pub use tank::TankService;
pub use workflow::WorkflowService;
