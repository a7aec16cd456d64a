//! # ERP Invoice
//!
//! 草稿發票合併：比對共同欄位後產生一張合併發票

pub mod merging;

// Re-export 主要類型
pub use merging::{
    CommonFields, InvoiceMergingResult, InvoiceMergingService, MergeChecks, MergeOverrides,
    MergedInvoice,
};
