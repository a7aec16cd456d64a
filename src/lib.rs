//! # ERP Rules
//!
//! 庫存規則與發票合併引擎的統一入口

pub use erp_calc as calc;
pub use erp_core as core;
pub use erp_invoice as invoice;

pub use erp_calc::{
    ComplianceBatch, ComplianceReport, InMemoryRuleStore, QuantityPlanner, RuleResolver,
    StockAggregator,
};
pub use erp_core::{ErpError, Result};
pub use erp_invoice::InvoiceMergingService;
