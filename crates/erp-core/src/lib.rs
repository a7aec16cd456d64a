//! # ERP Core
//!
//! 庫存規則與發票合併的核心資料模型與類型定義

pub mod config;
pub mod invoice;
pub mod location;
pub mod rule;
pub mod snapshot;

// Re-export 主要類型
pub use config::{ComplianceBatchConfig, InvoiceMergeConfig};
pub use invoice::{Invoice, InvoiceLine, InvoiceOperationType, InvoiceStatus, MergeConflict};
pub use location::{AncestorChain, LocationTree, LocationType, StockLocation};
pub use rule::{RuleType, StockRule, UseCase};
pub use snapshot::{AggregateQty, LocationSnapshot, MoveStatus, StockMoveRecord, TrackedLine};

use uuid::Uuid;

/// 規則引擎錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum ErpError {
    #[error("庫存規則無效: {0}")]
    InvalidRule(String),

    #[error("缺少庫位祖先鏈: {0}")]
    MissingAncestorChain(String),

    #[error("未配置規則存放區，無法直接查詢規則")]
    MissingRuleStore,

    #[error("找不到庫位: {0}")]
    LocationNotFound(String),

    #[error("庫位層級存在循環: {0}")]
    LocationCycle(String),

    #[error("祖先鏈中庫位重複: {0}")]
    DuplicateChainLocation(String),

    #[error("配置無效: {0}")]
    InvalidConfig(String),

    #[error("至少需要兩張發票才能合併")]
    NotEnoughInvoicesToMerge,

    #[error("發票不是草稿狀態: {0}")]
    InvoiceNotDraft(Uuid),

    #[error("不支援合併的發票類型: {0}")]
    UnsupportedInvoiceType(String),

    #[error("發票無法合併: {}", format_conflicts(.0))]
    InvoiceMergeConflicts(Vec<MergeConflict>),
}

fn format_conflicts(conflicts: &[MergeConflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<serde_json::Error> for ErpError {
    fn from(err: serde_json::Error) -> Self {
        ErpError::InvalidConfig(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ErpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicts_message_lists_every_field() {
        let err = ErpError::InvoiceMergeConflicts(vec![
            MergeConflict::Currency,
            MergeConflict::PaymentCondition,
        ]);

        let message = err.to_string();
        assert!(message.contains("幣別"));
        assert!(message.contains("付款條件"));
    }
}
