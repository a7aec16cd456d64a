//! # ERP Calculation Engine
//!
//! 庫存規則解析、補貨數量計算與合規檢查

pub mod aggregation;
pub mod compliance;
pub mod planner;
pub mod resolver;
pub mod tracking;

// Re-export 主要類型
pub use aggregation::StockAggregator;
pub use compliance::{select_lines_to_check, ComplianceBatch};
pub use planner::{QuantityPlanner, RuleEvaluation};
pub use resolver::{InMemoryRuleStore, LocationHierarchy, RuleResolver, RuleStore};
pub use tracking::{untracked_quantities, UntrackedQty};

use chrono::NaiveDateTime;
use erp_core::RuleType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 合規檢查結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// 成功處理的明細數
    pub done: usize,

    /// 處理失敗的明細數
    pub anomaly: usize,

    /// 違規記錄
    pub violations: Vec<ComplianceViolation>,

    /// 異常記錄
    pub anomalies: Vec<ComplianceAnomaly>,

    /// 下次增量執行的水位（本次開始時間）
    pub next_watermark: NaiveDateTime,

    /// 計算耗時（毫秒）
    pub elapsed_ms: Option<u128>,
}

impl ComplianceReport {
    /// 創建空的檢查結果
    pub fn empty(started_at: NaiveDateTime) -> Self {
        Self {
            done: 0,
            anomaly: 0,
            violations: Vec::new(),
            anomalies: Vec::new(),
            next_watermark: started_at,
            elapsed_ms: None,
        }
    }

    /// 添加異常
    pub fn add_anomaly(&mut self, anomaly: ComplianceAnomaly) {
        self.anomaly += 1;
        self.anomalies.push(anomaly);
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.anomaly == 0
    }
}

/// 庫位明細違反庫存規則
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceViolation {
    pub location_id: String,
    pub product_id: String,
    pub rule_id: Uuid,

    /// 規則所在庫位（可能是上層庫位）
    pub rule_location_id: String,
    pub rule_type: RuleType,

    /// 規則庫位及子庫位的彙總數量
    pub aggregate_qty: Decimal,
    pub min_qty: Decimal,

    /// 建議訂購量，非正值表示不需訂購
    pub qty_to_order: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceAnomaly {
    pub location_id: String,
    pub product_id: String,
    pub message: String,
}
