//! 庫存規則模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ErpError, Result};

/// 規則用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseCase {
    /// 補貨計劃（MRP）
    ReplenishmentPlanning,
    /// 庫存控制（合規檢查）
    StockControl,
}

/// 規則類型：以現有數量或預計數量為準
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleType {
    /// 現有數量
    Current,
    /// 預計數量
    Future,
}

impl RuleType {
    /// 批次檢查時依序評估的類型
    pub const ALL: [RuleType; 2] = [RuleType::Current, RuleType::Future];
}

/// 庫存規則（某物料在某庫位的補貨/控制門檻）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRule {
    /// 規則ID
    pub id: Uuid,

    /// 物料ID
    pub product_id: String,

    /// 庫位ID
    pub location_id: String,

    /// 用途
    pub use_case: UseCase,

    /// 類型
    pub rule_type: RuleType,

    /// 最小數量
    pub min_qty: Decimal,

    /// 理想數量
    pub ideal_qty: Option<Decimal>,

    /// 最大數量
    pub max_qty: Option<Decimal>,

    /// 再訂購量
    pub reorder_qty: Decimal,

    /// 以理想數量作為補貨目標（否則使用最小數量）
    pub use_ideal_qty: bool,

    /// 訂購量不得超過最大數量
    pub use_max_qty: bool,
}

impl StockRule {
    /// 創建新的庫存規則
    pub fn new(
        product_id: impl Into<String>,
        location_id: impl Into<String>,
        use_case: UseCase,
        rule_type: RuleType,
        min_qty: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            location_id: location_id.into(),
            use_case,
            rule_type,
            min_qty,
            ideal_qty: None,
            max_qty: None,
            reorder_qty: Decimal::ZERO,
            use_ideal_qty: false,
            use_max_qty: false,
        }
    }

    /// 建構器模式：設置理想數量並啟用
    pub fn with_ideal_qty(mut self, qty: Decimal) -> Self {
        self.ideal_qty = Some(qty);
        self.use_ideal_qty = true;
        self
    }

    /// 建構器模式：設置最大數量並啟用
    pub fn with_max_qty(mut self, qty: Decimal) -> Self {
        self.max_qty = Some(qty);
        self.use_max_qty = true;
        self
    }

    /// 建構器模式：設置再訂購量
    pub fn with_reorder_qty(mut self, qty: Decimal) -> Self {
        self.reorder_qty = qty;
        self
    }

    /// 建構器模式：切換理想數量旗標（不修改數值）
    pub fn with_use_ideal_qty(mut self, enabled: bool) -> Self {
        self.use_ideal_qty = enabled;
        self
    }

    /// 建構器模式：切換最大數量旗標（不修改數值）
    pub fn with_use_max_qty(mut self, enabled: bool) -> Self {
        self.use_max_qty = enabled;
        self
    }

    /// 補貨目標數量：理想數量或最小數量
    pub fn target_qty(&self) -> Result<Decimal> {
        if !self.use_ideal_qty {
            return Ok(self.min_qty);
        }
        self.ideal_qty.ok_or_else(|| {
            ErpError::InvalidRule(format!("規則 {} 啟用理想數量但未設置", self.id))
        })
    }

    /// 最大數量上限（未啟用時為 None）
    pub fn max_qty_limit(&self) -> Result<Option<Decimal>> {
        if !self.use_max_qty {
            return Ok(None);
        }
        self.max_qty.map(Some).ok_or_else(|| {
            ErpError::InvalidRule(format!("規則 {} 啟用最大數量但未設置", self.id))
        })
    }

    /// 檢查旗標與門檻是否一致
    pub fn validate(&self) -> Result<()> {
        self.target_qty()?;
        self.max_qty_limit()?;
        Ok(())
    }

    /// 檢查規則是否屬於指定物料與類型
    pub fn matches(&self, product_id: &str, rule_type: RuleType) -> bool {
        self.product_id == product_id && self.rule_type == rule_type
    }
}
