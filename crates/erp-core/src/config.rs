//! 批次與合併配置模型

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rule::StockRule;
use crate::{ErpError, Result};

/// 預設每頁讀取的庫位明細數
pub const DEFAULT_FETCH_LIMIT: usize = 10;

/// 庫存合規檢查批次配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceBatchConfig {
    /// 每頁處理的庫位明細數
    pub fetch_limit: usize,

    /// 只檢查上次成功執行後有異動的庫位
    pub run_from_last_execution: bool,

    /// 上次成功執行的開始時間（水位）
    pub last_successful_run: Option<NaiveDateTime>,

    /// 指定使用的規則；為空時直接查詢規則存放區
    pub used_rules: Vec<StockRule>,

    /// 計算違規訂購量時的最小再訂購量
    pub min_reorder_qty: Decimal,

    /// 是否並行評估
    pub parallel: bool,
}

impl Default for ComplianceBatchConfig {
    fn default() -> Self {
        Self {
            fetch_limit: DEFAULT_FETCH_LIMIT,
            run_from_last_execution: false,
            last_successful_run: None,
            used_rules: Vec::new(),
            min_reorder_qty: Decimal::ZERO,
            parallel: false,
        }
    }
}

impl ComplianceBatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 JSON 載入並驗證
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置分頁大小
    pub fn with_fetch_limit(mut self, fetch_limit: usize) -> Self {
        self.fetch_limit = fetch_limit;
        self
    }

    /// 建構器模式：從上次成功執行的水位開始
    pub fn with_last_successful_run(mut self, watermark: NaiveDateTime) -> Self {
        self.run_from_last_execution = true;
        self.last_successful_run = Some(watermark);
        self
    }

    /// 建構器模式：指定使用的規則
    pub fn with_used_rules(mut self, rules: Vec<StockRule>) -> Self {
        self.used_rules = rules;
        self
    }

    /// 建構器模式：設置最小再訂購量
    pub fn with_min_reorder_qty(mut self, qty: Decimal) -> Self {
        self.min_reorder_qty = qty;
        self
    }

    /// 建構器模式：並行評估
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// 增量執行時採用的水位
    pub fn watermark(&self) -> Option<NaiveDateTime> {
        if self.run_from_last_execution {
            self.last_successful_run
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch_limit == 0 {
            return Err(ErpError::InvalidConfig("fetch_limit 必須大於 0".to_string()));
        }
        if self.run_from_last_execution && self.last_successful_run.is_none() {
            return Err(ErpError::InvalidConfig(
                "增量執行需要上次成功執行時間".to_string(),
            ));
        }
        if self.min_reorder_qty.is_sign_negative() {
            return Err(ErpError::InvalidConfig(
                "min_reorder_qty 不可為負數".to_string(),
            ));
        }
        Ok(())
    }
}

/// 發票合併配置：啟用的模組決定參與比對的欄位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceMergeConfig {
    /// 供應鏈模組：帶入來源銷售/採購訂單
    pub supplychain: bool,

    /// 專案模組：專案必須一致
    pub business_project: bool,
}

impl Default for InvoiceMergeConfig {
    fn default() -> Self {
        Self {
            supplychain: true,
            business_project: true,
        }
    }
}

impl InvoiceMergeConfig {
    /// 僅比對基本欄位
    pub fn base() -> Self {
        Self {
            supplychain: false,
            business_project: false,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_supplychain(mut self, enabled: bool) -> Self {
        self.supplychain = enabled;
        self
    }

    pub fn with_business_project(mut self, enabled: bool) -> Self {
        self.business_project = enabled;
        self
    }
}
