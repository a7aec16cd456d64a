//! 庫存快照模型

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rule::RuleType;

/// 庫位明細快照（某物料在某庫位的數量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    /// 庫位ID
    pub location_id: String,

    /// 物料ID
    pub product_id: String,

    /// 現有數量
    pub current_qty: Decimal,

    /// 預計數量
    pub future_qty: Decimal,
}

impl LocationSnapshot {
    /// 創建新的庫位快照
    pub fn new(
        location_id: impl Into<String>,
        product_id: impl Into<String>,
        current_qty: Decimal,
        future_qty: Decimal,
    ) -> Self {
        Self {
            location_id: location_id.into(),
            product_id: product_id.into(),
            current_qty,
            future_qty,
        }
    }

    /// 依規則類型取數量
    pub fn qty(&self, rule_type: RuleType) -> Decimal {
        match rule_type {
            RuleType::Current => self.current_qty,
            RuleType::Future => self.future_qty,
        }
    }

    /// 現有與預計數量皆為零
    pub fn is_out_of_stock(&self) -> bool {
        self.current_qty.is_zero() && self.future_qty.is_zero()
    }
}

/// 庫位及其子庫位的彙總數量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateQty {
    pub current_qty: Decimal,
    pub future_qty: Decimal,
}

impl AggregateQty {
    pub fn new(current_qty: Decimal, future_qty: Decimal) -> Self {
        Self {
            current_qty,
            future_qty,
        }
    }

    /// 依規則類型取數量
    pub fn qty(&self, rule_type: RuleType) -> Decimal {
        match rule_type {
            RuleType::Current => self.current_qty,
            RuleType::Future => self.future_qty,
        }
    }

    /// 累加一筆快照
    pub fn add(&mut self, snapshot: &LocationSnapshot) {
        self.current_qty += snapshot.current_qty;
        self.future_qty += snapshot.future_qty;
    }
}

/// 庫存異動狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveStatus {
    Draft,
    Planned,
    Realized,
    Canceled,
}

/// 庫存異動明細（批次選取待檢查庫位用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMoveRecord {
    /// 來源庫位
    pub from_location_id: String,

    /// 物料ID
    pub product_id: String,

    /// 狀態
    pub status: MoveStatus,

    /// 交付時間
    pub delivered_at: Option<NaiveDateTime>,
}

impl StockMoveRecord {
    /// 創建已實現的異動
    pub fn realized(
        from_location_id: impl Into<String>,
        product_id: impl Into<String>,
        delivered_at: NaiveDateTime,
    ) -> Self {
        Self {
            from_location_id: from_location_id.into(),
            product_id: product_id.into(),
            status: MoveStatus::Realized,
            delivered_at: Some(delivered_at),
        }
    }

    /// 建構器模式：設置狀態
    pub fn with_status(mut self, status: MoveStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_realized(&self) -> bool {
        self.status == MoveStatus::Realized
    }
}

/// 追蹤號明細（歸屬於某庫位的批號/序號數量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedLine {
    /// 所屬庫位
    pub details_location_id: String,

    /// 物料ID
    pub product_id: String,

    /// 追蹤號
    pub tracking_number: String,

    /// 現有數量
    pub current_qty: Decimal,
}

impl TrackedLine {
    pub fn new(
        details_location_id: impl Into<String>,
        product_id: impl Into<String>,
        tracking_number: impl Into<String>,
        current_qty: Decimal,
    ) -> Self {
        Self {
            details_location_id: details_location_id.into(),
            product_id: product_id.into(),
            tracking_number: tracking_number.into(),
            current_qty,
        }
    }
}
