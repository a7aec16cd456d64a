//! 發票模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 發票狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Draft,
    Validated,
    Ventilated,
    Canceled,
}

/// 發票作業類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceOperationType {
    /// 供應商採購
    SupplierPurchase,
    /// 供應商退款
    SupplierRefund,
    /// 客戶銷售
    ClientSale,
    /// 客戶退款
    ClientRefund,
}

impl InvoiceOperationType {
    pub fn is_purchase(&self) -> bool {
        matches!(self, Self::SupplierPurchase | Self::SupplierRefund)
    }
}

impl fmt::Display for InvoiceOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SupplierPurchase => "供應商採購",
            Self::SupplierRefund => "供應商退款",
            Self::ClientSale => "客戶銷售",
            Self::ClientRefund => "客戶退款",
        };
        f.write_str(name)
    }
}

/// 發票明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: Uuid,

    /// 物料ID
    pub product_id: Option<String>,

    /// 品名/說明
    pub description: String,

    /// 數量
    pub quantity: Decimal,

    /// 單價（未稅）
    pub unit_price: Decimal,
}

impl InvoiceLine {
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: None,
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// 建構器模式：設置物料
    pub fn with_product_id(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    /// 未稅金額
    pub fn ex_tax_total(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// 發票
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub status: InvoiceStatus,
    pub operation_type: InvoiceOperationType,

    /// 公司
    pub company_id: String,

    /// 幣別
    pub currency: String,

    /// 客戶/供應商
    pub partner_id: String,

    /// 聯絡人
    pub contact_partner_id: Option<String>,

    /// 價目表
    pub price_list_id: Option<String>,

    /// 付款方式
    pub payment_mode_id: Option<String>,

    /// 付款條件
    pub payment_condition_id: Option<String>,

    /// 營業名稱
    pub trading_name_id: Option<String>,

    /// 供應商發票號碼
    pub supplier_invoice_nb: Option<String>,

    /// 原始發票日期
    pub origin_date: Option<NaiveDate>,

    /// 來源銷售訂單
    pub sale_order_id: Option<String>,

    /// 來源採購訂單
    pub purchase_order_id: Option<String>,

    /// 專案
    pub project_id: Option<String>,

    pub lines: Vec<InvoiceLine>,
}

impl Invoice {
    /// 創建新的草稿發票
    pub fn draft(
        operation_type: InvoiceOperationType,
        company_id: impl Into<String>,
        partner_id: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: InvoiceStatus::Draft,
            operation_type,
            company_id: company_id.into(),
            currency: currency.into(),
            partner_id: partner_id.into(),
            contact_partner_id: None,
            price_list_id: None,
            payment_mode_id: None,
            payment_condition_id: None,
            trading_name_id: None,
            supplier_invoice_nb: None,
            origin_date: None,
            sale_order_id: None,
            purchase_order_id: None,
            project_id: None,
            lines: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_contact_partner(mut self, id: impl Into<String>) -> Self {
        self.contact_partner_id = Some(id.into());
        self
    }

    pub fn with_price_list(mut self, id: impl Into<String>) -> Self {
        self.price_list_id = Some(id.into());
        self
    }

    pub fn with_payment_mode(mut self, id: impl Into<String>) -> Self {
        self.payment_mode_id = Some(id.into());
        self
    }

    pub fn with_payment_condition(mut self, id: impl Into<String>) -> Self {
        self.payment_condition_id = Some(id.into());
        self
    }

    pub fn with_trading_name(mut self, id: impl Into<String>) -> Self {
        self.trading_name_id = Some(id.into());
        self
    }

    pub fn with_supplier_invoice_nb(mut self, nb: impl Into<String>) -> Self {
        self.supplier_invoice_nb = Some(nb.into());
        self
    }

    pub fn with_origin_date(mut self, date: NaiveDate) -> Self {
        self.origin_date = Some(date);
        self
    }

    pub fn with_sale_order(mut self, id: impl Into<String>) -> Self {
        self.sale_order_id = Some(id.into());
        self
    }

    pub fn with_purchase_order(mut self, id: impl Into<String>) -> Self {
        self.purchase_order_id = Some(id.into());
        self
    }

    pub fn with_project(mut self, id: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    /// 建構器模式：添加明細
    pub fn with_line(mut self, line: InvoiceLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn is_draft(&self) -> bool {
        self.status == InvoiceStatus::Draft
    }

    /// 未稅總額
    pub fn ex_tax_total(&self) -> Decimal {
        self.lines.iter().map(InvoiceLine::ex_tax_total).sum()
    }
}

/// 合併發票時的欄位衝突
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergeConflict {
    OperationType,
    Company,
    Currency,
    Partner,
    ContactPartner,
    PriceList,
    PaymentMode,
    PaymentCondition,
    TradingName,
    Project,
}

impl MergeConflict {
    /// 可由使用者選定值後繼續合併的欄位
    pub fn is_choosable(&self) -> bool {
        matches!(
            self,
            Self::ContactPartner | Self::PriceList | Self::PaymentMode | Self::PaymentCondition
        )
    }
}

impl fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::OperationType => "發票類型不同",
            Self::Company => "公司不同",
            Self::Currency => "幣別不同",
            Self::Partner => "客戶/供應商不同",
            Self::ContactPartner => "聯絡人不同",
            Self::PriceList => "價目表不同",
            Self::PaymentMode => "付款方式不同",
            Self::PaymentCondition => "付款條件不同",
            Self::TradingName => "營業名稱不同",
            Self::Project => "專案不同",
        };
        f.write_str(message)
    }
}
