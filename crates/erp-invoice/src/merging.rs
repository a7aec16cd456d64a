//! 草稿發票合併

use chrono::NaiveDate;
use erp_core::{ErpError, Invoice, InvoiceMergeConfig, InvoiceOperationType, MergeConflict};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 各發票共同的欄位值；不一致的欄位為 None
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonFields {
    pub operation_type: Option<InvoiceOperationType>,
    pub company_id: Option<String>,
    pub currency: Option<String>,
    pub partner_id: Option<String>,
    pub contact_partner_id: Option<String>,
    pub price_list_id: Option<String>,
    pub payment_mode_id: Option<String>,
    pub payment_condition_id: Option<String>,
    pub trading_name_id: Option<String>,
    pub supplier_invoice_nb: Option<String>,
    pub origin_date: Option<NaiveDate>,
    pub sale_order_id: Option<String>,
    pub purchase_order_id: Option<String>,
    pub project_id: Option<String>,
}

/// 欄位是否出現不同的值（空值與非空值也算不同）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeChecks {
    pub operation_type_diff: bool,
    pub company_diff: bool,
    pub currency_diff: bool,
    pub partner_diff: bool,
    pub contact_partner_diff: bool,
    pub price_list_diff: bool,
    pub payment_mode_diff: bool,
    pub payment_condition_diff: bool,
    pub trading_name_diff: bool,
    pub supplier_invoice_nb_diff: bool,
    pub origin_date_diff: bool,
    pub sale_order_diff: bool,
    pub purchase_order_diff: bool,
    pub project_diff: bool,
}

/// 比對結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceMergingResult {
    pub common: CommonFields,
    pub checks: MergeChecks,
    pub invoice_count: usize,
}

/// 使用者對可選欄位指定的值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeOverrides {
    pub contact_partner_id: Option<String>,
    pub price_list_id: Option<String>,
    pub payment_mode_id: Option<String>,
    pub payment_condition_id: Option<String>,
}

impl MergeOverrides {
    pub fn new() -> Self {
        Self::default()
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
}

/// 合併後的發票
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedInvoice {
    pub invoice: Invoice,

    /// 被合併的來源發票
    pub merged_from: Vec<Uuid>,
}

fn track<T: PartialEq + Clone>(
    common: &mut Option<T>,
    diff: &mut bool,
    value: Option<&T>,
    first: bool,
) {
    if first {
        *common = value.cloned();
    } else if common.as_ref() != value {
        *common = None;
        *diff = true;
    }
}

/// 發票合併服務
#[derive(Debug, Clone, Default)]
pub struct InvoiceMergingService {
    config: InvoiceMergeConfig,
}

impl InvoiceMergingService {
    pub fn new(config: InvoiceMergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InvoiceMergeConfig {
        &self.config
    }

    /// 檢查前置條件並比對共同欄位
    pub fn collect(&self, invoices: &[Invoice]) -> erp_core::Result<InvoiceMergingResult> {
        if invoices.len() < 2 {
            return Err(ErpError::NotEnoughInvoicesToMerge);
        }
        if let Some(invoice) = invoices.iter().find(|invoice| !invoice.is_draft()) {
            return Err(ErpError::InvoiceNotDraft(invoice.id));
        }

        let mut result = InvoiceMergingResult::default();
        for invoice in invoices {
            result.invoice_count += 1;
            self.fill_common_fields(invoice, &mut result);
        }

        Ok(result)
    }

    fn fill_common_fields(&self, invoice: &Invoice, result: &mut InvoiceMergingResult) {
        let first = result.invoice_count == 1;
        let common = &mut result.common;
        let checks = &mut result.checks;

        track(
            &mut common.operation_type,
            &mut checks.operation_type_diff,
            Some(&invoice.operation_type),
            first,
        );
        track(&mut common.company_id, &mut checks.company_diff, Some(&invoice.company_id), first);
        track(&mut common.currency, &mut checks.currency_diff, Some(&invoice.currency), first);
        track(&mut common.partner_id, &mut checks.partner_diff, Some(&invoice.partner_id), first);
        track(
            &mut common.contact_partner_id,
            &mut checks.contact_partner_diff,
            invoice.contact_partner_id.as_ref(),
            first,
        );
        track(
            &mut common.price_list_id,
            &mut checks.price_list_diff,
            invoice.price_list_id.as_ref(),
            first,
        );
        track(
            &mut common.payment_mode_id,
            &mut checks.payment_mode_diff,
            invoice.payment_mode_id.as_ref(),
            first,
        );
        track(
            &mut common.payment_condition_id,
            &mut checks.payment_condition_diff,
            invoice.payment_condition_id.as_ref(),
            first,
        );
        track(
            &mut common.trading_name_id,
            &mut checks.trading_name_diff,
            invoice.trading_name_id.as_ref(),
            first,
        );
        track(
            &mut common.supplier_invoice_nb,
            &mut checks.supplier_invoice_nb_diff,
            invoice.supplier_invoice_nb.as_ref(),
            first,
        );
        track(
            &mut common.origin_date,
            &mut checks.origin_date_diff,
            invoice.origin_date.as_ref(),
            first,
        );

        if self.config.supplychain {
            track(
                &mut common.sale_order_id,
                &mut checks.sale_order_diff,
                invoice.sale_order_id.as_ref(),
                first,
            );
            track(
                &mut common.purchase_order_id,
                &mut checks.purchase_order_diff,
                invoice.purchase_order_id.as_ref(),
                first,
            );
        }

        if self.config.business_project {
            track(
                &mut common.project_id,
                &mut checks.project_diff,
                invoice.project_id.as_ref(),
                first,
            );
        }
    }

    /// 列出阻止合併的欄位（已由使用者指定值的可選欄位除外）
    pub fn conflicts(
        &self,
        result: &InvoiceMergingResult,
        overrides: &MergeOverrides,
    ) -> Vec<MergeConflict> {
        let checks = &result.checks;
        let mut conflicts = Vec::new();

        let blocking = [
            (checks.operation_type_diff, MergeConflict::OperationType),
            (checks.company_diff, MergeConflict::Company),
            (checks.currency_diff, MergeConflict::Currency),
            (checks.partner_diff, MergeConflict::Partner),
            (checks.trading_name_diff, MergeConflict::TradingName),
            (
                self.config.business_project && checks.project_diff,
                MergeConflict::Project,
            ),
        ];
        conflicts.extend(blocking.iter().filter(|(diff, _)| *diff).map(|(_, c)| *c));

        let choosable = [
            (
                checks.contact_partner_diff,
                overrides.contact_partner_id.is_some(),
                MergeConflict::ContactPartner,
            ),
            (
                checks.price_list_diff,
                overrides.price_list_id.is_some(),
                MergeConflict::PriceList,
            ),
            (
                checks.payment_mode_diff,
                overrides.payment_mode_id.is_some(),
                MergeConflict::PaymentMode,
            ),
            (
                checks.payment_condition_diff,
                overrides.payment_condition_id.is_some(),
                MergeConflict::PaymentCondition,
            ),
        ];
        conflicts.extend(
            choosable
                .iter()
                .filter(|(diff, chosen, _)| *diff && !*chosen)
                .map(|(_, _, c)| *c),
        );

        conflicts
    }

    /// 合併草稿發票
    pub fn merge(
        &self,
        invoices: &[Invoice],
        overrides: &MergeOverrides,
    ) -> erp_core::Result<MergedInvoice> {
        tracing::info!("開始合併 {} 張發票", invoices.len());

        let result = self.collect(invoices)?;
        let conflicts = self.conflicts(&result, overrides);
        if !conflicts.is_empty() {
            tracing::warn!("發票合併失敗，衝突欄位 {} 個", conflicts.len());
            return Err(ErpError::InvoiceMergeConflicts(conflicts));
        }

        let merged = self.generate_merged_invoice(invoices, &result, overrides)?;
        tracing::info!(
            "發票合併完成：{} 張發票，{} 筆明細",
            merged.merged_from.len(),
            merged.invoice.lines.len()
        );

        Ok(merged)
    }

    fn generate_merged_invoice(
        &self,
        invoices: &[Invoice],
        result: &InvoiceMergingResult,
        overrides: &MergeOverrides,
    ) -> erp_core::Result<MergedInvoice> {
        let common = &result.common;
        let operation_type = match common.operation_type {
            Some(
                op @ (InvoiceOperationType::SupplierPurchase | InvoiceOperationType::ClientSale),
            ) => op,
            Some(other) => return Err(ErpError::UnsupportedInvoiceType(other.to_string())),
            None => {
                return Err(ErpError::InvoiceMergeConflicts(vec![MergeConflict::OperationType]))
            }
        };
        let (Some(company_id), Some(currency), Some(partner_id)) = (
            common.company_id.clone(),
            common.currency.clone(),
            common.partner_id.clone(),
        ) else {
            return Err(ErpError::InvoiceMergeConflicts(vec![
                MergeConflict::Company,
                MergeConflict::Currency,
                MergeConflict::Partner,
            ]));
        };

        let mut invoice = Invoice::draft(operation_type, company_id, partner_id, currency);
        invoice.contact_partner_id = overrides
            .contact_partner_id
            .clone()
            .or_else(|| common.contact_partner_id.clone());
        invoice.price_list_id = overrides
            .price_list_id
            .clone()
            .or_else(|| common.price_list_id.clone());
        invoice.payment_mode_id = overrides
            .payment_mode_id
            .clone()
            .or_else(|| common.payment_mode_id.clone());
        invoice.payment_condition_id = overrides
            .payment_condition_id
            .clone()
            .or_else(|| common.payment_condition_id.clone());
        invoice.trading_name_id = common.trading_name_id.clone();
        invoice.project_id = common.project_id.clone();

        match operation_type {
            InvoiceOperationType::SupplierPurchase => {
                invoice.supplier_invoice_nb = common.supplier_invoice_nb.clone();
                invoice.origin_date = common.origin_date;
                invoice.purchase_order_id = common.purchase_order_id.clone();
            }
            _ => {
                invoice.sale_order_id = common.sale_order_id.clone();
            }
        }

        invoice.lines = invoices
            .iter()
            .flat_map(|source| source.lines.iter().cloned())
            .collect();

        Ok(MergedInvoice {
            invoice,
            merged_from: invoices.iter().map(|source| source.id).collect(),
        })
    }
}
