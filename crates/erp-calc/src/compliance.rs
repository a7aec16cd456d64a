//! 庫存合規檢查批次

use chrono::NaiveDateTime;
use erp_core::{
    ComplianceBatchConfig, LocationSnapshot, LocationTree, RuleType, StockMoveRecord, UseCase,
};
use rayon::prelude::*;
use std::collections::HashSet;

use crate::aggregation::StockAggregator;
use crate::planner::QuantityPlanner;
use crate::resolver::{RuleResolver, RuleStore};
use crate::{ComplianceAnomaly, ComplianceReport, ComplianceViolation};

/// 選取待檢查的庫位明細
///
/// 條件：該庫位有同物料的已實現出庫異動；增量執行時異動須晚於水位；
/// 指定規則時只保留規則涉及的物料。
pub fn select_lines_to_check(
    lines: &[LocationSnapshot],
    moves: &[StockMoveRecord],
    config: &ComplianceBatchConfig,
) -> erp_core::Result<Vec<LocationSnapshot>> {
    config.validate()?;

    let watermark = config.watermark();
    let rule_products: HashSet<&str> = config
        .used_rules
        .iter()
        .map(|rule| rule.product_id.as_str())
        .collect();

    let moved: HashSet<(&str, &str)> = moves
        .iter()
        .filter(|m| m.is_realized())
        .filter(|m| match watermark {
            Some(watermark) => m.delivered_at.map_or(false, |at| at > watermark),
            None => true,
        })
        .map(|m| (m.from_location_id.as_str(), m.product_id.as_str()))
        .collect();

    Ok(lines
        .iter()
        .filter(|line| {
            rule_products.is_empty() || rule_products.contains(line.product_id.as_str())
        })
        .filter(|line| moved.contains(&(line.location_id.as_str(), line.product_id.as_str())))
        .cloned()
        .collect())
}

/// 庫存合規檢查批次
pub struct ComplianceBatch<'a> {
    config: &'a ComplianceBatchConfig,
    tree: &'a LocationTree,
    store: &'a dyn RuleStore,
    stock_lines: &'a [LocationSnapshot],
}

impl<'a> ComplianceBatch<'a> {
    /// 創建批次
    ///
    /// `stock_lines` 為彙總用的完整庫存快照。
    pub fn new(
        config: &'a ComplianceBatchConfig,
        tree: &'a LocationTree,
        store: &'a dyn RuleStore,
        stock_lines: &'a [LocationSnapshot],
    ) -> Self {
        Self {
            config,
            tree,
            store,
            stock_lines,
        }
    }

    /// 執行檢查
    ///
    /// 回傳報告中的 `next_watermark` 即 `started_at`，由呼叫端保存供下次增量執行。
    /// 配置不合法時不處理任何明細。
    pub fn run(
        &self,
        lines: &[LocationSnapshot],
        started_at: NaiveDateTime,
    ) -> erp_core::Result<ComplianceReport> {
        self.config.validate()?;

        tracing::info!(
            "開始庫存合規檢查：{} 筆明細，指定規則 {} 條",
            lines.len(),
            self.config.used_rules.len()
        );

        let start_time = std::time::Instant::now();
        let mut report = ComplianceReport::empty(started_at);

        for (page, chunk) in lines.chunks(self.config.fetch_limit).enumerate() {
            tracing::debug!("處理第 {} 頁，{} 筆明細", page + 1, chunk.len());

            let outcomes: Vec<erp_core::Result<Vec<ComplianceViolation>>> =
                if self.config.parallel {
                    chunk.par_iter().map(|line| self.check_line(line)).collect()
                } else {
                    chunk.iter().map(|line| self.check_line(line)).collect()
                };

            for (line, outcome) in chunk.iter().zip(outcomes) {
                match outcome {
                    Ok(violations) => {
                        report.done += 1;
                        report.violations.extend(violations);
                    }
                    Err(err) => {
                        tracing::warn!(
                            "庫位 {} 物料 {} 檢查失敗: {}",
                            line.location_id,
                            line.product_id,
                            err
                        );
                        report.add_anomaly(ComplianceAnomaly {
                            location_id: line.location_id.clone(),
                            product_id: line.product_id.clone(),
                            message: err.to_string(),
                        });
                    }
                }
            }
        }

        report.elapsed_ms = Some(start_time.elapsed().as_millis());
        tracing::info!(
            "庫存合規檢查完成：成功 {}，異常 {}，違規 {}",
            report.done,
            report.anomaly,
            report.violations.len()
        );

        Ok(report)
    }

    /// 檢查單一明細的現有與預計數量
    ///
    /// 任一類型失敗時整筆明細視為異常，不回傳部分結果。
    /// 僅對違規的規則計算訂購量。
    pub fn check_line(
        &self,
        line: &LocationSnapshot,
    ) -> erp_core::Result<Vec<ComplianceViolation>> {
        let resolver = RuleResolver::new()
            .with_store(self.store)
            .with_hierarchy(self.tree);
        let aggregator = StockAggregator::new(self.tree);
        let chain = self.tree.ancestor_chain(&line.location_id)?;
        let candidates = if self.config.used_rules.is_empty() {
            None
        } else {
            Some(self.config.used_rules.as_slice())
        };

        let mut violations = Vec::new();
        for rule_type in RuleType::ALL {
            let Some(rule) = resolver.resolve(
                candidates,
                &line.product_id,
                &line.location_id,
                Some(&chain),
                rule_type,
                UseCase::StockControl,
            )?
            else {
                continue;
            };

            // 以規則所在庫位（含子庫位）彙總
            let aggregate =
                aggregator.aggregate(&rule.location_id, &line.product_id, self.stock_lines)?;
            if !QuantityPlanner::is_non_compliant(&aggregate, &rule, rule_type) {
                continue;
            }

            let qty_to_order = QuantityPlanner::quantity_to_order(
                line,
                rule_type,
                &rule,
                self.config.min_reorder_qty,
            )?;
            tracing::debug!(
                "庫位 {} 物料 {} 違反規則 {}（{:?}）",
                line.location_id,
                line.product_id,
                rule.id,
                rule_type
            );
            violations.push(ComplianceViolation {
                location_id: line.location_id.clone(),
                product_id: line.product_id.clone(),
                rule_id: rule.id,
                rule_location_id: rule.location_id.clone(),
                rule_type,
                aggregate_qty: aggregate.qty(rule_type),
                min_qty: rule.min_qty,
                qty_to_order,
            });
        }

        Ok(violations)
    }
}
