//! 庫位及其子庫位的數量彙總

use erp_core::{AggregateQty, LocationSnapshot, LocationTree};
use std::collections::HashSet;

/// 數量彙總器
pub struct StockAggregator<'a> {
    tree: &'a LocationTree,
}

impl<'a> StockAggregator<'a> {
    pub fn new(tree: &'a LocationTree) -> Self {
        Self { tree }
    }

    /// 彙總物料在庫位及其所有子庫位的現有/預計數量
    pub fn aggregate(
        &self,
        location_id: &str,
        product_id: &str,
        lines: &[LocationSnapshot],
    ) -> erp_core::Result<AggregateQty> {
        let contributing = self.contributing_lines(location_id, product_id, lines)?;

        let mut total = AggregateQty::default();
        for line in &contributing {
            total.add(line);
        }

        tracing::debug!(
            "庫位 {} 物料 {} 彙總：現有 {}，預計 {}（{} 筆明細）",
            location_id,
            product_id,
            total.current_qty,
            total.future_qty,
            contributing.len()
        );

        Ok(total)
    }

    /// 計入彙總的明細
    ///
    /// 過濾條件：
    /// - 庫位未勾選「包含缺貨」時，忽略現有與預計皆為零的明細
    /// - 虛擬子庫位只在目標庫位勾選「包含虛擬子庫位」時計入
    pub fn contributing_lines<'l>(
        &self,
        location_id: &str,
        product_id: &str,
        lines: &'l [LocationSnapshot],
    ) -> erp_core::Result<Vec<&'l LocationSnapshot>> {
        let target = self
            .tree
            .get(location_id)
            .ok_or_else(|| erp_core::ErpError::LocationNotFound(location_id.to_string()))?;

        let contained: HashSet<String> = self
            .tree
            .contained_ids(location_id)?
            .into_iter()
            .filter(|id| {
                id == location_id
                    || target.include_virtual_sub_location
                    || self.tree.get(id).map_or(false, |loc| !loc.is_virtual())
            })
            .collect();

        Ok(lines
            .iter()
            .filter(|line| line.product_id == product_id && contained.contains(&line.location_id))
            .filter(|line| {
                let include_out_of_stock = self
                    .tree
                    .get(&line.location_id)
                    .map_or(false, |loc| loc.include_out_of_stock);
                include_out_of_stock || !line.is_out_of_stock()
            })
            .collect())
    }
}
