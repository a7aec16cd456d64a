//! 未分配追蹤號的庫存數量

use erp_core::{LocationSnapshot, TrackedLine};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 庫位中尚未分配追蹤號的數量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UntrackedQty {
    pub location_id: String,
    pub product_id: String,
    pub current_qty: Decimal,
    pub future_qty: Decimal,

    /// 現有數量扣除追蹤號明細後的剩餘
    pub qty_left: Decimal,
}

/// 列出物料在各庫位尚未分配追蹤號的數量（只回傳剩餘大於零者）
pub fn untracked_quantities(
    product_id: &str,
    lines: &[LocationSnapshot],
    tracked_lines: &[TrackedLine],
) -> Vec<UntrackedQty> {
    let mut tracked_by_location: HashMap<&str, Decimal> = HashMap::new();
    for tracked in tracked_lines.iter().filter(|t| t.product_id == product_id) {
        *tracked_by_location
            .entry(tracked.details_location_id.as_str())
            .or_default() += tracked.current_qty;
    }

    lines
        .iter()
        .filter(|line| line.product_id == product_id)
        .filter_map(|line| {
            let tracked = tracked_by_location
                .get(line.location_id.as_str())
                .copied()
                .unwrap_or_default();
            let qty_left = line.current_qty - tracked;
            (qty_left > Decimal::ZERO).then(|| UntrackedQty {
                location_id: line.location_id.clone(),
                product_id: line.product_id.clone(),
                current_qty: line.current_qty,
                future_qty: line.future_qty,
                qty_left,
            })
        })
        .collect()
}
