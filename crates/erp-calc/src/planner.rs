//! 補貨數量計算與合規判斷

use erp_core::{AggregateQty, LocationSnapshot, RuleType, StockRule};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 單一規則的評估結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    /// 彙總數量低於最小數量
    pub non_compliant: bool,

    /// 建議訂購量（可能為零或負數，表示不需訂購）
    pub qty_to_order: Decimal,
}

impl RuleEvaluation {
    /// 是否需要下單
    pub fn needs_order(&self) -> bool {
        self.qty_to_order > Decimal::ZERO
    }
}

/// 數量計劃器
pub struct QuantityPlanner;

impl QuantityPlanner {
    /// 檢查庫位（含子庫位）彙總數量是否低於規則最小數量
    pub fn is_non_compliant(
        aggregate: &AggregateQty,
        rule: &StockRule,
        rule_type: RuleType,
    ) -> bool {
        aggregate.qty(rule_type) < rule.min_qty
    }

    /// 計算訂購量
    ///
    /// 以 L 表示庫位剩餘數量、M 表示理想/最小數量、R 表示再訂購量：
    ///
    /// O = max(R, M - L)，若啟用最大數量則 O = min(O, max - L)
    ///
    /// 結果不會截為零，非正值代表不需訂購。
    pub fn quantity_to_order(
        snapshot: &LocationSnapshot,
        rule_type: RuleType,
        rule: &StockRule,
        minimum_reorder_qty: Decimal,
    ) -> erp_core::Result<Decimal> {
        let left_qty = snapshot.qty(rule_type);
        let target_qty = rule.target_qty()?;
        let reorder_qty = minimum_reorder_qty.max(rule.reorder_qty);

        let mut qty_to_order = (target_qty - left_qty).max(reorder_qty);

        // 不超過最大數量
        if let Some(max_qty) = rule.max_qty_limit()? {
            qty_to_order = qty_to_order.min(max_qty - left_qty);
        }

        Ok(qty_to_order)
    }

    /// 計算訂購量（最小再訂購量為零）
    pub fn quantity_to_order_default(
        snapshot: &LocationSnapshot,
        rule_type: RuleType,
        rule: &StockRule,
    ) -> erp_core::Result<Decimal> {
        Self::quantity_to_order(snapshot, rule_type, rule, Decimal::ZERO)
    }

    /// 合規判斷與訂購量一併計算
    pub fn rule_check(
        snapshot: &LocationSnapshot,
        aggregate: &AggregateQty,
        rule: &StockRule,
        rule_type: RuleType,
        minimum_reorder_qty: Decimal,
    ) -> erp_core::Result<RuleEvaluation> {
        Ok(RuleEvaluation {
            non_compliant: Self::is_non_compliant(aggregate, rule, rule_type),
            qty_to_order: Self::quantity_to_order(snapshot, rule_type, rule, minimum_reorder_qty)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erp_core::{ErpError, UseCase};
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn rule(min_qty: Decimal) -> StockRule {
        StockRule::new(
            "BOLT-M8",
            "WH-A",
            UseCase::ReplenishmentPlanning,
            RuleType::Current,
            min_qty,
        )
    }

    fn snapshot(current: Decimal, future: Decimal) -> LocationSnapshot {
        LocationSnapshot::new("WH-A", "BOLT-M8", current, future)
    }

    #[rstest]
    #[case(dec!(5), RuleType::Current, true)]
    #[case(dec!(10), RuleType::Current, false)]
    #[case(dec!(12), RuleType::Current, false)]
    #[case(dec!(12), RuleType::Future, true)]
    fn test_non_compliance(
        #[case] current: Decimal,
        #[case] rule_type: RuleType,
        #[case] expected: bool,
    ) {
        let aggregate = AggregateQty::new(current, dec!(3));
        assert_eq!(
            QuantityPlanner::is_non_compliant(&aggregate, &rule(dec!(10)), rule_type),
            expected
        );
    }

    #[test]
    fn test_ideal_qty_without_max() {
        // M=100, L=30, R=20 -> max(70, 20)
        let rule = rule(dec!(10))
            .with_ideal_qty(dec!(100))
            .with_reorder_qty(dec!(20));

        let qty = QuantityPlanner::quantity_to_order_default(
            &snapshot(dec!(30), dec!(0)),
            RuleType::Current,
            &rule,
        )
        .unwrap();

        assert_eq!(qty, dec!(70));
    }

    #[test]
    fn test_clamped_by_max_qty() {
        // max=50, L=30 -> min(70, 20)
        let rule = rule(dec!(10))
            .with_ideal_qty(dec!(100))
            .with_max_qty(dec!(50))
            .with_reorder_qty(dec!(20));

        let qty = QuantityPlanner::quantity_to_order_default(
            &snapshot(dec!(30), dec!(0)),
            RuleType::Current,
            &rule,
        )
        .unwrap();

        assert_eq!(qty, dec!(20));
    }

    #[test]
    fn test_reorder_qty_floor() {
        // M=10, L=8 -> max(2, 25)
        let rule = rule(dec!(10)).with_reorder_qty(dec!(25));

        let qty = QuantityPlanner::quantity_to_order(
            &snapshot(dec!(8), dec!(0)),
            RuleType::Current,
            &rule,
            dec!(5),
        )
        .unwrap();
        assert_eq!(qty, dec!(25));

        let qty = QuantityPlanner::quantity_to_order(
            &snapshot(dec!(8), dec!(0)),
            RuleType::Current,
            &rule,
            dec!(40),
        )
        .unwrap();
        assert_eq!(qty, dec!(40));
    }

    #[test]
    fn test_uses_future_qty_for_future_rules() {
        let rule = rule(dec!(50));

        let qty = QuantityPlanner::quantity_to_order_default(
            &snapshot(dec!(0), dec!(45)),
            RuleType::Future,
            &rule,
        )
        .unwrap();

        assert_eq!(qty, dec!(5));
    }

    #[test]
    fn test_negative_result_is_not_clamped() {
        // L=80 已超過 max=60
        let rule = rule(dec!(10)).with_max_qty(dec!(60));

        let qty = QuantityPlanner::quantity_to_order_default(
            &snapshot(dec!(80), dec!(0)),
            RuleType::Current,
            &rule,
        )
        .unwrap();

        assert_eq!(qty, dec!(-20));
    }

    #[test]
    fn test_missing_thresholds() {
        let missing_ideal = rule(dec!(10)).with_use_ideal_qty(true);
        let result = QuantityPlanner::quantity_to_order_default(
            &snapshot(dec!(0), dec!(0)),
            RuleType::Current,
            &missing_ideal,
        );
        assert!(matches!(result, Err(ErpError::InvalidRule(_))));

        let missing_max = rule(dec!(10)).with_use_max_qty(true);
        let result = QuantityPlanner::quantity_to_order_default(
            &snapshot(dec!(0), dec!(0)),
            RuleType::Current,
            &missing_max,
        );
        assert!(matches!(result, Err(ErpError::InvalidRule(_))));
    }

    #[test]
    fn test_rule_check() {
        let rule = rule(dec!(10)).with_ideal_qty(dec!(40));

        let evaluation = QuantityPlanner::rule_check(
            &snapshot(dec!(2), dec!(2)),
            &AggregateQty::new(dec!(5), dec!(5)),
            &rule,
            RuleType::Current,
            Decimal::ZERO,
        )
        .unwrap();

        assert!(evaluation.non_compliant);
        assert_eq!(evaluation.qty_to_order, dec!(38));
        assert!(evaluation.needs_order());
    }

    proptest! {
        /// 提高最小再訂購量不會降低訂購量（未啟用最大數量）
        #[test]
        fn prop_min_reorder_is_monotonic(
            left in -1_000i64..1_000,
            min_qty in 0i64..1_000,
            ideal in proptest::option::of(0i64..2_000),
            reorder in 0i64..500,
            low in 0i64..500,
            bump in 0i64..500,
        ) {
            let mut rule = rule(Decimal::from(min_qty)).with_reorder_qty(Decimal::from(reorder));
            if let Some(ideal) = ideal {
                rule = rule.with_ideal_qty(Decimal::from(ideal));
            }
            let snapshot = snapshot(Decimal::from(left), Decimal::ZERO);

            let order = |minimum: i64| {
                QuantityPlanner::quantity_to_order(
                    &snapshot,
                    RuleType::Current,
                    &rule,
                    Decimal::from(minimum),
                )
                .unwrap()
            };
            let base = order(low);
            let raised = order(low + bump);

            prop_assert!(raised >= base);
        }

        /// 最大數量的空間小於需求時，結果等於 max - L
        #[test]
        fn prop_max_clamp_boundary(
            left in -500i64..500,
            min_qty in 0i64..1_000,
            max_qty in 0i64..1_000,
            reorder in 0i64..500,
        ) {
            let rule = rule(Decimal::from(min_qty))
                .with_max_qty(Decimal::from(max_qty))
                .with_reorder_qty(Decimal::from(reorder));
            let snapshot = snapshot(Decimal::from(left), Decimal::ZERO);
            let unclamped = (Decimal::from(min_qty - left)).max(Decimal::from(reorder));
            let headroom = Decimal::from(max_qty - left);

            let qty =
                QuantityPlanner::quantity_to_order_default(&snapshot, RuleType::Current, &rule)
                    .unwrap();

            if headroom < unclamped {
                prop_assert_eq!(qty, headroom);
            } else {
                prop_assert_eq!(qty, unclamped);
            }
        }
    }
}
