//! 庫存規則解析：取最近祖先庫位上的規則

use erp_core::{AncestorChain, ErpError, LocationTree, RuleType, StockRule, UseCase};

/// 規則存放區（直接查詢路徑）
pub trait RuleStore: Sync {
    /// 查詢某物料在某庫位的規則
    ///
    /// `rule_type` 為 None 時不以類型過濾。
    fn find_rule(
        &self,
        product_id: &str,
        location_id: &str,
        use_case: UseCase,
        rule_type: Option<RuleType>,
    ) -> Option<StockRule>;
}

/// 庫位層級服務
pub trait LocationHierarchy: Sync {
    /// 取得庫位的祖先鏈（包含自己，最近者在前）
    fn ancestor_chain(&self, location_id: &str) -> erp_core::Result<AncestorChain>;
}

impl LocationHierarchy for LocationTree {
    fn ancestor_chain(&self, location_id: &str) -> erp_core::Result<AncestorChain> {
        LocationTree::ancestor_chain(self, location_id)
    }
}

/// 記憶體內的規則存放區
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleStore {
    rules: Vec<StockRule>,
}

impl InMemoryRuleStore {
    pub fn new(rules: Vec<StockRule>) -> Self {
        Self { rules }
    }

    pub fn insert(&mut self, rule: StockRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[StockRule] {
        &self.rules
    }
}

impl RuleStore for InMemoryRuleStore {
    fn find_rule(
        &self,
        product_id: &str,
        location_id: &str,
        use_case: UseCase,
        rule_type: Option<RuleType>,
    ) -> Option<StockRule> {
        self.rules
            .iter()
            .find(|rule| {
                rule.product_id == product_id
                    && rule.location_id == location_id
                    && rule.use_case == use_case
                    && rule_type.map_or(true, |t| rule.rule_type == t)
            })
            .cloned()
    }
}

/// 規則解析器
#[derive(Clone, Copy, Default)]
pub struct RuleResolver<'a> {
    store: Option<&'a dyn RuleStore>,
    hierarchy: Option<&'a dyn LocationHierarchy>,
}

impl<'a> RuleResolver<'a> {
    /// 創建不含存放區與層級服務的解析器（只能解析候選清單）
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置規則存放區
    pub fn with_store(mut self, store: &'a dyn RuleStore) -> Self {
        self.store = Some(store);
        self
    }

    /// 建構器模式：設置庫位層級服務
    pub fn with_hierarchy(mut self, hierarchy: &'a dyn LocationHierarchy) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    /// 解析適用規則
    ///
    /// `candidates` 為 None 時逐一查詢祖先鏈上的庫位；否則在候選清單中
    /// 取庫位最接近的規則。`chain` 為 None 時向層級服務取得祖先鏈。
    pub fn resolve(
        &self,
        candidates: Option<&[StockRule]>,
        product_id: &str,
        location_id: &str,
        chain: Option<&AncestorChain>,
        rule_type: RuleType,
        use_case: UseCase,
    ) -> erp_core::Result<Option<StockRule>> {
        let fetched;
        let chain = match chain {
            Some(chain) => chain,
            None => {
                let hierarchy = self
                    .hierarchy
                    .ok_or_else(|| ErpError::MissingAncestorChain(location_id.to_string()))?;
                fetched = hierarchy.ancestor_chain(location_id)?;
                &fetched
            }
        };

        match candidates {
            Some(candidates) => Ok(Self::closest_candidate(
                candidates, product_id, chain, rule_type,
            )
            .cloned()),
            None => self.lookup_along_chain(product_id, chain, rule_type, use_case),
        }
    }

    /// 沿祖先鏈向外逐一查詢存放區，回傳第一筆命中
    pub fn lookup_along_chain(
        &self,
        product_id: &str,
        chain: &AncestorChain,
        rule_type: RuleType,
        use_case: UseCase,
    ) -> erp_core::Result<Option<StockRule>> {
        let store = self.store.ok_or(ErpError::MissingRuleStore)?;
        let type_filter = match use_case {
            UseCase::StockControl => Some(rule_type),
            UseCase::ReplenishmentPlanning => None,
        };

        for location_id in chain.iter() {
            if let Some(rule) = store.find_rule(product_id, location_id, use_case, type_filter) {
                tracing::debug!("物料 {} 於庫位 {} 找到規則 {}", product_id, location_id, rule.id);
                return Ok(Some(rule));
            }
        }

        Ok(None)
    }

    /// 在候選清單中取庫位最接近的規則
    ///
    /// 只考慮物料與類型相符、且庫位位於祖先鏈上的規則；
    /// 位於受評估庫位本身的規則會立即回傳。
    pub fn closest_candidate<'r>(
        candidates: &'r [StockRule],
        product_id: &str,
        chain: &AncestorChain,
        rule_type: RuleType,
    ) -> Option<&'r StockRule> {
        let mut best: Option<(&StockRule, usize)> = None;

        for rule in candidates.iter().filter(|r| r.matches(product_id, rule_type)) {
            let Some(distance) = chain.position(&rule.location_id) else {
                continue;
            };
            if distance == 1 {
                return Some(rule);
            }
            if best.map_or(true, |(_, closest)| distance < closest) {
                best = Some((rule, distance));
            }
        }

        best.map(|(rule, _)| rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erp_core::StockLocation;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn chain(ids: &[&str]) -> AncestorChain {
        AncestorChain::new(ids.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn control_rule(location: &str, rule_type: RuleType) -> StockRule {
        StockRule::new("BOLT-M8", location, UseCase::StockControl, rule_type, dec!(10))
    }

    #[test]
    fn test_candidates_prefer_closest_ancestor() {
        let rule_b = control_rule("B", RuleType::Current);
        let rule_c = control_rule("C", RuleType::Current);
        let candidates = vec![rule_c.clone(), rule_b.clone()];

        let resolved = RuleResolver::new()
            .resolve(
                Some(&candidates),
                "BOLT-M8",
                "A",
                Some(&chain(&["A", "B", "C"])),
                RuleType::Current,
                UseCase::StockControl,
            )
            .unwrap();

        assert_eq!(resolved, Some(rule_b));
    }

    #[test]
    fn test_candidate_at_origin_short_circuits() {
        let rule_a = control_rule("A", RuleType::Current);
        let candidates = vec![control_rule("C", RuleType::Current), rule_a.clone()];

        let resolved = RuleResolver::closest_candidate(
            &candidates,
            "BOLT-M8",
            &chain(&["A", "B", "C"]),
            RuleType::Current,
        );

        assert_eq!(resolved, Some(&rule_a));
    }

    #[test]
    fn test_candidates_filtered_by_product_type_and_chain() {
        let candidates = vec![
            control_rule("B", RuleType::Future),
            StockRule::new("NUT-M8", "B", UseCase::StockControl, RuleType::Current, dec!(1)),
            control_rule("ELSEWHERE", RuleType::Current),
        ];

        let resolved = RuleResolver::closest_candidate(
            &candidates,
            "BOLT-M8",
            &chain(&["A", "B"]),
            RuleType::Current,
        );

        assert!(resolved.is_none());
    }

    #[test]
    fn test_empty_candidates_yield_none() {
        let resolved = RuleResolver::new()
            .resolve(
                Some(&[]),
                "BOLT-M8",
                "A",
                Some(&chain(&["A"])),
                RuleType::Current,
                UseCase::StockControl,
            )
            .unwrap();

        assert!(resolved.is_none());
    }

    #[test]
    fn test_store_lookup_walks_chain_outward() {
        let store = InMemoryRuleStore::new(vec![
            control_rule("C", RuleType::Current),
            control_rule("B", RuleType::Future),
        ]);
        let resolver = RuleResolver::new().with_store(&store);

        let current = resolver
            .resolve(
                None,
                "BOLT-M8",
                "A",
                Some(&chain(&["A", "B", "C"])),
                RuleType::Current,
                UseCase::StockControl,
            )
            .unwrap()
            .unwrap();
        assert_eq!(current.location_id, "C");

        let future = resolver
            .resolve(
                None,
                "BOLT-M8",
                "A",
                Some(&chain(&["A", "B", "C"])),
                RuleType::Future,
                UseCase::StockControl,
            )
            .unwrap()
            .unwrap();
        assert_eq!(future.location_id, "B");
    }

    #[test]
    fn test_store_lookup_for_planning_ignores_rule_type() {
        let store = InMemoryRuleStore::new(vec![StockRule::new(
            "BOLT-M8",
            "B",
            UseCase::ReplenishmentPlanning,
            RuleType::Future,
            dec!(10),
        )]);

        let resolved = RuleResolver::new()
            .with_store(&store)
            .resolve(
                None,
                "BOLT-M8",
                "A",
                Some(&chain(&["A", "B"])),
                RuleType::Current,
                UseCase::ReplenishmentPlanning,
            )
            .unwrap();

        assert_eq!(resolved.map(|r| r.location_id), Some("B".to_string()));
    }

    #[test]
    fn test_chain_from_hierarchy() {
        let tree = LocationTree::new(vec![
            StockLocation::new("WH"),
            StockLocation::new("WH-A").with_parent("WH"),
        ]);
        let store = InMemoryRuleStore::new(vec![control_rule("WH", RuleType::Current)]);
        let resolver = RuleResolver::new().with_store(&store).with_hierarchy(&tree);

        let resolved = resolver
            .resolve(None, "BOLT-M8", "WH-A", None, RuleType::Current, UseCase::StockControl)
            .unwrap();

        assert_eq!(resolved.map(|r| r.location_id), Some("WH".to_string()));
    }

    #[test]
    fn test_missing_chain_and_store() {
        let resolver = RuleResolver::new();

        let result =
            resolver.resolve(None, "BOLT-M8", "A", None, RuleType::Current, UseCase::StockControl);
        assert!(matches!(result, Err(ErpError::MissingAncestorChain(_))));

        let result = resolver.resolve(
            None,
            "BOLT-M8",
            "A",
            Some(&chain(&["A"])),
            RuleType::Current,
            UseCase::StockControl,
        );
        assert!(matches!(result, Err(ErpError::MissingRuleStore)));
    }

    proptest! {
        /// 每個庫位至多一條規則時，解析結果為鏈上索引最小者
        #[test]
        fn prop_resolves_smallest_chain_index(
            len in 1usize..12,
            mask in proptest::collection::vec(any::<bool>(), 12),
            shuffle_seed in any::<u64>(),
        ) {
            let ids: Vec<String> = (0..len).map(|i| format!("L{i}")).collect();
            let chain = AncestorChain::new(ids.clone()).unwrap();

            let mut candidates: Vec<StockRule> = ids
                .iter()
                .zip(mask.iter())
                .filter(|(_, has_rule)| **has_rule)
                .map(|(id, _)| control_rule(id, RuleType::Current))
                .collect();
            let rotation = if candidates.is_empty() {
                0
            } else {
                (shuffle_seed as usize) % candidates.len()
            };
            candidates.rotate_left(rotation);

            let expected = ids
                .iter()
                .zip(mask.iter())
                .position(|(_, has_rule)| *has_rule)
                .map(|index| ids[index].clone());

            let resolver = RuleResolver::new();
            let resolve = || {
                resolver
                    .resolve(
                        Some(&candidates),
                        "BOLT-M8",
                        &ids[0],
                        Some(&chain),
                        RuleType::Current,
                        UseCase::StockControl,
                    )
                    .unwrap()
            };
            let first = resolve();
            let second = resolve();

            prop_assert_eq!(first.as_ref().map(|r| r.location_id.clone()), expected);
            prop_assert_eq!(&first, &second);

            // 直接查詢路徑結果一致
            let store = InMemoryRuleStore::new(candidates.clone());
            let via_store = RuleResolver::new()
                .with_store(&store)
                .lookup_along_chain("BOLT-M8", &chain, RuleType::Current, UseCase::StockControl)
                .unwrap();
            prop_assert_eq!(
                via_store.map(|r| r.location_id),
                first.map(|r| r.location_id)
            );
        }
    }
}
