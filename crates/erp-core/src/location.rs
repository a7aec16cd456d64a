//! 庫位層級模型

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::{ErpError, Result};

/// 庫位類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationType {
    /// 內部庫位
    Internal,
    /// 外部庫位（客戶/供應商）
    External,
    /// 虛擬庫位
    Virtual,
}

/// 庫位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLocation {
    /// 庫位ID
    pub id: String,

    /// 上層庫位
    pub parent_id: Option<String>,

    /// 庫位類型
    pub location_type: LocationType,

    /// 彙總時包含缺貨明細（現有與預計皆為零）
    pub include_out_of_stock: bool,

    /// 彙總時包含虛擬子庫位
    pub include_virtual_sub_location: bool,
}

impl StockLocation {
    /// 創建新的內部庫位
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            location_type: LocationType::Internal,
            include_out_of_stock: false,
            include_virtual_sub_location: false,
        }
    }

    /// 建構器模式：設置上層庫位
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// 建構器模式：設置庫位類型
    pub fn with_type(mut self, location_type: LocationType) -> Self {
        self.location_type = location_type;
        self
    }

    /// 建構器模式：彙總時包含缺貨明細
    pub fn with_include_out_of_stock(mut self, include: bool) -> Self {
        self.include_out_of_stock = include;
        self
    }

    /// 建構器模式：彙總時包含虛擬子庫位
    pub fn with_include_virtual_sub_location(mut self, include: bool) -> Self {
        self.include_virtual_sub_location = include;
        self
    }

    pub fn is_virtual(&self) -> bool {
        self.location_type == LocationType::Virtual
    }
}

/// 祖先鏈：由受評估庫位向外到根庫位，最近者在前
///
/// 受評估庫位本身位於位置 1，同一庫位在鏈中只會出現一次。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AncestorChain {
    ids: Vec<String>,
}

impl AncestorChain {
    /// 由最近到最遠的庫位ID建立祖先鏈
    pub fn new(ids: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id.as_str()) {
                return Err(ErpError::DuplicateChainLocation(id.clone()));
            }
        }
        Ok(Self { ids })
    }

    /// 庫位在鏈中的位置（從 1 起算）
    pub fn position(&self, location_id: &str) -> Option<usize> {
        self.ids
            .iter()
            .position(|id| id == location_id)
            .map(|index| index + 1)
    }

    pub fn contains(&self, location_id: &str) -> bool {
        self.position(location_id).is_some()
    }

    /// 受評估的庫位
    pub fn origin(&self) -> Option<&str> {
        self.ids.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl TryFrom<Vec<String>> for AncestorChain {
    type Error = ErpError;

    fn try_from(ids: Vec<String>) -> Result<Self> {
        Self::new(ids)
    }
}

impl From<AncestorChain> for Vec<String> {
    fn from(chain: AncestorChain) -> Self {
        chain.ids
    }
}

/// 記憶體內的庫位樹
#[derive(Debug, Clone, Default)]
pub struct LocationTree {
    locations: HashMap<String, StockLocation>,
    children: HashMap<String, Vec<String>>,
}

impl LocationTree {
    /// 由庫位清單建立庫位樹
    pub fn new(locations: Vec<StockLocation>) -> Self {
        let mut tree = Self::default();
        for location in locations {
            tree.insert(location);
        }
        tree
    }

    /// 新增庫位（同ID覆蓋）
    pub fn insert(&mut self, location: StockLocation) {
        if let Some(previous) = self.locations.get(&location.id) {
            if let Some(parent) = &previous.parent_id {
                if let Some(siblings) = self.children.get_mut(parent) {
                    siblings.retain(|id| id != &location.id);
                }
            }
        }
        if let Some(parent) = &location.parent_id {
            self.children
                .entry(parent.clone())
                .or_default()
                .push(location.id.clone());
        }
        self.locations.insert(location.id.clone(), location);
    }

    pub fn get(&self, location_id: &str) -> Option<&StockLocation> {
        self.locations.get(location_id)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// 取得庫位本身及所有上層庫位，最近者在前
    pub fn ancestor_chain(&self, location_id: &str) -> Result<AncestorChain> {
        let mut ids = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(location_id.to_string());

        while let Some(id) = current {
            let location = self
                .locations
                .get(&id)
                .ok_or_else(|| ErpError::LocationNotFound(id.clone()))?;
            if !visited.insert(id.clone()) {
                return Err(ErpError::LocationCycle(id));
            }
            current = location.parent_id.clone();
            ids.push(id);
        }

        AncestorChain::new(ids)
    }

    /// 取得庫位本身及所有（遞迴）包含的子庫位
    pub fn contained_ids(&self, location_id: &str) -> Result<Vec<String>> {
        if !self.locations.contains_key(location_id) {
            return Err(ErpError::LocationNotFound(location_id.to_string()));
        }

        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![location_id.to_string()];

        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                return Err(ErpError::LocationCycle(id));
            }
            if let Some(children) = self.children.get(&id) {
                stack.extend(children.iter().rev().cloned());
            }
            result.push(id);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> LocationTree {
        LocationTree::new(vec![
            StockLocation::new("WH"),
            StockLocation::new("WH-A").with_parent("WH"),
            StockLocation::new("WH-A-1").with_parent("WH-A"),
            StockLocation::new("WH-A-2")
                .with_parent("WH-A")
                .with_type(LocationType::Virtual),
            StockLocation::new("WH-B").with_parent("WH"),
        ])
    }

    #[test]
    fn test_chain_rejects_duplicates() {
        let result = AncestorChain::new(vec!["A".into(), "B".into(), "A".into()]);
        assert!(matches!(result, Err(ErpError::DuplicateChainLocation(id)) if id == "A"));
    }

    #[test]
    fn test_chain_position_is_one_based() {
        let chain = AncestorChain::new(vec!["A".into(), "B".into(), "C".into()]).unwrap();

        assert_eq!(chain.origin(), Some("A"));
        assert_eq!(chain.position("A"), Some(1));
        assert_eq!(chain.position("C"), Some(3));
        assert_eq!(chain.position("Z"), None);
    }

    #[test]
    fn test_ancestor_chain_closest_first() {
        let tree = sample_tree();
        let chain = tree.ancestor_chain("WH-A-1").unwrap();

        assert_eq!(chain.iter().collect::<Vec<_>>(), vec!["WH-A-1", "WH-A", "WH"]);
    }

    #[test]
    fn test_contained_ids() {
        let tree = sample_tree();

        let mut ids = tree.contained_ids("WH-A").unwrap();
        ids.sort();
        assert_eq!(ids, vec!["WH-A", "WH-A-1", "WH-A-2"]);

        assert_eq!(tree.contained_ids("WH-B").unwrap(), vec!["WH-B"]);
    }

    #[test]
    fn test_unknown_location() {
        let tree = sample_tree();
        assert!(matches!(
            tree.ancestor_chain("NOPE"),
            Err(ErpError::LocationNotFound(_))
        ));
        assert!(matches!(
            tree.contained_ids("NOPE"),
            Err(ErpError::LocationNotFound(_))
        ));
    }

    #[test]
    fn test_parent_cycle_detected() {
        let tree = LocationTree::new(vec![
            StockLocation::new("X").with_parent("Y"),
            StockLocation::new("Y").with_parent("X"),
        ]);

        assert!(matches!(tree.ancestor_chain("X"), Err(ErpError::LocationCycle(_))));
        assert!(matches!(tree.contained_ids("X"), Err(ErpError::LocationCycle(_))));
    }

    #[test]
    fn test_chain_deserialize_validates() {
        let chain: AncestorChain = serde_json::from_str(r#"["A","B"]"#).unwrap();
        assert_eq!(chain.len(), 2);

        let result: std::result::Result<AncestorChain, _> = serde_json::from_str(r#"["A","A"]"#);
        assert!(result.is_err());
    }
}
