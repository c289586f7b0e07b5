use crate::domain::model::CategorySelector;
use crate::domain::ports::CategoryHierarchy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailCostCategory {
    pub id: String,
    pub cost_category_id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// 由類別表與細項類別表建立的兩層類別樹
#[derive(Debug, Clone, Default)]
pub struct CostCategoryTree {
    categories: HashMap<String, CostCategory>,
    details: HashMap<String, DetailCostCategory>,
}

impl CostCategoryTree {
    pub fn from_records(categories: Vec<CostCategory>, details: Vec<DetailCostCategory>) -> Self {
        let categories: HashMap<String, CostCategory> =
            categories.into_iter().map(|c| (c.id.clone(), c)).collect();

        let mut detail_map = HashMap::with_capacity(details.len());
        for detail in details {
            if !categories.contains_key(&detail.cost_category_id) {
                tracing::debug!(
                    "Detail category {} references unknown category {}",
                    detail.id,
                    detail.cost_category_id
                );
            }
            detail_map.insert(detail.id.clone(), detail);
        }

        Self {
            categories,
            details: detail_map,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// 扁平化為 `細項 id → 類別 id` 映射
    pub fn to_detail_map(&self) -> HashMap<String, String> {
        self.details
            .values()
            .map(|d| (d.id.clone(), d.cost_category_id.clone()))
            .collect()
    }

    /// 選擇器的顯示名稱；細項顯示為 `類別 / 細項 (地點)`
    pub fn display_name(&self, selector: &CategorySelector) -> Option<String> {
        match selector {
            CategorySelector::Category { category_id } => {
                self.categories.get(category_id).map(|c| c.name.clone())
            }
            CategorySelector::Detail {
                detail_cost_category_id,
            } => {
                let detail = self.details.get(detail_cost_category_id)?;
                let mut name = match self.categories.get(&detail.cost_category_id) {
                    Some(category) => format!("{} / {}", category.name, detail.name),
                    None => detail.name.clone(),
                };
                if let Some(location) = detail.location.as_deref().filter(|l| !l.is_empty()) {
                    name.push_str(&format!(" ({})", location));
                }
                Some(name)
            }
        }
    }
}

impl CategoryHierarchy for CostCategoryTree {
    fn parent_of(&self, detail_cost_category_id: &str) -> Option<&str> {
        self.details
            .get(detail_cost_category_id)
            .map(|d| d.cost_category_id.as_str())
    }
}
