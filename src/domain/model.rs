use serde::{Deserialize, Serialize};

/// BOQ 項目類型（工作 / 材料 / 分包 / 補償）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoqItemType {
    Work,
    Material,
    SubcontractWork,
    SubcontractMaterial,
    WorkCompensation,
    MaterialCompensation,
}

impl BoqItemType {
    pub fn is_work(&self) -> bool {
        matches!(
            self,
            BoqItemType::Work | BoqItemType::SubcontractWork | BoqItemType::WorkCompensation
        )
    }
}

/// 估價明細（唯讀快照）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoqItem {
    pub id: String,
    pub client_position_id: String,
    #[serde(default)]
    pub detail_cost_category_id: Option<String>,
    pub boq_item_type: BoqItemType,
    #[serde(default)]
    pub total_commercial_work_cost: f64,
    #[serde(default)]
    pub total_commercial_material_cost: f64,
}

/// 規則或目標所指向的成本類別，分為兩種粒度。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum CategorySelector {
    Category { category_id: String },
    Detail { detail_cost_category_id: String },
}

impl CategorySelector {
    pub fn category(id: impl Into<String>) -> Self {
        CategorySelector::Category {
            category_id: id.into(),
        }
    }

    pub fn detail(id: impl Into<String>) -> Self {
        CategorySelector::Detail {
            detail_cost_category_id: id.into(),
        }
    }

    /// 原始 id（未加前綴）
    pub fn id(&self) -> &str {
        match self {
            CategorySelector::Category { category_id } => category_id,
            CategorySelector::Detail {
                detail_cost_category_id,
            } => detail_cost_category_id,
        }
    }

    /// 去重與衝突檢查使用的鍵；類別層級加上 `cat_` 前綴避免與細項 id 碰撞
    pub fn key(&self) -> String {
        match self {
            CategorySelector::Category { category_id } => format!("cat_{}", category_id),
            CategorySelector::Detail {
                detail_cost_category_id,
            } => detail_cost_category_id.clone(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.id().trim().is_empty()
    }
}

/// 扣減規則
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRule {
    #[serde(flatten)]
    pub selector: CategorySelector,
    #[serde(default)]
    pub category_name: String,
    pub percentage: f64,
}

impl SourceRule {
    pub fn new(selector: CategorySelector, percentage: f64) -> Self {
        Self {
            selector,
            category_name: String::new(),
            percentage,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.category_name = name.into();
        self
    }
}

/// 接收重新分配金額的目標類別
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetCost {
    #[serde(flatten)]
    pub selector: CategorySelector,
    #[serde(default)]
    pub category_name: String,
}

impl TargetCost {
    pub fn new(selector: CategorySelector) -> Self {
        Self {
            selector,
            category_name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.category_name = name.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedistributionResult {
    pub boq_item_id: String,
    pub original_work_cost: f64,
    pub deducted_amount: f64,
    pub added_amount: f64,
    pub final_work_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedistributionOutcome {
    pub results: Vec<RedistributionResult>,
    pub total_deducted: f64,
    pub total_added: f64,
    pub is_balanced: bool,
}

impl RedistributionOutcome {
    pub fn imbalance(&self) -> f64 {
        self.total_deducted - self.total_added
    }
}

/// 客戶清單中的一個項次，數量用於換算單價
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPosition {
    pub id: String,
    #[serde(default)]
    pub position_number: Option<String>,
    #[serde(default)]
    pub work_name: String,
    #[serde(default)]
    pub quantity: f64,
}

/// 匯出用的項次單價列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionPriceRow {
    pub position_id: String,
    pub quantity: f64,
    pub material_unit_price: f64,
    pub work_unit_price: f64,
}

/// 重新分配後按項次彙總的結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRedistribution {
    pub position_id: String,
    pub position_number: Option<String>,
    pub work_name: String,
    pub quantity: f64,
    pub total_material: f64,
    pub total_work_before: f64,
    pub total_work_after: f64,
    pub material_unit_price: f64,
    pub work_unit_price_before: f64,
    pub work_unit_price_after: f64,
}

/// 取整後的列：保留原始欄位，並附上 `rounded_*` 單價
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundedRow<R> {
    #[serde(flatten)]
    pub row: R,
    pub rounded_material_unit_price: f64,
    pub rounded_work_unit_price: f64,
}
