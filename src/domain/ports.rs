use crate::domain::model::RedistributionOutcome;
use crate::domain::snapshot::SavedRedistribution;
use crate::utils::error::Result;
use std::collections::{BTreeMap, HashMap};

/// 細項類別 → 上層類別的唯讀查詢
pub trait CategoryHierarchy {
    fn parent_of(&self, detail_cost_category_id: &str) -> Option<&str>;
}

impl CategoryHierarchy for HashMap<String, String> {
    fn parent_of(&self, detail_cost_category_id: &str) -> Option<&str> {
        self.get(detail_cost_category_id).map(String::as_str)
    }
}

impl CategoryHierarchy for BTreeMap<String, String> {
    fn parent_of(&self, detail_cost_category_id: &str) -> Option<&str> {
        self.get(detail_cost_category_id).map(String::as_str)
    }
}

impl<H: CategoryHierarchy + ?Sized> CategoryHierarchy for &H {
    fn parent_of(&self, detail_cost_category_id: &str) -> Option<&str> {
        (**self).parent_of(detail_cost_category_id)
    }
}

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

/// 一次重新分配的完整產出，交給 load 階段寫出
#[derive(Debug, Clone)]
pub struct RedistributionReport {
    pub snapshot: SavedRedistribution,
    pub outcome: RedistributionOutcome,
    pub csv_output: String,
    /// 有項次資料時才會產生
    pub positions_csv: Option<String>,
}

pub trait Pipeline {
    type Input;

    fn extract(&self) -> Result<Self::Input>;
    fn transform(&self, input: Self::Input) -> Result<RedistributionReport>;
    fn load(&self, report: RedistributionReport) -> Result<String>;
}
