use crate::domain::model::{RedistributionResult, SourceRule, TargetCost};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedistributionRules {
    pub deductions: Vec<SourceRule>,
    pub targets: Vec<TargetCost>,
}

/// 儲存的重新分配設定與結果，以標案與加價策略 id 為鍵
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRedistribution {
    pub tender_id: String,
    pub markup_tactic_id: String,
    pub redistribution_rules: RedistributionRules,
    pub results: Vec<RedistributionResult>,
    pub created_at: DateTime<Utc>,
}

impl SavedRedistribution {
    pub fn new(
        tender_id: impl Into<String>,
        markup_tactic_id: impl Into<String>,
        deductions: Vec<SourceRule>,
        targets: Vec<TargetCost>,
        results: Vec<RedistributionResult>,
    ) -> Self {
        Self {
            tender_id: tender_id.into(),
            markup_tactic_id: markup_tactic_id.into(),
            redistribution_rules: RedistributionRules {
                deductions,
                targets,
            },
            results,
            created_at: Utc::now(),
        }
    }

    /// 儲存時使用的檔名
    pub fn storage_key(&self) -> String {
        format!(
            "redistribution_{}_{}.json",
            self.tender_id, self.markup_tactic_id
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
