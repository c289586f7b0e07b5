use crate::core::rounding::ROUNDING_STEP;
use crate::domain::hierarchy::{CostCategory, CostCategoryTree, DetailCostCategory};
use crate::domain::model::{BoqItem, ClientPosition, SourceRule, TargetCost};
use crate::utils::error::{RedistributionError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SUPPORTED_FORMATS: [&str; 2] = ["csv", "json"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub scenario: ScenarioInfo,
    #[serde(default)]
    pub rounding: RoundingConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub categories: Vec<CostCategory>,
    #[serde(default)]
    pub detail_categories: Vec<DetailCostCategory>,
    #[serde(default)]
    pub positions: Vec<ClientPosition>,
    #[serde(default)]
    pub items: Vec<BoqItem>,
    #[serde(default)]
    pub deductions: Vec<SourceRule>,
    #[serde(default)]
    pub targets: Vec<TargetCost>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInfo {
    pub name: String,
    pub tender_id: String,
    pub markup_tactic_id: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundingConfig {
    pub enabled: Option<bool>,
    pub step: Option<f64>,
}

impl Default for RoundingConfig {
    fn default() -> Self {
        Self {
            enabled: Some(true),
            step: Some(ROUNDING_STEP),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<String>,
    pub csv_filename: Option<String>,
}

impl ScenarioConfig {
    /// 從 TOML 檔案載入情境
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析情境
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RedistributionError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OUTPUT_DIR})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RedistributionError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("scenario.name", &self.scenario.name)?;
        validation::validate_non_empty_string("scenario.tender_id", &self.scenario.tender_id)?;
        validation::validate_non_empty_string(
            "scenario.markup_tactic_id",
            &self.scenario.markup_tactic_id,
        )?;

        validation::validate_path("output.path", &self.output.path)?;

        if self.output.formats.is_empty() {
            return Err(RedistributionError::MissingConfigError {
                field: "output.formats".to_string(),
            });
        }
        for format in &self.output.formats {
            if !SUPPORTED_FORMATS.contains(&format.as_str()) {
                return Err(RedistributionError::InvalidConfigValueError {
                    field: "output.formats".to_string(),
                    value: format.clone(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        SUPPORTED_FORMATS.join(", ")
                    ),
                });
            }
        }

        if let Some(step) = self.rounding.step {
            validation::validate_range("rounding.step", step, 0.01, 1_000_000.0)?;
        }

        for (index, item) in self.items.iter().enumerate() {
            validation::validate_non_empty_string(&format!("items[{}].id", index), &item.id)?;
            if item.total_commercial_work_cost < 0.0 || item.total_commercial_material_cost < 0.0
            {
                return Err(RedistributionError::InvalidConfigValueError {
                    field: format!("items[{}]", index),
                    value: item.id.clone(),
                    reason: "Commercial costs cannot be negative".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn output_path(&self) -> &str {
        &self.output.path
    }

    pub fn wants_format(&self, format: &str) -> bool {
        self.output.formats.iter().any(|f| f == format)
    }

    pub fn csv_filename(&self) -> &str {
        self.output
            .csv_filename
            .as_deref()
            .unwrap_or("redistribution.csv")
    }

    pub fn rounding_enabled(&self) -> bool {
        self.rounding.enabled.unwrap_or(true)
    }

    pub fn rounding_step(&self) -> f64 {
        self.rounding.step.unwrap_or(ROUNDING_STEP)
    }

    pub fn hierarchy(&self) -> CostCategoryTree {
        CostCategoryTree::from_records(self.categories.clone(), self.detail_categories.clone())
    }
}

impl Validate for ScenarioConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
