use crate::domain::model::{CategorySelector, SourceRule, TargetCost};
use crate::utils::error::{RedistributionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 單一欄位的驗證問題；`field` 採用 `sourceRules[2].percentage` 形式的路徑
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn into_result(self) -> Result<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(RedistributionError::RuleValidationError {
                errors: self.errors,
            })
        }
    }
}

const SOURCE_RULES: &str = "sourceRules";
const TARGET_COSTS: &str = "targetCosts";

/// 收集重複出現的鍵（保持首次出現的順序）
fn duplicate_keys<'a>(selectors: impl Iterator<Item = &'a CategorySelector>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for selector in selectors.filter(|s| !s.is_blank()) {
        let key = selector.key();
        if !seen.insert(key.clone()) && !duplicates.contains(&key) {
            duplicates.push(key);
        }
    }
    duplicates
}

pub fn validate_source_rules(rules: &[SourceRule]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if rules.is_empty() {
        errors.push(ValidationError::new(
            SOURCE_RULES,
            "At least one deduction rule is required",
        ));
        return errors;
    }

    for (index, rule) in rules.iter().enumerate() {
        if rule.selector.is_blank() {
            errors.push(ValidationError::new(
                format!("{}[{}].category", SOURCE_RULES, index),
                "A category or detail category must be selected",
            ));
        }

        // NaN 也視為超出範圍
        if !(rule.percentage > 0.0 && rule.percentage <= 100.0) {
            errors.push(ValidationError::new(
                format!("{}[{}].percentage", SOURCE_RULES, index),
                format!(
                    "Percentage must be greater than 0 and at most 100 (got {})",
                    rule.percentage
                ),
            ));
        }
    }

    let duplicates = duplicate_keys(rules.iter().map(|r| &r.selector));
    if !duplicates.is_empty() {
        errors.push(ValidationError::new(
            SOURCE_RULES,
            format!(
                "Duplicate categories in deduction rules: {}",
                duplicates.join(", ")
            ),
        ));
    }

    errors
}

pub fn validate_target_costs(targets: &[TargetCost]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if targets.is_empty() {
        errors.push(ValidationError::new(
            TARGET_COSTS,
            "At least one target category is required",
        ));
        return errors;
    }

    for (index, target) in targets.iter().enumerate() {
        if target.selector.is_blank() {
            errors.push(ValidationError::new(
                format!("{}[{}].category", TARGET_COSTS, index),
                "A category or detail category must be selected",
            ));
        }
    }

    let duplicates = duplicate_keys(targets.iter().map(|t| &t.selector));
    if !duplicates.is_empty() {
        errors.push(ValidationError::new(
            TARGET_COSTS,
            format!(
                "Duplicate categories in target costs: {}",
                duplicates.join(", ")
            ),
        ));
    }

    errors
}

pub fn validate_no_conflicts(rules: &[SourceRule], targets: &[TargetCost]) -> Vec<ValidationError> {
    let source_keys: HashSet<String> = rules
        .iter()
        .filter(|r| !r.selector.is_blank())
        .map(|r| r.selector.key())
        .collect();

    let mut conflicting: Vec<String> = targets
        .iter()
        .filter(|t| !t.selector.is_blank())
        .map(|t| t.selector.key())
        .filter(|key| source_keys.contains(key))
        .collect();
    let mut seen = HashSet::new();
    conflicting.retain(|key| seen.insert(key.clone()));

    if conflicting.is_empty() {
        return Vec::new();
    }

    vec![ValidationError::new(
        "conflicts",
        format!(
            "Categories cannot be both deduction sources and targets: {}",
            conflicting.join(", ")
        ),
    )]
}

/// 依序執行三項檢查；兩個清單都無誤時才檢查來源與目標的重疊
pub fn validate_redistribution_rules(
    rules: &[SourceRule],
    targets: &[TargetCost],
) -> ValidationReport {
    let mut errors = validate_source_rules(rules);
    errors.extend(validate_target_costs(targets));

    if errors.is_empty() {
        errors.extend(validate_no_conflicts(rules, targets));
    }

    if !errors.is_empty() {
        tracing::debug!("Rule validation found {} problem(s)", errors.len());
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

fn invalid_value(field_name: &str, value: impl ToString, reason: impl Into<String>) -> RedistributionError {
    RedistributionError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// 輸出目錄：不可為空、不可含 NUL
pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid_value(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid_value(field_name, path, "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid_value(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// 閉區間檢查；無法比較的值（NaN）一律視為超出範圍
pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if !(value >= min && value <= max) {
        return Err(invalid_value(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}
