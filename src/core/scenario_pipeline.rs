use crate::config::toml_config::ScenarioConfig;
use crate::core::positions::aggregate_by_position;
use crate::core::redistribution::calculate_redistribution;
use crate::core::rounding::smart_round_rows;
use crate::domain::hierarchy::CostCategoryTree;
use crate::domain::model::{
    BoqItem, CategorySelector, ClientPosition, RedistributionOutcome, SourceRule, TargetCost,
};
use crate::domain::ports::{Pipeline, RedistributionReport, Storage};
use crate::domain::snapshot::SavedRedistribution;
use crate::utils::error::{RedistributionError, Result};
use crate::utils::validation::validate_redistribution_rules;
use serde::Serialize;
use std::collections::HashMap;

pub const POSITIONS_CSV: &str = "positions.csv";

/// 從情境設定取出的計算輸入
#[derive(Debug, Clone)]
pub struct Scenario {
    pub items: Vec<BoqItem>,
    pub rules: Vec<SourceRule>,
    pub targets: Vec<TargetCost>,
    pub positions: Vec<ClientPosition>,
    pub hierarchy: CostCategoryTree,
}

#[derive(Debug, Serialize)]
struct ItemCsvRecord<'a> {
    boq_item_id: &'a str,
    client_position_id: &'a str,
    detail_cost_category_id: &'a str,
    original_work_cost: f64,
    deducted_amount: f64,
    added_amount: f64,
    final_work_cost: f64,
}

#[derive(Debug, Serialize)]
struct PositionCsvRecord<'a> {
    position_id: &'a str,
    position_number: &'a str,
    work_name: &'a str,
    quantity: f64,
    total_work_before: f64,
    total_work_after: f64,
    material_unit_price: f64,
    work_unit_price_after: f64,
    rounded_material_unit_price: f64,
    rounded_work_unit_price: f64,
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| RedistributionError::ProcessingError {
            message: format!("Failed to flush CSV output: {}", e),
        })?;
    String::from_utf8(bytes).map_err(|e| RedistributionError::ProcessingError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}

pub struct ScenarioPipeline<S: Storage> {
    storage: S,
    config: ScenarioConfig,
}

impl<S: Storage> ScenarioPipeline<S> {
    pub fn new(storage: S, config: ScenarioConfig) -> Self {
        Self { storage, config }
    }

    fn items_csv(&self, items: &[BoqItem], outcome: &RedistributionOutcome) -> Result<String> {
        let items_by_id: HashMap<&str, &BoqItem> =
            items.iter().map(|i| (i.id.as_str(), i)).collect();

        let mut writer = csv::Writer::from_writer(Vec::new());
        for result in &outcome.results {
            let item = items_by_id.get(result.boq_item_id.as_str());
            writer.serialize(ItemCsvRecord {
                boq_item_id: &result.boq_item_id,
                client_position_id: item.map(|i| i.client_position_id.as_str()).unwrap_or(""),
                detail_cost_category_id: item
                    .and_then(|i| i.detail_cost_category_id.as_deref())
                    .unwrap_or(""),
                original_work_cost: result.original_work_cost,
                deducted_amount: result.deducted_amount,
                added_amount: result.added_amount,
                final_work_cost: result.final_work_cost,
            })?;
        }
        finish_csv(writer)
    }

    fn positions_csv(&self, scenario: &Scenario, outcome: &RedistributionOutcome) -> Result<String> {
        let rows = aggregate_by_position(&scenario.items, &outcome.results, &scenario.positions);
        let rounded = if self.config.rounding_enabled() {
            Some(smart_round_rows(&rows, self.config.rounding_step()))
        } else {
            None
        };

        let mut writer = csv::Writer::from_writer(Vec::new());
        for (index, row) in rows.iter().enumerate() {
            let (material, work) = match &rounded {
                Some(rounded) => (
                    rounded[index].rounded_material_unit_price,
                    rounded[index].rounded_work_unit_price,
                ),
                None => (row.material_unit_price, row.work_unit_price_after),
            };
            writer.serialize(PositionCsvRecord {
                position_id: &row.position_id,
                position_number: row.position_number.as_deref().unwrap_or(""),
                work_name: &row.work_name,
                quantity: row.quantity,
                total_work_before: row.total_work_before,
                total_work_after: row.total_work_after,
                material_unit_price: row.material_unit_price,
                work_unit_price_after: row.work_unit_price_after,
                rounded_material_unit_price: material,
                rounded_work_unit_price: work,
            })?;
        }
        finish_csv(writer)
    }
}

impl<S: Storage> Pipeline for ScenarioPipeline<S> {
    type Input = Scenario;

    fn extract(&self) -> Result<Scenario> {
        let hierarchy = self.config.hierarchy();
        let category_rules = self
            .config
            .deductions
            .iter()
            .map(|r| &r.selector)
            .chain(self.config.targets.iter().map(|t| &t.selector))
            .any(|s| matches!(s, CategorySelector::Category { .. }));
        if category_rules && hierarchy.is_empty() {
            tracing::warn!(
                "Category-level rules present but no detail categories defined; they will match nothing"
            );
        }

        tracing::debug!(
            "Scenario '{}': {} item(s) ({} work), {} rule(s), {} target(s)",
            self.config.scenario.name,
            self.config.items.len(),
            self.config
                .items
                .iter()
                .filter(|i| i.boq_item_type.is_work())
                .count(),
            self.config.deductions.len(),
            self.config.targets.len()
        );

        Ok(Scenario {
            items: self.config.items.clone(),
            rules: self.config.deductions.clone(),
            targets: self.config.targets.clone(),
            positions: self.config.positions.clone(),
            hierarchy,
        })
    }

    fn transform(&self, scenario: Scenario) -> Result<RedistributionReport> {
        validate_redistribution_rules(&scenario.rules, &scenario.targets).into_result()?;

        let outcome = calculate_redistribution(
            &scenario.items,
            &scenario.rules,
            &scenario.targets,
            &scenario.hierarchy,
        );

        let csv_output = self.items_csv(&scenario.items, &outcome)?;
        let positions_csv = if scenario.positions.is_empty() {
            None
        } else {
            Some(self.positions_csv(&scenario, &outcome)?)
        };

        let rules = scenario
            .rules
            .into_iter()
            .map(|mut rule| {
                if rule.category_name.is_empty() {
                    if let Some(name) = scenario.hierarchy.display_name(&rule.selector) {
                        rule.category_name = name;
                    }
                }
                rule
            })
            .collect();
        let targets = scenario
            .targets
            .into_iter()
            .map(|mut target| {
                if target.category_name.is_empty() {
                    if let Some(name) = scenario.hierarchy.display_name(&target.selector) {
                        target.category_name = name;
                    }
                }
                target
            })
            .collect();

        let snapshot = SavedRedistribution::new(
            self.config.scenario.tender_id.clone(),
            self.config.scenario.markup_tactic_id.clone(),
            rules,
            targets,
            outcome.results.clone(),
        );

        Ok(RedistributionReport {
            snapshot,
            outcome,
            csv_output,
            positions_csv,
        })
    }

    fn load(&self, report: RedistributionReport) -> Result<String> {
        let mut written = Vec::new();

        if self.config.wants_format("csv") {
            let filename = self.config.csv_filename();
            self.storage
                .write_file(filename, report.csv_output.as_bytes())?;
            written.push(filename.to_string());

            if let Some(positions) = &report.positions_csv {
                self.storage.write_file(POSITIONS_CSV, positions.as_bytes())?;
                written.push(POSITIONS_CSV.to_string());
            }
        }

        if self.config.wants_format("json") {
            let key = report.snapshot.storage_key();
            self.storage
                .write_file(&key, report.snapshot.to_json()?.as_bytes())?;
            written.push(key);
        }

        if !report.outcome.is_balanced {
            tracing::warn!(
                "Saved an unbalanced redistribution ({:.2} not reassigned)",
                report.outcome.imbalance()
            );
        }

        Ok(written.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStorage {
        files: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl Storage for MemoryStorage {
        fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.files.borrow().get(path).cloned().ok_or_else(|| {
                RedistributionError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    path.to_string(),
                ))
            })
        }

        fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .borrow_mut()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    const SCENARIO: &str = r#"
[scenario]
name = "unit"
tender_id = "t1"
markup_tactic_id = "m1"

[output]
path = "."
formats = ["csv", "json"]

[[categories]]
id = "C1"
name = "Concrete"

[[detail_categories]]
id = "D1"
cost_category_id = "C1"
name = "Foundations"

[[positions]]
id = "p1"
quantity = 2

[[items]]
id = "a"
client_position_id = "p1"
detail_cost_category_id = "D1"
boq_item_type = "work"
total_commercial_work_cost = 100

[[items]]
id = "b"
client_position_id = "p1"
detail_cost_category_id = "D2"
boq_item_type = "work"
total_commercial_work_cost = 300

[[deductions]]
level = "detail"
detail_cost_category_id = "D1"
percentage = 10

[[targets]]
level = "detail"
detail_cost_category_id = "D2"
"#;

    fn pipeline(content: &str) -> ScenarioPipeline<MemoryStorage> {
        let config = ScenarioConfig::from_toml_str(content).unwrap();
        ScenarioPipeline::new(MemoryStorage::default(), config)
    }

    #[test]
    fn test_transform_fills_display_names() {
        let pipeline = pipeline(SCENARIO);
        let scenario = pipeline.extract().unwrap();
        let report = pipeline.transform(scenario).unwrap();

        assert!(report.outcome.is_balanced);
        assert_eq!(
            report.snapshot.redistribution_rules.deductions[0].category_name,
            "Concrete / Foundations"
        );
        assert!(report.csv_output.starts_with("boq_item_id,client_position_id"));
        assert!(report.positions_csv.is_some());
    }

    #[test]
    fn test_transform_rejects_invalid_rules() {
        let content = SCENARIO.replace("percentage = 10", "percentage = 0");
        let pipeline = pipeline(&content);
        let scenario = pipeline.extract().unwrap();

        let err = pipeline.transform(scenario).unwrap_err();
        assert!(matches!(err, RedistributionError::RuleValidationError { .. }));
    }

    #[test]
    fn test_load_writes_every_format() {
        let pipeline = pipeline(SCENARIO);
        let report = pipeline.transform(pipeline.extract().unwrap()).unwrap();
        let written = pipeline.load(report).unwrap();

        assert_eq!(
            written,
            "redistribution.csv, positions.csv, redistribution_t1_m1.json"
        );
        let json = pipeline
            .storage
            .read_file("redistribution_t1_m1.json")
            .unwrap();
        let saved = SavedRedistribution::from_json(std::str::from_utf8(&json).unwrap()).unwrap();
        assert_eq!(saved.results.len(), 2);
    }
}
