use cost_redistribution::domain::snapshot::SavedRedistribution;
use cost_redistribution::utils::validation::Validate;
use cost_redistribution::{
    LocalStorage, RedistributionError, RedistributionRunner, ScenarioConfig, ScenarioPipeline,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn scenario_toml(output_dir: &Path, rounding: bool, formats: &str) -> String {
    format!(
        r#"
[scenario]
name = "Tender 42 markup"
tender_id = "tender-42"
markup_tactic_id = "base"

[rounding]
enabled = {rounding}
step = 5.0

[output]
path = '{path}'
formats = {formats}

[[categories]]
id = "C1"
name = "Earthworks"

[[categories]]
id = "C2"
name = "Concrete"

[[detail_categories]]
id = "D1"
cost_category_id = "C1"
name = "Excavation"
location = "Zone A"

[[detail_categories]]
id = "D2"
cost_category_id = "C2"
name = "Slabs"

[[positions]]
id = "p1"
position_number = "1.1"
work_name = "Excavate and haul"
quantity = 2

[[positions]]
id = "p2"
position_number = "2.1"
work_name = "Cast slab"
quantity = 4

[[items]]
id = "a"
client_position_id = "p1"
detail_cost_category_id = "D1"
boq_item_type = "work"
total_commercial_work_cost = 100.0

[[items]]
id = "b"
client_position_id = "p1"
detail_cost_category_id = "D1"
boq_item_type = "work"
total_commercial_work_cost = 300.0

[[items]]
id = "c"
client_position_id = "p2"
detail_cost_category_id = "D2"
boq_item_type = "work"
total_commercial_work_cost = 500.0
total_commercial_material_cost = 42.0

[[deductions]]
level = "detail"
detail_cost_category_id = "D1"
percentage = 10.0

[[targets]]
level = "category"
category_id = "C2"
"#,
        rounding = rounding,
        path = output_dir.display(),
        formats = formats,
    )
}

fn load_config(dir: &TempDir, rounding: bool, formats: &str) -> anyhow::Result<ScenarioConfig> {
    let scenario_path = dir.path().join("scenario.toml");
    fs::write(
        &scenario_path,
        scenario_toml(&dir.path().join("out"), rounding, formats),
    )?;
    let config = ScenarioConfig::from_file(&scenario_path)?;
    config.validate()?;
    Ok(config)
}

fn run(config: ScenarioConfig) -> anyhow::Result<String> {
    let storage = LocalStorage::new(config.output_path().to_string());
    let runner = RedistributionRunner::new(ScenarioPipeline::new(storage, config));
    Ok(runner.run()?)
}

fn read_csv(path: &Path) -> anyhow::Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

fn column(headers: &[String], name: &str) -> usize {
    headers.iter().position(|h| h == name).unwrap()
}

#[test]
fn test_full_run_writes_every_output() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = load_config(&dir, true, r#"["csv", "json"]"#)?;

    let written = run(config)?;

    assert_eq!(
        written,
        "redistribution.csv, positions.csv, redistribution_tender-42_base.json"
    );
    let out = dir.path().join("out");
    assert!(out.join("redistribution.csv").exists());
    assert!(out.join("positions.csv").exists());
    assert!(out.join("redistribution_tender-42_base.json").exists());
    Ok(())
}

#[test]
fn test_item_csv_contains_final_costs() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    run(load_config(&dir, true, r#"["csv"]"#)?)?;

    let (headers, rows) = read_csv(&dir.path().join("out").join("redistribution.csv"))?;
    assert_eq!(
        headers,
        vec![
            "boq_item_id",
            "client_position_id",
            "detail_cost_category_id",
            "original_work_cost",
            "deducted_amount",
            "added_amount",
            "final_work_cost",
        ]
    );
    assert_eq!(rows.len(), 3);

    let id = column(&headers, "boq_item_id");
    let final_cost = column(&headers, "final_work_cost");
    let finals: Vec<(String, f64)> = rows
        .iter()
        .map(|row| -> anyhow::Result<(String, f64)> {
            Ok((row[id].clone(), row[final_cost].parse::<f64>()?))
        })
        .collect::<anyhow::Result<_>>()?;

    assert_eq!(finals[0].0, "a");
    assert!((finals[0].1 - 90.0).abs() < 1e-9);
    assert!((finals[1].1 - 270.0).abs() < 1e-9);
    assert!((finals[2].1 - 540.0).abs() < 1e-9);

    // 只要求 csv 時不寫 JSON
    assert!(!dir
        .path()
        .join("out")
        .join("redistribution_tender-42_base.json")
        .exists());
    Ok(())
}

#[test]
fn test_positions_csv_has_rounded_unit_prices() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    run(load_config(&dir, true, r#"["csv"]"#)?)?;

    let (headers, rows) = read_csv(&dir.path().join("out").join("positions.csv"))?;
    assert_eq!(rows.len(), 2);

    let position = column(&headers, "position_id");
    let work = column(&headers, "rounded_work_unit_price");
    let material = column(&headers, "rounded_material_unit_price");

    assert_eq!(rows[0][position], "p1");
    // p1: (90 + 270) / 2
    assert_eq!(rows[0][work].parse::<f64>()?, 180.0);
    // p2: 540 / 4
    assert_eq!(rows[1][work].parse::<f64>()?, 135.0);
    // p2: 42 / 4 = 10.5 → 10
    assert_eq!(rows[1][material].parse::<f64>()?, 10.0);
    Ok(())
}

#[test]
fn test_rounding_can_be_disabled() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    run(load_config(&dir, false, r#"["csv"]"#)?)?;

    let (headers, rows) = read_csv(&dir.path().join("out").join("positions.csv"))?;
    let material = column(&headers, "material_unit_price");
    let rounded_material = column(&headers, "rounded_material_unit_price");

    assert_eq!(rows[1][rounded_material].parse::<f64>()?, 10.5);
    assert_eq!(rows[1][material], rows[1][rounded_material]);
    Ok(())
}

#[test]
fn test_snapshot_restores_rules_and_results() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    run(load_config(&dir, true, r#"["json"]"#)?)?;

    let content = fs::read_to_string(
        dir.path()
            .join("out")
            .join("redistribution_tender-42_base.json"),
    )?;
    let saved = SavedRedistribution::from_json(&content)?;

    assert_eq!(saved.tender_id, "tender-42");
    assert_eq!(saved.markup_tactic_id, "base");
    assert_eq!(saved.results.len(), 3);
    assert_eq!(
        saved.redistribution_rules.deductions[0].category_name,
        "Earthworks / Excavation (Zone A)"
    );
    assert_eq!(
        saved.redistribution_rules.targets[0].category_name,
        "Concrete"
    );
    assert!(!dir.path().join("out").join("redistribution.csv").exists());
    Ok(())
}

#[test]
fn test_invalid_rules_abort_before_writing() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let scenario_path = dir.path().join("scenario.toml");
    let content = scenario_toml(&dir.path().join("out"), true, r#"["csv", "json"]"#)
        .replace("percentage = 10.0", "percentage = 120.0");
    fs::write(&scenario_path, content)?;

    let config = ScenarioConfig::from_file(&scenario_path)?;
    let storage = LocalStorage::new(config.output_path().to_string());
    let runner = RedistributionRunner::new(ScenarioPipeline::new(storage, config));

    let err = runner.run().unwrap_err();
    assert!(matches!(err, RedistributionError::RuleValidationError { .. }));
    assert!(!dir.path().join("out").exists());
    Ok(())
}

#[test]
fn test_missing_scenario_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = ScenarioConfig::from_file(dir.path().join("nope.toml")).unwrap_err();

    assert!(matches!(err, RedistributionError::IoError(_)));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_unsupported_format_fails_validation() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let scenario_path = dir.path().join("scenario.toml");
    fs::write(
        &scenario_path,
        scenario_toml(&dir.path().join("out"), true, r#"["xlsx"]"#),
    )?;

    let config = ScenarioConfig::from_file(&scenario_path)?;
    let err = config.validate().unwrap_err();

    assert!(matches!(
        err,
        RedistributionError::InvalidConfigValueError { .. }
    ));
    Ok(())
}
