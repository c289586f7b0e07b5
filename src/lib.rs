pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::ScenarioConfig};

pub use core::{
    redistribution::calculate_redistribution,
    rounding::{compensate_error, round_to_step, smart_round_positions, smart_round_results},
    runner::RedistributionRunner,
    scenario_pipeline::ScenarioPipeline,
};
pub use domain::model::{
    BoqItem, BoqItemType, CategorySelector, RedistributionOutcome, RedistributionResult,
    SourceRule, TargetCost,
};
pub use domain::ports::CategoryHierarchy;
pub use utils::error::{RedistributionError, Result};
pub use utils::validation::{validate_redistribution_rules, ValidationError, ValidationReport};
