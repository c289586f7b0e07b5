pub mod addition;
pub mod deduction;
pub mod positions;
pub mod redistribution;
pub mod resolver;
pub mod rounding;
pub mod runner;
pub mod scenario_pipeline;

pub use crate::domain::model::{
    BoqItem, CategorySelector, RedistributionOutcome, RedistributionResult, SourceRule, TargetCost,
};
pub use crate::domain::ports::{CategoryHierarchy, Pipeline, Storage};
pub use crate::utils::error::Result;
