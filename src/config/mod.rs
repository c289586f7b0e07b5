pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "cost-redistribution")]
#[command(about = "Redistribute commercial work cost between BOQ cost categories")]
pub struct CliConfig {
    /// Path to the scenario TOML file
    #[arg(short, long, default_value = "scenario.toml")]
    pub scenario: String,

    /// Override the output directory from the scenario file
    #[arg(long)]
    pub output_path: Option<String>,

    /// Skip unit price rounding regardless of the scenario setting
    #[arg(long)]
    pub no_rounding: bool,

    /// Validate and print a summary without writing any files
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}
