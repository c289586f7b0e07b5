use clap::Parser;
use cost_redistribution::core::Pipeline;
use cost_redistribution::utils::{logger, validation::Validate};
use cost_redistribution::{
    CliConfig, LocalStorage, RedistributionError, RedistributionRunner, ScenarioConfig,
    ScenarioPipeline,
};

fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting cost redistribution");
    tracing::info!("📁 Loading scenario from: {}", args.scenario);

    let mut config = match ScenarioConfig::from_file(&args.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load scenario '{}': {}", args.scenario, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 套用命令列覆蓋設定
    if let Some(output_path) = &args.output_path {
        config.output.path = output_path.clone();
        tracing::info!("🔧 Output path overridden to: {}", output_path);
    }
    if args.no_rounding {
        config.rounding.enabled = Some(false);
        tracing::info!("🔧 Unit price rounding disabled");
    }

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    display_summary(&config, args.dry_run);

    let storage = LocalStorage::new(config.output_path());
    tracing::debug!("Output directory: {}", storage.base_path().display());
    let runner = RedistributionRunner::new(ScenarioPipeline::new(storage, config));

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        let pipeline = runner.pipeline();
        match pipeline.extract().and_then(|scenario| pipeline.transform(scenario)) {
            Ok(report) => {
                println!("🔍 Dry run result:");
                println!("  Deducted: {:.2}", report.outcome.total_deducted);
                println!("  Added:    {:.2}", report.outcome.total_added);
                println!("  Balanced: {}", report.outcome.is_balanced);
            }
            Err(e) => exit_with(&e),
        }
        return Ok(());
    }

    match runner.run() {
        Ok(output) => {
            println!("✅ Redistribution completed successfully!");
            println!("📁 Written: {}", output);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

fn exit_with(e: &RedistributionError) -> ! {
    tracing::error!(
        "❌ Redistribution failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

fn display_summary(config: &ScenarioConfig, dry_run: bool) {
    println!("📋 Scenario Summary:");
    println!("  Name: {}", config.scenario.name);
    println!(
        "  Tender: {} / Markup tactic: {}",
        config.scenario.tender_id, config.scenario.markup_tactic_id
    );
    println!(
        "  Items: {}, Deductions: {}, Targets: {}",
        config.items.len(),
        config.deductions.len(),
        config.targets.len()
    );
    if config.rounding_enabled() {
        println!("  Rounding step: {}", config.rounding_step());
    } else {
        println!("  Rounding: disabled");
    }
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output.formats.join(", "));

    if dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
