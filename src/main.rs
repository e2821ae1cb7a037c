use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use planweave::cli::{Cli, Commands};
use planweave::dispatch::EchoGateway;
use planweave::llm::LlmSynthesizer;
use planweave::{EngineConfig, PlanEngine, RawPlan};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Validate { plan_file } => {
            let raw = load_plan(&plan_file)?;
            let plan = planweave::plan::validate(raw)?;
            println!("plan ok: {} steps", plan.len());
            println!("order: {}", plan.execution_order.join(" -> "));
        }
        Commands::Run { plan_file } => {
            let raw = load_plan(&plan_file)?;
            let mut engine = PlanEngine::new(Arc::new(EchoGateway), &config);
            if config.synthesis.enabled && config.planner.api_key().is_some() {
                engine = engine.with_synthesizer(Arc::new(LlmSynthesizer::new(&config.planner)));
            }
            let report = engine.run(raw).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn load_plan(path: &Path) -> Result<RawPlan> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read plan file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse plan file: {}", path.display()))
}
