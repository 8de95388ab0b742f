use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use telesim_config::TelesimConfig;
use telesim_engine::SimulationRuntime;
use telesim_telemetry::EventLogger;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Simulate every enabled sensor of the configured fleet
    Run(RunArgs),
    /// Load and validate a configuration, then exit
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// YAML file to load instead of the `config/` directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Stop after this many seconds (runs until Ctrl-C otherwise)
    #[arg(short, long)]
    pub duration_secs: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<TelesimConfig> {
    let config = match path {
        Some(path) => TelesimConfig::load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => TelesimConfig::load().context("loading configuration")?,
    };
    Ok(config)
}

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let runtime = SimulationRuntime::load(args.config.as_deref())
        .context("starting simulation runtime")?;
    let telemetry = &runtime.config().telemetry;
    EventLogger::init(&telemetry.log_level, telemetry.json_logs);
    info!(sensors = runtime.sensors().len(), "configuration loaded");
    let summary = runtime
        .run(args.duration_secs.map(Duration::from_secs))
        .await?;

    info!(
        sensors_started = summary.sensors_started,
        events_processed = summary.events_processed,
        readings_persisted = summary.readings_persisted,
        "simulation finished"
    );
    println!("{}", runtime.metrics.gather_metrics()?);
    Ok(())
}

pub fn check(args: CheckArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let enabled = config.enabled_sensors().count();
    println!(
        "configuration ok: {} sensors ({} enabled), event bus capacity {}",
        config.fleet.len(),
        enabled,
        config.simulator.event_bus_capacity
    );
    Ok(())
}
