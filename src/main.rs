//! Vanguard - entry point
//!
//! Loads the experiment configuration, runs every trial and emits the JSON
//! summary.

use std::path::PathBuf;

use clap::Parser;

use vanguard::core::config::SimConfig;
use vanguard::report::SummaryReporter;
use vanguard::simulation::Experiment;

/// Event-driven simulation of leadership emergence in collective movement
#[derive(Parser, Debug)]
#[command(name = "vanguard")]
#[command(about = "Simulate leadership emergence in collective movement")]
struct Args {
    /// Path to a TOML config file; built-in defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured number of trials
    #[arg(long)]
    trials: Option<usize>,

    /// Write the JSON summary to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(error) = run(Args::parse()) {
        tracing::error!("{error}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> vanguard::core::error::Result<()> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(trials) = args.trials {
        config.trial_count = trials;
    }
    config.validate()?;

    let mut experiment = Experiment::new(config)?;
    let mut reporter = SummaryReporter::new();
    experiment.run(&mut reporter)?;

    if let Some(summary) = reporter.final_summary() {
        let json = serde_json::to_string_pretty(summary)?;
        match &args.output {
            Some(path) => std::fs::write(path, json)?,
            None => println!("{json}"),
        }
    }
    Ok(())
}
