//! tabtrain - Main Entry Point
//!
//! Trains a model on one dataset, evaluates it on another, reports metrics.

use clap::Parser;
use tabtrain::cli::Cli;
use tabtrain::experiment::Experiment;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabtrain=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let experiment = Experiment::new(cli.into_config())?;
    let result = experiment.run()?;

    if !result.advisories.is_empty() {
        println!();
        println!(
            "  Run completed with {} advisory(ies).",
            result.advisories.len()
        );
    }

    Ok(())
}
