// perch_sim/src/main.rs

//! Runs one or more scenarios through the consensus estimator and the
//! orientation corrector and logs an error summary for each.
//!
//! `cargo run -p perch_sim -- --scenario-dir assets/scenarios`

use clap::Parser;
use tracing_subscriber::EnvFilter;

use perch_sim::cli::Cli;
use perch_sim::error::Result;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("perch_sim=info,perch_core=info")),
        )
        .init();

    let cli = Cli::parse();
    let summaries = perch_sim::run(&cli)?;

    let failures: usize = summaries.iter().map(|s| s.failures).sum();
    tracing::info!(
        "Finished {} scenario(s), {} failed window(s)",
        summaries.len(),
        failures
    );
    Ok(())
}
