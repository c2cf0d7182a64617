// perch_sim/src/lib.rs

use std::path::PathBuf;

use tracing::info;

use crate::cli::Cli;
use crate::error::Result;
use crate::simulation::config::{discover_scenarios, load_scenario};
use crate::simulation::core::runner::{ScenarioRunner, ScenarioSummary};

// This prelude is for convenience for other files WITHIN the perch_sim crate.
pub mod prelude;

pub mod cli;
pub mod error;
pub mod simulation;

/// Resolves the scenarios named on the command line and runs each in turn.
pub fn run(cli: &Cli) -> Result<Vec<ScenarioSummary>> {
    let paths: Vec<PathBuf> = match &cli.scenario_dir {
        Some(dir) => discover_scenarios(dir)?,
        None => vec![cli.scenario.clone()],
    };
    info!("Found {} scenario(s)", paths.len());

    let mut summaries = Vec::with_capacity(paths.len());
    for path in &paths {
        let mut config = load_scenario(path)?;
        if let Some(seed) = cli.seed {
            config.simulation.seed = Some(seed);
        }
        if let Some(windows) = cli.windows {
            config.simulation.windows = windows;
        }
        config.validate()?;

        if cli.print_config {
            println!("# {}\n{}", path.display(), toml::to_string_pretty(&config)?);
        }

        let mut runner = ScenarioRunner::new(config)?;
        summaries.push(runner.run());
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn scenario_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../assets/scenarios")
    }

    #[test]
    fn test_runs_every_bundled_scenario() {
        let dir = scenario_dir();
        let cli = Cli::parse_from([
            "perch_sim",
            "--scenario-dir",
            dir.to_str().unwrap(),
            "--seed",
            "3",
            "--windows",
            "5",
        ]);

        let summaries = run(&cli).unwrap();
        assert!(summaries.len() >= 2);
        for summary in &summaries {
            assert_eq!(summary.seed, 3);
            assert_eq!(summary.windows, 5);
            assert!(!summary.name.is_empty());
        }
    }

    #[test]
    fn test_missing_scenario_is_an_error() {
        let cli = Cli::parse_from(["perch_sim", "--scenario", "does/not/exist.toml"]);
        assert!(matches!(
            run(&cli),
            Err(crate::error::SimError::MissingScenario(_))
        ));
    }

    #[test]
    fn test_zero_window_override_is_rejected() {
        let dir = scenario_dir();
        let cli = Cli::parse_from([
            "perch_sim",
            "--scenario",
            dir.join("hover_dock.toml").to_str().unwrap(),
            "--windows",
            "0",
        ]);
        assert!(matches!(
            run(&cli),
            Err(crate::error::SimError::InvalidScenario(_))
        ));
    }
}
