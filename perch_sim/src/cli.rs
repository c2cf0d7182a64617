// perch_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Perch: replay synthetic marker detections through the pose filters.
///
/// Each scenario describes a marker seen by a downward camera, how noisy the
/// detections and the attitude source are, and the filter settings to test.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/hover_dock.toml")]
    pub scenario: PathBuf,

    /// Run every scenario found under this directory instead of `--scenario`.
    #[arg(long)]
    pub scenario_dir: Option<PathBuf>,

    /// Override the PRNG seed of every scenario.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override how many windows each scenario generates.
    #[arg(short, long)]
    pub windows: Option<usize>,

    /// Print each fully resolved scenario as TOML before running it.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["perch_sim"]);
        assert_eq!(
            cli.scenario,
            PathBuf::from("assets/scenarios/hover_dock.toml")
        );
        assert!(cli.scenario_dir.is_none());
        assert!(!cli.print_config);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "perch_sim",
            "--scenario-dir",
            "assets/scenarios",
            "--seed",
            "42",
            "-w",
            "3",
        ]);
        assert_eq!(cli.scenario_dir, Some(PathBuf::from("assets/scenarios")));
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.windows, Some(3));
    }
}
