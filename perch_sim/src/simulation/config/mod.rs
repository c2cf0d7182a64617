// perch_sim/src/simulation/config/mod.rs

//! This module handles loading and validating scenario configuration from disk,
//! including discovery of every scenario under a directory.

mod catalog;

pub mod structs;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;
use tracing::info;

use crate::error::{Result, SimError};

// Re-export public types
pub use catalog::discover_scenarios;
pub use structs::{AttitudeNoise, CameraNoise, MarkerConfig, Pose, ScenarioConfig, Simulation};

/// Environment variables with this prefix override scenario values.
/// Nested keys are separated by `__`, e.g. `PERCH_CONSENSUS__POSITION_TOLERANCE=0.1`.
pub const ENV_PREFIX: &str = "PERCH_";

/// Top-level scenario keys an environment variable may override.
/// Other `PERCH_` variables are left alone.
const SCENARIO_KEYS: [&str; 7] = [
    "name",
    "simulation",
    "marker",
    "camera",
    "attitude",
    "consensus",
    "fusion",
];

/// `PERCH_`-prefixed environment variables that name a scenario key.
fn env_overrides() -> Env {
    Env::prefixed(ENV_PREFIX).split("__").filter(|key| {
        let head = key
            .as_str()
            .split('.')
            .next()
            .and_then(|k| k.split("__").next())
            .unwrap_or_default();
        SCENARIO_KEYS
            .iter()
            .any(|known| head.eq_ignore_ascii_case(known))
    })
}

/// Loads a scenario file, applies environment overrides, and validates the result.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig> {
    if !path.is_file() {
        return Err(SimError::MissingScenario(path.to_path_buf()));
    }
    info!("Loading scenario from: {:?}", path);

    let figment = Figment::new()
        .merge(Toml::file(path))
        .merge(env_overrides());
    let mut config = extract_scenario(figment)?;

    // Fall back to the file stem so every summary line is labeled.
    if config.name.is_empty() {
        config.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(config)
}

/// Parses a scenario from TOML text, without environment overrides.
pub fn scenario_from_str(toml: &str) -> Result<ScenarioConfig> {
    extract_scenario(Figment::from(Toml::string(toml)))
}

fn extract_scenario(figment: Figment) -> Result<ScenarioConfig> {
    let config: ScenarioConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}
