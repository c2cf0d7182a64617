// perch_sim/src/error.rs

use std::path::PathBuf;

use perch_core::error::FilterError;
use thiserror::Error;

/// Everything that can stop a simulation run.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("scenario file not found: {0}")]
    MissingScenario(PathBuf),

    #[error("failed to load scenario: {0}")]
    Config(#[from] figment::Error),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("filter rejected configuration: {0}")]
    Filter(#[from] FilterError),

    #[error("failed to serialize scenario: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to walk scenario directory: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
