// perch_core/src/error.rs

use thiserror::Error;

/// Every way a filtering call can fail.
///
/// Individual bad readings are never an error: the consensus estimator treats
/// them as outliers. Only whole-input degeneracy is reported here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// The reading window was empty, or held no finite reading to build a pose from.
    #[error("insufficient data: {0}")]
    InsufficientData(&'static str),

    /// The attitude quaternion could not be normalized.
    #[error("invalid orientation: quaternion norm {norm} cannot be normalized")]
    InvalidOrientation { norm: f64 },

    /// A configuration value is outside its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, FilterError>;
