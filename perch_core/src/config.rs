// perch_core/src/config.rs

//! Tunable parameters for both estimators.
//!
//! Every default below is a starting point for a downward camera looking at an
//! AprilTag-sized marker from a few metres up. They are meant to be tuned per
//! vehicle and are not part of the estimators' contracts.

use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};

/// Configuration for the consensus pose estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Readings closer than this to a hypothesis (metres) agree on position.
    /// Default: 0.05
    pub position_tolerance: f64,

    /// Readings whose geodesic angle to a hypothesis is below this (radians)
    /// agree on orientation.
    /// Default: 0.1
    pub orientation_tolerance: f64,

    /// Translational variance reported when every reading is an outlier.
    /// Default: 1.0
    pub base_position_variance: f64,

    /// Rotational variance reported when every reading is an outlier.
    /// Default: 1.0
    pub base_orientation_variance: f64,

    /// Iteration cap for the spherical mean of the inlier orientations.
    /// Default: 16
    pub mean_max_iterations: usize,

    /// The spherical mean stops once its update step is smaller than this (radians).
    /// Default: 1e-12
    pub mean_convergence: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            position_tolerance: 0.05,
            orientation_tolerance: 0.1,
            base_position_variance: 1.0,
            base_orientation_variance: 1.0,
            mean_max_iterations: 16,
            mean_convergence: 1e-12,
        }
    }
}

impl ConsensusConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for the position tolerance.
    pub fn with_position_tolerance(mut self, meters: f64) -> Self {
        self.position_tolerance = meters;
        self
    }

    /// Builder-style setter for the orientation tolerance.
    pub fn with_orientation_tolerance(mut self, radians: f64) -> Self {
        self.orientation_tolerance = radians;
        self
    }

    /// Sets the same base variance on all six axes.
    pub fn with_base_variance(mut self, variance: f64) -> Self {
        self.base_position_variance = variance;
        self.base_orientation_variance = variance;
        self
    }

    pub fn with_base_position_variance(mut self, variance: f64) -> Self {
        self.base_position_variance = variance;
        self
    }

    pub fn with_base_orientation_variance(mut self, variance: f64) -> Self {
        self.base_orientation_variance = variance;
        self
    }

    pub fn with_mean_max_iterations(mut self, iterations: usize) -> Self {
        self.mean_max_iterations = iterations;
        self
    }

    /// Checks every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        positive("position_tolerance", self.position_tolerance)?;
        positive("orientation_tolerance", self.orientation_tolerance)?;
        non_negative("base_position_variance", self.base_position_variance)?;
        non_negative("base_orientation_variance", self.base_orientation_variance)?;
        non_negative("mean_convergence", self.mean_convergence)?;
        if self.mean_max_iterations == 0 {
            return Err(FilterError::InvalidConfig(
                "mean_max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A fixed rotation between two rigidly mounted frames, as roll/pitch/yaw in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MountOffset {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl MountOffset {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    pub fn rotation(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_euler_angles(self.roll, self.pitch, self.yaw)
    }
}

/// Configuration for the orientation fusion corrector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Rotation taking orientations from the attitude source's frame into the
    /// camera frame the vision pose is expressed in.
    /// Default: identity
    pub mount_offset: MountOffset,

    /// Attitude quaternions with a norm at or below this are rejected.
    /// Default: 1e-9
    pub min_quaternion_norm: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            mount_offset: MountOffset::default(),
            min_quaternion_norm: 1e-9,
        }
    }
}

impl FusionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mount_offset(mut self, offset: MountOffset) -> Self {
        self.mount_offset = offset;
        self
    }

    pub fn with_min_quaternion_norm(mut self, norm: f64) -> Self {
        self.min_quaternion_norm = norm;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let MountOffset { roll, pitch, yaw } = self.mount_offset;
        if ![roll, pitch, yaw].iter().all(|a| a.is_finite()) {
            return Err(FilterError::InvalidConfig(format!(
                "mount_offset must be finite, got {:?}",
                self.mount_offset
            )));
        }
        non_negative("min_quaternion_norm", self.min_quaternion_norm)
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FilterError::InvalidConfig(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FilterError::InvalidConfig(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}
