// perch_sim/src/simulation/config/structs.rs

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use perch_core::config::{ConsensusConfig, FusionConfig};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::simulation::utils::serde_helpers;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # ScenarioConfig
/// The root of the data parsed from a `scenario.toml` file: the ground truth,
/// the noise models for both sources, and the filter settings under test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Human-readable label used in the run summary.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub simulation: Simulation,

    #[serde(default)]
    pub marker: MarkerConfig,

    #[serde(default)]
    pub camera: CameraNoise,

    #[serde(default)]
    pub attitude: AttitudeNoise,

    #[serde(default)]
    pub consensus: ConsensusConfig,

    #[serde(default)]
    pub fusion: FusionConfig,
}

impl ScenarioConfig {
    /// Checks the noise models and both filter configurations.
    pub fn validate(&self) -> Result<()> {
        self.consensus.validate()?;
        self.fusion.validate()?;

        if self.simulation.windows == 0 || self.simulation.window_size == 0 {
            return Err(SimError::InvalidScenario(
                "simulation.windows and simulation.window_size must be at least 1".to_string(),
            ));
        }
        if self.camera.outliers_per_window > self.simulation.window_size {
            return Err(SimError::InvalidScenario(format!(
                "camera.outliers_per_window ({}) exceeds simulation.window_size ({})",
                self.camera.outliers_per_window, self.simulation.window_size
            )));
        }
        if !(self.simulation.rate_hz.is_finite() && self.simulation.rate_hz > 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "simulation.rate_hz must be positive, got {}",
                self.simulation.rate_hz
            )));
        }
        if !(0.0..1.0).contains(&self.attitude.norm_drift) {
            return Err(SimError::InvalidScenario(format!(
                "attitude.norm_drift must be in [0, 1), got {}",
                self.attitude.norm_drift
            )));
        }
        Ok(())
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the sections in a scenario.toml file.
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Simulation {
    /// Optional seed for the pseudo-random number generator for determinism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// How many reading windows to generate and filter.
    pub windows: usize,
    /// Readings per window.
    pub window_size: usize,
    /// Camera detection rate, used to stamp readings.
    pub rate_hz: f64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            seed: None,
            windows: 100,
            window_size: 10,
            rate_hz: 30.0,
        }
    }
}

/// The ground truth: where the marker really is, seen from the camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MarkerConfig {
    /// Fiducial tag id.
    pub id: u32,
    pub pose_in_camera: Pose,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            id: 0,
            pose_in_camera: Pose {
                translation: Vector3::new(0.0, 0.0, 2.0),
                rotation: UnitQuaternion::identity(),
            },
        }
    }
}

/// Noise model for marker detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CameraNoise {
    /// Per-axis translation noise standard deviation (metres).
    pub position_stddev: f64,
    /// Per-axis rotation noise standard deviation (degrees).
    pub orientation_stddev_deg: f64,
    /// How many readings in each window are corrupted.
    pub outliers_per_window: usize,
    /// Minimum displacement of a corrupted reading from the truth (metres).
    pub outlier_offset: f64,
}

impl Default for CameraNoise {
    fn default() -> Self {
        Self {
            position_stddev: 0.005,
            orientation_stddev_deg: 2.0,
            outliers_per_window: 2,
            outlier_offset: 0.5,
        }
    }
}

/// Noise model for the inertial attitude source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AttitudeNoise {
    /// Per-axis rotation noise standard deviation (degrees).
    pub orientation_stddev_deg: f64,
    /// Reported quaternions are scaled by a factor drawn from `[1 - drift, 1 + drift]`.
    pub norm_drift: f64,
}

impl Default for AttitudeNoise {
    fn default() -> Self {
        Self {
            orientation_stddev_deg: 0.3,
            norm_drift: 0.01,
        }
    }
}

// =========================================================================
// == Helper Structs for Nested Configuration ==
// =========================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// [x, y, z] in metres.
    #[serde(with = "serde_helpers::vec3_from_array", default)]
    pub translation: Vector3<f64>,

    /// [roll, pitch, yaw] in degrees.
    #[serde(with = "serde_helpers::quat_from_euler_deg", default)]
    pub rotation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }
}
