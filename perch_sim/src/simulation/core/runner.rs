// perch_sim/src/simulation/core/runner.rs

use nalgebra::Isometry3;
use perch_core::error::FilterError;
use perch_core::prelude::{
    ConsensusEstimator, FrameHandle, FrameId, OrientationCorrector, PoseAxis,
};
use rand::Rng;
use tracing::{debug, info, warn};

use super::prng::SimulationRng;
use crate::error::Result;
use crate::simulation::config::ScenarioConfig;
use crate::simulation::sensors::{AttitudeSource, MarkerCamera};

/// The downward camera every scenario observes the marker with.
pub const CAMERA_FRAME: FrameId = FrameId::Sensor(FrameHandle(0));

/// Aggregate error statistics for one scenario run.
///
/// Means are taken over the windows both filters accepted; they are NaN when
/// every window failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSummary {
    pub name: String,
    pub seed: u64,
    pub windows: usize,
    /// Windows on which either filter returned an error.
    pub failures: usize,
    /// Consensus translation error against the truth (metres).
    pub mean_translation_error: f64,
    /// Consensus orientation error against the truth (radians).
    pub mean_vision_rotation_error: f64,
    /// Orientation error after attitude correction (radians).
    pub mean_corrected_rotation_error: f64,
    pub mean_outlier_fraction: f64,
    /// Mean reported translational variance.
    pub mean_position_variance: f64,
}

/// The per-window errors of a successful filtering pass.
#[derive(Debug, Clone, Copy)]
struct WindowOutcome {
    translation_error: f64,
    vision_rotation_error: f64,
    corrected_rotation_error: f64,
    outlier_fraction: f64,
    position_variance: f64,
}

#[derive(Debug, Default)]
struct RunningMean {
    sum: f64,
    count: usize,
}

impl RunningMean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Generates windows for one scenario and pushes them through both filters.
pub struct ScenarioRunner {
    config: ScenarioConfig,
    seed: u64,
    rng: SimulationRng,
    camera: MarkerCamera,
    attitude: AttitudeSource,
    estimator: ConsensusEstimator,
    corrector: OrientationCorrector,
}

impl ScenarioRunner {
    /// Builds a runner, seeding from the scenario or, if it has none, from entropy.
    pub fn new(config: ScenarioConfig) -> Result<Self> {
        let seed = config
            .simulation
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        let camera = MarkerCamera::from_config(&config, CAMERA_FRAME)?;
        let attitude = AttitudeSource::from_config(&config)?;
        let estimator = ConsensusEstimator::try_new(config.consensus.clone())?;
        let corrector = OrientationCorrector::try_new(config.fusion.clone())?;

        Ok(Self {
            config,
            seed,
            rng: SimulationRng::from_seed(seed),
            camera,
            attitude,
            estimator,
            corrector,
        })
    }

    pub fn run(&mut self) -> ScenarioSummary {
        info!(
            "Running scenario '{}' (seed {}, {} windows of {})",
            self.config.name,
            self.seed,
            self.config.simulation.windows,
            self.config.simulation.window_size
        );

        let mut failures = 0;
        let mut translation = RunningMean::default();
        let mut vision_rotation = RunningMean::default();
        let mut corrected_rotation = RunningMean::default();
        let mut outliers = RunningMean::default();
        let mut position_variance = RunningMean::default();

        for window in 0..self.config.simulation.windows {
            match self.step(window) {
                Ok(outcome) => {
                    translation.push(outcome.translation_error);
                    vision_rotation.push(outcome.vision_rotation_error);
                    corrected_rotation.push(outcome.corrected_rotation_error);
                    outliers.push(outcome.outlier_fraction);
                    position_variance.push(outcome.position_variance);
                }
                Err(e) => {
                    warn!("Window {} failed: {}", window, e);
                    failures += 1;
                }
            }
        }

        let summary = ScenarioSummary {
            name: self.config.name.clone(),
            seed: self.seed,
            windows: self.config.simulation.windows,
            failures,
            mean_translation_error: translation.value(),
            mean_vision_rotation_error: vision_rotation.value(),
            mean_corrected_rotation_error: corrected_rotation.value(),
            mean_outlier_fraction: outliers.value(),
            mean_position_variance: position_variance.value(),
        };

        info!(
            "[{}] translation error {:.4} m | rotation error vision {:.3} deg, corrected {:.3} deg | outlier fraction {:.3} | failures {}",
            summary.name,
            summary.mean_translation_error,
            summary.mean_vision_rotation_error.to_degrees(),
            summary.mean_corrected_rotation_error.to_degrees(),
            summary.mean_outlier_fraction,
            summary.failures
        );
        summary
    }

    /// Filters one freshly generated window: consensus first, then attitude correction.
    fn step(&mut self, window: usize) -> std::result::Result<WindowOutcome, FilterError> {
        let start_time = window as f64 * self.camera.window_duration();
        let readings = self.camera.sample_window(&mut self.rng.0, start_time);

        let consensus = self.estimator.evaluate(&readings)?;
        let estimate = &consensus.estimate;

        let attitude = self.attitude.sample(&mut self.rng.0, estimate.timestamp);
        let corrected = self
            .corrector
            .correct(&estimate.to_pose_stamped(), &attitude)?;

        let truth: &Isometry3<f64> = self.camera.truth();
        let outcome = WindowOutcome {
            translation_error: (estimate.pose.translation.vector - truth.translation.vector)
                .norm(),
            vision_rotation_error: estimate.pose.rotation.angle_to(&truth.rotation),
            corrected_rotation_error: corrected.rotation().angle_to(&truth.rotation),
            outlier_fraction: consensus.outlier_fraction,
            position_variance: estimate.variance(PoseAxis::X),
        };

        debug!(
            window,
            inliers = consensus.inlier_count(),
            translation_error = outcome.translation_error,
            corrected_rotation_error = outcome.corrected_rotation_error,
            "window filtered"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn noiseless_config() -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        config.name = "noiseless".to_string();
        config.simulation.seed = Some(5);
        config.simulation.windows = 4;
        config.simulation.window_size = 8;
        config.camera.position_stddev = 0.0;
        config.camera.orientation_stddev_deg = 0.0;
        config.camera.outliers_per_window = 2;
        config.attitude.orientation_stddev_deg = 0.0;
        config
    }

    #[test]
    fn test_noiseless_run_recovers_truth() {
        let summary = ScenarioRunner::new(noiseless_config()).unwrap().run();

        assert_eq!(summary.failures, 0);
        assert_eq!(summary.windows, 4);
        assert_abs_diff_eq!(summary.mean_translation_error, 0.0, epsilon = 1e-12);
        assert!(summary.mean_vision_rotation_error < 1e-6);
        assert!(summary.mean_corrected_rotation_error < 1e-6);
        assert_abs_diff_eq!(summary.mean_outlier_fraction, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.mean_position_variance, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_same_seed_same_summary() {
        let mut config = ScenarioConfig::default();
        config.simulation.seed = Some(21);
        config.simulation.windows = 10;

        let a = ScenarioRunner::new(config.clone()).unwrap().run();
        let b = ScenarioRunner::new(config).unwrap().run();
        assert_eq!(a, b);
    }

    #[test]
    fn test_correction_beats_noisy_vision_orientation() {
        let mut config = ScenarioConfig::default();
        config.simulation.seed = Some(8);
        config.simulation.windows = 30;
        config.camera.outliers_per_window = 0;
        // Loose orientation tolerance so noisy readings still reach consensus.
        config.consensus.orientation_tolerance = 0.6;
        config.consensus.position_tolerance = 0.2;
        config.camera.orientation_stddev_deg = 8.0;
        config.attitude.orientation_stddev_deg = 0.1;

        let summary = ScenarioRunner::new(config).unwrap().run();
        assert_eq!(summary.failures, 0);
        assert!(
            summary.mean_corrected_rotation_error < summary.mean_vision_rotation_error,
            "{summary:?}"
        );
    }
}
