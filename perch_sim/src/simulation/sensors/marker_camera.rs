// perch_sim/src/simulation/sensors/marker_camera.rs

use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use perch_core::prelude::{FrameId, PoseStamped};
use rand::{seq::index, Rng};
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

use super::{random_unit_vector, small_rotation};
use crate::error::{Result, SimError};
use crate::simulation::config::ScenarioConfig;

/// A camera that detects one fiducial marker per frame.
///
/// Most detections are the true marker pose plus Gaussian noise. A fixed number
/// per window are corrupted: thrown well away from the truth in both position
/// and orientation, the way a misdecoded or mirrored tag shows up in practice.
#[derive(Debug, Clone)]
pub struct MarkerCamera {
    frame: FrameId,
    truth: Isometry3<f64>,
    position_noise: Normal<f64>,
    orientation_noise: Normal<f64>,
    window_size: usize,
    outliers_per_window: usize,
    outlier_offset: f64,
    period: f64,
}

impl MarkerCamera {
    pub fn from_config(config: &ScenarioConfig, frame: FrameId) -> Result<Self> {
        let camera = &config.camera;
        let position_noise = Normal::new(0.0, camera.position_stddev)
            .map_err(|e| SimError::InvalidScenario(format!("camera.position_stddev: {e}")))?;
        let orientation_noise = Normal::new(0.0, camera.orientation_stddev_deg.to_radians())
            .map_err(|e| {
                SimError::InvalidScenario(format!("camera.orientation_stddev_deg: {e}"))
            })?;

        Ok(Self {
            frame,
            truth: config.marker.pose_in_camera.to_isometry(),
            position_noise,
            orientation_noise,
            window_size: config.simulation.window_size,
            outliers_per_window: config.camera.outliers_per_window,
            outlier_offset: camera.outlier_offset,
            period: 1.0 / config.simulation.rate_hz,
        })
    }

    /// The true marker pose in the camera frame.
    pub fn truth(&self) -> &Isometry3<f64> {
        &self.truth
    }

    /// Time covered by one window of detections.
    pub fn window_duration(&self) -> f64 {
        self.period * self.window_size as f64
    }

    /// One window of detections, the first stamped at `start_time`.
    ///
    /// Corrupted detections land at random positions within the window.
    pub fn sample_window<R: Rng + ?Sized>(&self, rng: &mut R, start_time: f64) -> Vec<PoseStamped> {
        let mut corrupted = vec![false; self.window_size];
        for i in index::sample(rng, self.window_size, self.outliers_per_window) {
            corrupted[i] = true;
        }

        corrupted
            .into_iter()
            .enumerate()
            .map(|(i, is_outlier)| {
                let timestamp = start_time + i as f64 * self.period;
                let pose = if is_outlier {
                    self.corrupted_detection(rng)
                } else {
                    self.noisy_detection(rng)
                };
                PoseStamped::new(timestamp, self.frame.clone(), pose)
            })
            .collect()
    }

    fn noisy_detection<R: Rng + ?Sized>(&self, rng: &mut R) -> Isometry3<f64> {
        let offset = Vector3::from_fn(|_, _| self.position_noise.sample(rng));
        let rotation = self.truth.rotation * small_rotation(rng, &self.orientation_noise);
        Isometry3::from_parts((self.truth.translation.vector + offset).into(), rotation)
    }

    fn corrupted_detection<R: Rng + ?Sized>(&self, rng: &mut R) -> Isometry3<f64> {
        let distance = self.outlier_offset * (1.0 + rng.gen::<f64>());
        let offset = random_unit_vector(rng) * distance;

        let axis = nalgebra::Unit::new_normalize(random_unit_vector(rng));
        let angle = rng.gen_range(0.5..PI);
        let rotation = self.truth.rotation * UnitQuaternion::from_axis_angle(&axis, angle);

        Isometry3::from_parts((self.truth.translation.vector + offset).into(), rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::core::prng::SimulationRng;
    use perch_core::frames::FrameHandle;

    fn camera(config: &ScenarioConfig) -> MarkerCamera {
        MarkerCamera::from_config(config, FrameId::Sensor(FrameHandle(0))).unwrap()
    }

    #[test]
    fn test_window_has_configured_size_and_timestamps() {
        let mut config = ScenarioConfig::default();
        config.simulation.window_size = 5;
        config.simulation.rate_hz = 10.0;
        let camera = camera(&config);

        let mut rng = SimulationRng::from_seed(1);
        let window = camera.sample_window(&mut rng.0, 2.0);
        assert_eq!(window.len(), 5);
        for (i, reading) in window.iter().enumerate() {
            approx::assert_abs_diff_eq!(reading.timestamp, 2.0 + 0.1 * i as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_same_seed_same_window() {
        let config = ScenarioConfig::default();
        let camera = camera(&config);

        let a = camera.sample_window(&mut SimulationRng::from_seed(9).0, 0.0);
        let b = camera.sample_window(&mut SimulationRng::from_seed(9).0, 0.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_outliers_are_far_from_truth() {
        let mut config = ScenarioConfig::default();
        config.camera.position_stddev = 0.0;
        config.camera.orientation_stddev_deg = 0.0;
        config.camera.outliers_per_window = 3;
        config.camera.outlier_offset = 1.0;
        let camera = camera(&config);

        let window = camera.sample_window(&mut SimulationRng::from_seed(3).0, 0.0);
        let far = window
            .iter()
            .filter(|r| (r.translation() - camera.truth().translation.vector).norm() >= 1.0)
            .count();
        let exact = window.iter().filter(|r| r.pose == *camera.truth()).count();
        assert_eq!(far, 3);
        assert_eq!(exact, window.len() - 3);
    }

    #[test]
    fn test_negative_noise_is_rejected() {
        let mut config = ScenarioConfig::default();
        config.camera.position_stddev = -1.0;
        let result = MarkerCamera::from_config(&config, FrameId::Local);
        assert!(matches!(result, Err(SimError::InvalidScenario(_))));
    }
}
