// perch_sim/src/simulation/sensors/attitude.rs

use nalgebra::UnitQuaternion;
use perch_core::prelude::{AttitudeStamped, FrameId};
use rand::Rng;
use rand_distr::Normal;

use super::small_rotation;
use crate::error::{Result, SimError};
use crate::simulation::config::ScenarioConfig;

/// An inertial attitude source, as reported by a flight controller.
///
/// Readings are the true attitude plus small Gaussian rotation noise. Their
/// quaternions are additionally scaled off unit length to mimic numerical drift,
/// so consumers have to normalize them.
#[derive(Debug, Clone)]
pub struct AttitudeSource {
    frame: FrameId,
    truth: UnitQuaternion<f64>,
    noise: Normal<f64>,
    norm_drift: f64,
}

impl AttitudeSource {
    /// Builds a source whose true attitude, once rotated by the configured mount
    /// offset, matches the marker's true orientation in the camera frame.
    pub fn from_config(config: &ScenarioConfig) -> Result<Self> {
        let noise = Normal::new(0.0, config.attitude.orientation_stddev_deg.to_radians())
            .map_err(|e| {
                SimError::InvalidScenario(format!("attitude.orientation_stddev_deg: {e}"))
            })?;
        let mount = config.fusion.mount_offset.rotation();
        let truth = mount.inverse() * config.marker.pose_in_camera.rotation;

        Ok(Self {
            frame: FrameId::Local,
            truth,
            noise,
            norm_drift: config.attitude.norm_drift,
        })
    }

    /// The true attitude in the source's own frame.
    pub fn truth(&self) -> &UnitQuaternion<f64> {
        &self.truth
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, timestamp: f64) -> AttitudeStamped {
        let noisy = self.truth * small_rotation(rng, &self.noise);
        let scale = rng.gen_range((1.0 - self.norm_drift)..=(1.0 + self.norm_drift));
        AttitudeStamped::new(timestamp, self.frame.clone(), noisy.into_inner() * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::core::prng::SimulationRng;
    use approx::assert_abs_diff_eq;
    use perch_core::config::MountOffset;

    #[test]
    fn test_truth_undoes_mount_offset() {
        let mut config = ScenarioConfig::default();
        config.fusion.mount_offset = MountOffset::new(0.0, 0.0, 0.5);
        let source = AttitudeSource::from_config(&config).unwrap();

        let recovered = config.fusion.mount_offset.rotation() * source.truth();
        assert!(recovered.angle_to(&config.marker.pose_in_camera.rotation) < 1e-6);
    }

    #[test]
    fn test_samples_drift_off_unit_length_within_bounds() {
        let mut config = ScenarioConfig::default();
        config.attitude.norm_drift = 0.05;
        let source = AttitudeSource::from_config(&config).unwrap();
        let mut rng = SimulationRng::from_seed(11);

        for i in 0..50 {
            let reading = source.sample(&mut rng.0, i as f64);
            let norm = reading.orientation.norm();
            assert!((0.95 - 1e-12..=1.05 + 1e-12).contains(&norm), "norm {norm}");
        }
    }

    #[test]
    fn test_noiseless_sample_is_truth() {
        let mut config = ScenarioConfig::default();
        config.attitude.orientation_stddev_deg = 0.0;
        config.attitude.norm_drift = 0.0;
        let source = AttitudeSource::from_config(&config).unwrap();

        let reading = source.sample(&mut SimulationRng::from_seed(0).0, 1.0);
        assert_abs_diff_eq!(reading.orientation.coords, source.truth().coords, epsilon = 1e-15);
        assert_eq!(reading.timestamp, 1.0);
        assert_eq!(reading.frame, FrameId::Local);
    }
}
