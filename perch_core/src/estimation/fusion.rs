// perch_core/src/estimation/fusion.rs

use nalgebra::{Isometry3, UnitQuaternion};
use tracing::warn;

use crate::config::FusionConfig;
use crate::error::{FilterError, Result};
use crate::frames::FrameId;
use crate::messages::{AttitudeStamped, PoseStamped};

/// Replaces the orientation of a vision-derived marker pose with an inertial one.
///
/// Planar markers give ill-conditioned orientation estimates at oblique viewing
/// angles, especially in roll and pitch, while their translation is usually
/// good. The corrector keeps the vision translation bit-for-bit and swaps in the
/// attitude estimate rotated into the camera frame by the fixed mount offset.
#[derive(Debug, Clone)]
pub struct OrientationCorrector {
    config: FusionConfig,
    /// Cached `config.mount_offset.rotation()`.
    mount_rotation: UnitQuaternion<f64>,
}

impl Default for OrientationCorrector {
    fn default() -> Self {
        Self::new(FusionConfig::default())
    }
}

impl OrientationCorrector {
    /// Creates a corrector without checking the configuration.
    pub fn new(config: FusionConfig) -> Self {
        let mount_rotation = config.mount_offset.rotation();
        Self {
            config,
            mount_rotation,
        }
    }

    /// Creates a corrector after validating the configuration.
    pub fn try_new(config: FusionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Returns `vision_pose` with its orientation replaced by `attitude`'s.
    ///
    /// The result keeps the timestamp and frame of `vision_pose`. The attitude is
    /// used as given: aligning the two in time is the caller's job.
    pub fn correct(
        &self,
        vision_pose: &PoseStamped,
        attitude: &AttitudeStamped,
    ) -> Result<PoseStamped> {
        let attitude_rotation = self.normalized_attitude(attitude)?;
        let rotation = self.mount_rotation * attitude_rotation;

        Ok(PoseStamped::new(
            vision_pose.timestamp,
            vision_pose.frame.clone(),
            Isometry3::from_parts(vision_pose.pose.translation, rotation),
        ))
    }

    /// The corrected pose inverted: where the camera sits as seen from the marker.
    ///
    /// `marker_frame` names the frame of the result, since a pose reading only
    /// carries the frame it is expressed in.
    pub fn observer_in_marker(
        &self,
        vision_pose: &PoseStamped,
        attitude: &AttitudeStamped,
        marker_frame: FrameId,
    ) -> Result<PoseStamped> {
        let corrected = self.correct(vision_pose, attitude)?;
        Ok(PoseStamped::new(
            corrected.timestamp,
            marker_frame,
            corrected.pose.inverse(),
        ))
    }

    fn normalized_attitude(&self, attitude: &AttitudeStamped) -> Result<UnitQuaternion<f64>> {
        let q = attitude.orientation;
        let finite = q.coords.iter().all(|c| c.is_finite());

        // Divide out the largest component first so huge finite inputs do not overflow the norm.
        let largest = q.coords.amax();
        let norm = if !finite {
            q.norm()
        } else if largest == 0.0 {
            0.0
        } else {
            largest * (q / largest).norm()
        };

        if !finite || norm <= self.config.min_quaternion_norm {
            warn!(
                norm,
                timestamp = attitude.timestamp,
                "rejecting attitude quaternion that cannot be normalized"
            );
            return Err(FilterError::InvalidOrientation { norm });
        }
        Ok(UnitQuaternion::new_normalize(q / largest))
    }
}

/// Runs the corrector with an identity mount offset.
pub fn correct(vision_pose: &PoseStamped, attitude: &AttitudeStamped) -> Result<PoseStamped> {
    OrientationCorrector::default().correct(vision_pose, attitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MountOffset;
    use crate::frames::FrameHandle;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Quaternion, Vector3};
    use std::f64::consts::FRAC_PI_2;

    const CAMERA: FrameId = FrameId::Sensor(FrameHandle(1));

    fn assert_quat_approx_eq(q1: &UnitQuaternion<f64>, q2: &UnitQuaternion<f64>, epsilon: f64) {
        let angle_diff = q1.angle_to(q2);
        assert!(
            angle_diff < epsilon,
            "UnitQuaternions not approx equal. q1: {:?}, q2: {:?}, angle_diff: {}",
            q1.coords,
            q2.coords,
            angle_diff
        );
    }

    fn vision_pose() -> PoseStamped {
        PoseStamped::from_parts(
            12.5,
            CAMERA,
            Vector3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_euler_angles(0.4, -0.3, 0.2),
        )
    }

    fn attitude(q: Quaternion<f64>) -> AttitudeStamped {
        AttitudeStamped::new(12.4, FrameId::Local, q)
    }

    #[test]
    fn test_correct_keeps_translation_and_takes_attitude() {
        let q2 = UnitQuaternion::from_euler_angles(0.05, 0.02, 1.3);
        let corrected = correct(&vision_pose(), &AttitudeStamped::from_unit(3.0, FrameId::Local, q2))
            .unwrap();

        assert_eq!(corrected.translation(), Vector3::new(1.0, 2.0, 3.0));
        assert_quat_approx_eq(&corrected.rotation(), &q2, 1e-6);
        assert_abs_diff_eq!(corrected.rotation().coords, q2.coords, epsilon = 1e-15);
    }

    #[test]
    fn test_correct_stamps_with_vision_time_and_frame() {
        let corrected = correct(&vision_pose(), &attitude(Quaternion::identity())).unwrap();
        assert_eq!(corrected.timestamp, 12.5);
        assert_eq!(corrected.frame, CAMERA);
    }

    #[test]
    fn test_translation_is_bit_identical() {
        let vision = PoseStamped::from_parts(
            0.0,
            CAMERA,
            Vector3::new(0.1 + 0.2, -1e-300, 7.0 / 3.0),
            UnitQuaternion::identity(),
        );
        let offset = MountOffset::new(0.3, -1.2, 2.0);
        let corrector = OrientationCorrector::new(FusionConfig::new().with_mount_offset(offset));
        let corrected = corrector
            .correct(&vision, &attitude(Quaternion::new(0.9, 0.1, -0.2, 0.3)))
            .unwrap();

        for (a, b) in corrected.translation().iter().zip(vision.translation().iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_non_unit_attitude_matches_prenormalized_attitude() {
        let raw = Quaternion::new(0.7, 0.2, -0.4, 0.1) * 3.7;
        let unit = UnitQuaternion::from_quaternion(raw);

        let from_raw = correct(&vision_pose(), &attitude(raw)).unwrap();
        let from_unit = correct(&vision_pose(), &attitude(unit.into_inner())).unwrap();

        assert_abs_diff_eq!(
            from_raw.rotation().coords,
            from_unit.rotation().coords,
            epsilon = 1e-12
        );
        assert_eq!(from_raw.translation(), from_unit.translation());
    }

    #[test]
    fn test_zero_attitude_is_invalid_orientation() {
        let result = correct(&vision_pose(), &attitude(Quaternion::new(0.0, 0.0, 0.0, 0.0)));
        assert!(matches!(
            result,
            Err(FilterError::InvalidOrientation { norm }) if norm == 0.0
        ));
    }

    #[test]
    fn test_near_zero_and_nan_attitudes_are_invalid() {
        let tiny = correct(&vision_pose(), &attitude(Quaternion::new(1e-12, 0.0, 0.0, 0.0)));
        assert!(matches!(tiny, Err(FilterError::InvalidOrientation { .. })));

        let nan = correct(&vision_pose(), &attitude(Quaternion::new(f64::NAN, 0.0, 0.0, 1.0)));
        assert!(matches!(nan, Err(FilterError::InvalidOrientation { .. })));
    }

    #[test]
    fn test_huge_finite_attitude_is_normalized() {
        let huge = correct(&vision_pose(), &attitude(Quaternion::new(1e200, 1e200, 0.0, 0.0)))
            .unwrap();
        let expected = UnitQuaternion::from_quaternion(Quaternion::new(1.0, 1.0, 0.0, 0.0));
        assert_abs_diff_eq!(huge.rotation().coords, expected.coords, epsilon = 1e-12);

        let at_max = correct(
            &vision_pose(),
            &attitude(Quaternion::new(f64::MAX, 0.0, -f64::MAX, 0.0)),
        );
        assert!(at_max.is_ok());
    }

    #[test]
    fn test_mount_offset_is_applied_before_swap() {
        // Camera yawed a quarter turn relative to the attitude source.
        let offset = MountOffset::new(0.0, 0.0, FRAC_PI_2);
        let corrector = OrientationCorrector::try_new(FusionConfig::new().with_mount_offset(offset))
            .unwrap();

        let corrected = corrector
            .correct(&vision_pose(), &attitude(Quaternion::identity()))
            .unwrap();
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        assert_quat_approx_eq(&corrected.rotation(), &expected, 1e-6);
    }

    #[test]
    fn test_observer_in_marker_inverts_corrected_pose() {
        let q2 = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let corrector = OrientationCorrector::default();
        let observer = corrector
            .observer_in_marker(
                &vision_pose(),
                &AttitudeStamped::from_unit(0.0, FrameId::Local, q2),
                FrameId::Marker(7),
            )
            .unwrap();

        assert_eq!(observer.frame, FrameId::Marker(7));
        assert_eq!(observer.timestamp, 12.5);
        // Marker at (1, 2, 3) in a camera yawed +90deg: camera sits at R^T * -t.
        assert_abs_diff_eq!(
            observer.translation(),
            Vector3::new(-2.0, 1.0, -3.0),
            epsilon = 1e-12
        );
        assert_quat_approx_eq(&observer.rotation(), &q2.inverse(), 1e-6);
    }
}
