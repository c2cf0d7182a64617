// perch_core/src/messages.rs

use crate::frames::FrameId;
use crate::types::{Covariance6, PoseAxis, Timestamp};
use nalgebra::{Isometry3, Matrix6, Quaternion, UnitQuaternion, Vector3};

// =========================================================================
// == Pose Messages ==
// =========================================================================

/// A timestamped 6-DOF pose expressed in a named frame.
///
/// This is both the input reading (one per camera frame in which a marker was
/// detected) and the output of the orientation corrector.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseStamped {
    pub timestamp: Timestamp,
    /// The frame the pose is expressed in.
    pub frame: FrameId,
    pub pose: Isometry3<f64>,
}

impl PoseStamped {
    pub fn new(timestamp: Timestamp, frame: FrameId, pose: Isometry3<f64>) -> Self {
        Self {
            timestamp,
            frame,
            pose,
        }
    }

    /// Builds a pose from a translation and a rotation.
    pub fn from_parts(
        timestamp: Timestamp,
        frame: FrameId,
        translation: Vector3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self::new(
            timestamp,
            frame,
            Isometry3::from_parts(translation.into(), rotation),
        )
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.pose.translation.vector
    }

    pub fn rotation(&self) -> UnitQuaternion<f64> {
        self.pose.rotation
    }

    /// True when every translation and quaternion component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.pose.translation.vector.iter().all(|v| v.is_finite())
            && self.pose.rotation.coords.iter().all(|v| v.is_finite())
    }
}

/// The output of the consensus estimator: one pose plus a confidence proxy.
///
/// The covariance is diagonal and grows with the fraction of readings that were
/// rejected as outliers. It is not a calibrated measurement covariance.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseWithCovarianceStamped {
    pub timestamp: Timestamp,
    pub frame: FrameId,
    pub pose: Isometry3<f64>,
    /// Row-major 6x6, ordered (x, y, z, rx, ry, rz).
    pub covariance: Covariance6,
}

impl PoseWithCovarianceStamped {
    /// Builds an estimate whose covariance has `diagonal` on its main diagonal and zeros elsewhere.
    pub fn with_diagonal(
        timestamp: Timestamp,
        frame: FrameId,
        pose: Isometry3<f64>,
        diagonal: [f64; 6],
    ) -> Self {
        let mut covariance = [0.0; 36];
        for (i, value) in diagonal.iter().enumerate() {
            covariance[i * 6 + i] = *value;
        }
        Self {
            timestamp,
            frame,
            pose,
            covariance,
        }
    }

    pub fn covariance_matrix(&self) -> Matrix6<f64> {
        Matrix6::from_row_slice(&self.covariance)
    }

    pub fn variance(&self, axis: PoseAxis) -> f64 {
        let i = axis.index();
        self.covariance[i * 6 + i]
    }

    /// Drops the covariance, keeping the stamped pose.
    pub fn to_pose_stamped(&self) -> PoseStamped {
        PoseStamped::new(self.timestamp, self.frame.clone(), self.pose)
    }
}

// =========================================================================
// == Attitude Messages ==
// =========================================================================

/// An orientation estimate, typically from the flight controller's inertial filter.
///
/// The quaternion is kept raw: numerical drift can leave it slightly off unit
/// length, and normalizing it is the consumer's job.
#[derive(Clone, Debug, PartialEq)]
pub struct AttitudeStamped {
    pub timestamp: Timestamp,
    pub frame: FrameId,
    pub orientation: Quaternion<f64>,
}

impl AttitudeStamped {
    pub fn new(timestamp: Timestamp, frame: FrameId, orientation: Quaternion<f64>) -> Self {
        Self {
            timestamp,
            frame,
            orientation,
        }
    }

    pub fn from_unit(
        timestamp: Timestamp,
        frame: FrameId,
        orientation: UnitQuaternion<f64>,
    ) -> Self {
        Self::new(timestamp, frame, orientation.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_diagonal_is_row_major_and_symmetric() {
        let estimate = PoseWithCovarianceStamped::with_diagonal(
            0.0,
            FrameId::Local,
            Isometry3::identity(),
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        );
        let m = estimate.covariance_matrix();
        assert_eq!(m, m.transpose());
        assert_eq!(estimate.variance(PoseAxis::Z), 3.0);
        assert_eq!(estimate.variance(PoseAxis::Yaw), 6.0);
        assert_eq!(estimate.covariance[7], 2.0);
        assert_eq!(estimate.covariance[1], 0.0);
    }

    #[test]
    fn test_non_finite_pose_is_detected() {
        let good = PoseStamped::from_parts(
            0.0,
            FrameId::Local,
            Vector3::new(1.0, 2.0, 3.0),
            UnitQuaternion::identity(),
        );
        assert!(good.is_finite());

        let bad = PoseStamped::from_parts(
            0.0,
            FrameId::Local,
            Vector3::new(f64::NAN, 2.0, 3.0),
            UnitQuaternion::identity(),
        );
        assert!(!bad.is_finite());
    }
}
