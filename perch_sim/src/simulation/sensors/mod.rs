// perch_sim/src/simulation/sensors/mod.rs

//! Synthetic sources for the two filter inputs.

pub mod attitude;
pub mod marker_camera;

pub use attitude::AttitudeSource;
pub use marker_camera::MarkerCamera;

use nalgebra::{UnitQuaternion, Vector3};
use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};

/// A uniformly distributed direction.
pub(crate) fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    loop {
        let v = Vector3::from_fn(|_, _| rng.sample::<f64, _>(StandardNormal));
        let norm = v.norm();
        if norm > 1e-9 {
            return v / norm;
        }
    }
}

/// A rotation whose scaled-axis components are drawn independently from `noise`.
pub(crate) fn small_rotation<R: Rng + ?Sized>(
    rng: &mut R,
    noise: &Normal<f64>,
) -> UnitQuaternion<f64> {
    let scaled_axis = Vector3::from_fn(|_, _| noise.sample(rng));
    UnitQuaternion::from_scaled_axis(scaled_axis)
}
