// perch_core/src/geometry.rs

//! Small pose-space helpers shared by the estimators.

use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use std::cmp::Ordering;

/// Euclidean distance between the translation parts of two poses.
pub fn translation_distance(a: &Isometry3<f64>, b: &Isometry3<f64>) -> f64 {
    (a.translation.vector - b.translation.vector).norm()
}

/// Geodesic angle in radians between two rotations, in `[0, pi]`.
///
/// `q` and `-q` describe the same rotation and are zero apart.
pub fn geodesic_angle(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>) -> f64 {
    a.angle_to(b)
}

/// Flips `q` onto the same hemisphere of the unit 3-sphere as `reference`.
pub fn align_to_hemisphere(
    q: &UnitQuaternion<f64>,
    reference: &UnitQuaternion<f64>,
) -> UnitQuaternion<f64> {
    if q.coords.dot(&reference.coords) < 0.0 {
        UnitQuaternion::new_unchecked(-q.into_inner())
    } else {
        *q
    }
}

/// Geodesic (Karcher) mean of a set of rotations, seeded at `seed`.
///
/// Each iteration averages the tangent-space residuals `log(mean^-1 * q)` and
/// steps the mean along them, which is the proper spherical average rather than
/// a component-wise one. All inputs are first aligned to the seed's hemisphere,
/// and the result is returned on that hemisphere too. When every input equals
/// the seed the residuals are exactly zero and the seed comes back unchanged.
pub fn spherical_mean(
    rotations: &[UnitQuaternion<f64>],
    seed: &UnitQuaternion<f64>,
    max_iterations: usize,
    convergence: f64,
) -> UnitQuaternion<f64> {
    if rotations.is_empty() {
        return *seed;
    }

    let aligned: Vec<UnitQuaternion<f64>> = rotations
        .iter()
        .map(|q| align_to_hemisphere(q, seed))
        .collect();
    let n = aligned.len() as f64;

    let mut mean = *seed;
    for _ in 0..max_iterations {
        let mean_inv = mean.inverse();
        let step = aligned
            .iter()
            .map(|q| (mean_inv * q).scaled_axis())
            .fold(Vector3::zeros(), |acc, v| acc + v)
            / n;

        if step.norm() <= convergence {
            break;
        }
        mean *= UnitQuaternion::from_scaled_axis(step);
        mean.renormalize();
    }

    align_to_hemisphere(&mean, seed)
}

/// A total order over poses by their raw coordinates.
///
/// Used only to break exact ties deterministically, independent of input order.
pub fn pose_total_cmp(a: &Isometry3<f64>, b: &Isometry3<f64>) -> Ordering {
    let coords_a = a
        .translation
        .vector
        .iter()
        .chain(a.rotation.coords.iter());
    let coords_b = b
        .translation
        .vector
        .iter()
        .chain(b.rotation.coords.iter());

    coords_a
        .zip(coords_b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}
