// perch_core/src/estimation/consensus.rs

//! Consensus-based outlier rejection over a window of marker pose readings.
//!
//! This follows the RANSAC pattern (hypothesize, count inliers, refit on the
//! best inlier set) with one deliberate difference: sampling is exhaustive, not
//! random. The minimal model for pose consensus is a single reading, so every
//! reading is tried exactly once as the hypothesis. That makes the result a
//! deterministic function of the input multiset and costs O(n^2) comparisons.

use std::cmp::Ordering;

use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use tracing::{debug, trace};

use crate::config::ConsensusConfig;
use crate::error::{FilterError, Result};
use crate::geometry::{geodesic_angle, pose_total_cmp, spherical_mean, translation_distance};
use crate::messages::{PoseStamped, PoseWithCovarianceStamped};

/// Everything the estimator decided, not just the fused pose.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsensusResult {
    /// The fused pose and its confidence covariance.
    pub estimate: PoseWithCovarianceStamped,
    /// Indices (into the input window) of the readings that agreed with the winner.
    pub inliers: Vec<usize>,
    /// Index of the reading whose hypothesis won.
    pub hypothesis: usize,
    /// `(total - inliers) / total`.
    pub outlier_fraction: f64,
}

impl ConsensusResult {
    pub fn inlier_count(&self) -> usize {
        self.inliers.len()
    }
}

/// A scored hypothesis: one reading plus the readings that agree with it.
#[derive(Debug)]
struct Hypothesis {
    index: usize,
    inliers: Vec<usize>,
    /// Mean of the tolerance-normalized residuals over the inlier set.
    mean_residual: f64,
}

/// Reduces a window of readings of the same target to one robust pose.
///
/// Stateless: the only data it holds is its configuration, so one instance can
/// be shared across threads and called repeatedly.
#[derive(Debug, Clone, Default)]
pub struct ConsensusEstimator {
    config: ConsensusConfig,
}

impl ConsensusEstimator {
    /// Creates an estimator without checking the configuration.
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    /// Creates an estimator after validating the configuration.
    pub fn try_new(config: ConsensusConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Returns the consensus pose of `readings` with its outlier-scaled covariance.
    ///
    /// Fails with [`FilterError::InsufficientData`] if the window is empty or
    /// holds no finite reading.
    pub fn estimate(&self, readings: &[PoseStamped]) -> Result<PoseWithCovarianceStamped> {
        self.evaluate(readings).map(|result| result.estimate)
    }

    /// Like [`estimate`](Self::estimate), but also reports the inlier set and winning hypothesis.
    pub fn evaluate(&self, readings: &[PoseStamped]) -> Result<ConsensusResult> {
        if readings.is_empty() {
            return Err(FilterError::InsufficientData("empty reading window"));
        }

        // --- 1. Score every finite reading as a hypothesis ---
        let best = readings
            .iter()
            .enumerate()
            .filter(|(_, reading)| reading.is_finite())
            .map(|(index, _)| self.score_hypothesis(index, readings))
            .min_by(|a, b| rank(a, b, readings))
            .ok_or(FilterError::InsufficientData(
                "no finite reading in window",
            ))?;

        // --- 2. Refit on the winning inlier set ---
        let hypothesis = &readings[best.index];
        let inlier_readings: Vec<&PoseStamped> =
            best.inliers.iter().map(|&i| &readings[i]).collect();
        let pose = self.refit(hypothesis, &inlier_readings);
        let timestamp = inlier_readings
            .iter()
            .map(|r| r.timestamp)
            .fold(hypothesis.timestamp, f64::max);

        // --- 3. Confidence proxy from the outlier fraction ---
        let total = readings.len();
        let outliers = total - best.inliers.len();
        let outlier_fraction = outliers as f64 / total as f64;
        let position_var = self.config.base_position_variance * outlier_fraction;
        let orientation_var = self.config.base_orientation_variance * outlier_fraction;

        debug!(
            total,
            inliers = best.inliers.len(),
            hypothesis = best.index,
            outlier_fraction,
            "consensus pose selected"
        );

        let estimate = PoseWithCovarianceStamped::with_diagonal(
            timestamp,
            hypothesis.frame.clone(),
            pose,
            [
                position_var,
                position_var,
                position_var,
                orientation_var,
                orientation_var,
                orientation_var,
            ],
        );

        Ok(ConsensusResult {
            estimate,
            inliers: best.inliers,
            hypothesis: best.index,
            outlier_fraction,
        })
    }

    // --- Private Helper Methods for the Consensus Algorithm ---

    /// Counts the readings within both tolerances of `readings[index]`.
    fn score_hypothesis(&self, index: usize, readings: &[PoseStamped]) -> Hypothesis {
        let hypothesis = &readings[index].pose;
        let mut inliers = Vec::new();
        let mut residuals = Vec::new();

        for (j, reading) in readings.iter().enumerate() {
            if j == index {
                // A finite hypothesis always agrees with itself.
                inliers.push(j);
                continue;
            }
            if !reading.is_finite() {
                continue;
            }
            if let Some(residual) = self.inlier_residual(hypothesis, &reading.pose) {
                inliers.push(j);
                residuals.push(residual);
            }
        }

        // Summed in sorted order so the rounding is the same for any permutation.
        residuals.sort_unstable_by(f64::total_cmp);
        let mean_residual = residuals.iter().sum::<f64>() / inliers.len() as f64;
        trace!(
            hypothesis = index,
            inliers = inliers.len(),
            mean_residual,
            "scored hypothesis"
        );

        Hypothesis {
            index,
            inliers,
            mean_residual,
        }
    }

    /// The normalized residual of `candidate` against `hypothesis`, or `None` if it is an outlier.
    fn inlier_residual(
        &self,
        hypothesis: &Isometry3<f64>,
        candidate: &Isometry3<f64>,
    ) -> Option<f64> {
        let distance = translation_distance(hypothesis, candidate);
        let angle = geodesic_angle(&hypothesis.rotation, &candidate.rotation);

        // NaN fails both comparisons, so malformed values fall out as outliers.
        if distance < self.config.position_tolerance && angle < self.config.orientation_tolerance
        {
            Some(
                distance / self.config.position_tolerance
                    + angle / self.config.orientation_tolerance,
            )
        } else {
            None
        }
    }

    /// Mean translation and spherical-mean rotation of the inlier set.
    fn refit(&self, hypothesis: &PoseStamped, inliers: &[&PoseStamped]) -> Isometry3<f64> {
        if inliers.len() == 1 {
            return hypothesis.pose;
        }

        // Accumulate offsets from the hypothesis so identical readings reproduce it exactly.
        let origin = hypothesis.translation();
        let offset = inliers
            .iter()
            .map(|r| r.translation() - origin)
            .fold(Vector3::zeros(), |acc, d| acc + d)
            / inliers.len() as f64;

        let rotations: Vec<UnitQuaternion<f64>> = inliers.iter().map(|r| r.rotation()).collect();
        let rotation = spherical_mean(
            &rotations,
            &hypothesis.rotation(),
            self.config.mean_max_iterations,
            self.config.mean_convergence,
        );

        Isometry3::from_parts((origin + offset).into(), rotation)
    }
}

/// Orders hypotheses best-first: most inliers, then smallest mean residual,
/// then by pose coordinates so exact ties do not depend on input order.
fn rank(a: &Hypothesis, b: &Hypothesis, readings: &[PoseStamped]) -> Ordering {
    b.inliers
        .len()
        .cmp(&a.inliers.len())
        .then(a.mean_residual.total_cmp(&b.mean_residual))
        .then_with(|| pose_total_cmp(&readings[a.index].pose, &readings[b.index].pose))
}

/// Runs the consensus estimator with the default configuration.
pub fn estimate(readings: &[PoseStamped]) -> Result<PoseWithCovarianceStamped> {
    ConsensusEstimator::default().estimate(readings)
}
