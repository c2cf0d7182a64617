// perch_core/src/estimation/mod.rs

//! The two estimators. Both are stateless: each call is a pure function of its
//! inputs and the estimator's configuration, so they can be shared freely
//! between threads.

pub mod consensus;
pub mod fusion;

pub use consensus::{estimate, ConsensusEstimator, ConsensusResult};
pub use fusion::{correct, OrientationCorrector};
