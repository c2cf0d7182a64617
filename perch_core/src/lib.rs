// perch_core/src/lib.rs

//! Pose filtering for landing on a fiducial marker.
//!
//! Two independent, stateless estimators:
//!
//! - [`estimation::consensus`] reduces a window of marker pose readings to one
//!   outlier-robust pose with a confidence covariance.
//! - [`estimation::fusion`] swaps the unreliable vision orientation of a marker
//!   pose for an inertial attitude estimate, keeping the vision translation.

pub mod config;
pub mod error;
pub mod estimation;
pub mod frames;
pub mod geometry;
pub mod messages;
pub mod prelude;
pub mod types;
