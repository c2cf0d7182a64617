// perch_core/src/prelude.rs

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::frames::{FrameHandle, FrameId};
pub use crate::messages::{AttitudeStamped, PoseStamped, PoseWithCovarianceStamped};
pub use crate::types::{Covariance6, PoseAxis, Timestamp};

// --- Configuration and Errors ---
pub use crate::config::{ConsensusConfig, FusionConfig, MountOffset};
pub use crate::error::{FilterError, Result};

// --- Estimation Algorithms ---
pub use crate::estimation::{
    correct, estimate, ConsensusEstimator, ConsensusResult, OrientationCorrector,
};
