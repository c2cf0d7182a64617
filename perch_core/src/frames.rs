// perch_core/src/frames.rs

use serde::{Deserialize, Serialize};
use std::fmt;

// --- A generic, framework-agnostic identifier ---
// On a real robot this might be a hardware ID or the index of a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

/// A unique, hashable identifier for every coordinate frame a pose can be expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameId {
    /// The local (world-fixed) frame the attitude source reports in.
    #[default]
    Local,
    /// The origin of the vehicle body.
    Body(FrameHandle),
    /// The origin of a sensor mounted on the body, e.g. a downward camera.
    Sensor(FrameHandle),
    /// A fiducial marker, identified by its tag id.
    Marker(u32),
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameId::Local => write!(f, "local"),
            FrameId::Body(h) => write!(f, "body/{}", h.0),
            FrameId::Sensor(h) => write!(f, "sensor/{}", h.0),
            FrameId::Marker(id) => write!(f, "marker/{}", id),
        }
    }
}
