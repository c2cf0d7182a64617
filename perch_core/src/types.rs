// perch_core/src/types.rs

// --- Core Type Aliases ---
/// Seconds, on whatever clock the caller stamps its readings with.
pub type Timestamp = f64;

/// A 6x6 pose covariance flattened row-major, ordered (x, y, z, rx, ry, rz).
pub type Covariance6 = [f64; 36];

/// The six degrees of freedom of a pose, in covariance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseAxis {
    X,
    Y,
    Z,
    Roll,
    Pitch,
    Yaw,
}

impl PoseAxis {
    pub const ALL: [PoseAxis; 6] = [
        PoseAxis::X,
        PoseAxis::Y,
        PoseAxis::Z,
        PoseAxis::Roll,
        PoseAxis::Pitch,
        PoseAxis::Yaw,
    ];

    /// Row (and column) of this axis in a [`Covariance6`].
    pub fn index(self) -> usize {
        self as usize
    }
}
