// perch_sim/src/prelude.rs

// Re-export the entire perch_core prelude so you can easily access
// pure types like `PoseStamped`, `ConsensusEstimator`, etc.
pub use perch_core::prelude::*;

// Re-export common simulation-specific types for easy access.
pub use crate::cli::Cli;
pub use crate::error::SimError;
pub use crate::simulation::config::structs::*;
pub use crate::simulation::config::{discover_scenarios, load_scenario};
pub use crate::simulation::core::prng::SimulationRng;
pub use crate::simulation::core::runner::{ScenarioRunner, ScenarioSummary};
pub use crate::simulation::sensors::{AttitudeSource, MarkerCamera};
