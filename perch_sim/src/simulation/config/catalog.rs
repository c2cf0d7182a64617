// perch_sim/src/simulation/config/catalog.rs

use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::Result;

/// Walks `dir` and returns every `.toml` file under it, sorted by path.
pub fn discover_scenarios(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        warn!("Scenario directory not found at {:?}, nothing to run.", dir);
        return Ok(Vec::new());
    }

    info!("Discovering scenarios under: {:?}", dir);

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().map_or(false, |ext| ext == "toml")
        {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}
