use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::model::Plan;

/// Save a plan snapshot to a JSON file.
pub fn save_plan(plan: &Plan, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(plan)?;
    std::fs::write(path, json)?;
    debug!(path = %path.display(), tasks = plan.tasks.len(), "plan saved");
    Ok(())
}

/// Load a plan snapshot from a JSON file.
pub fn load_plan(path: &Path) -> Result<Plan> {
    let json = std::fs::read_to_string(path)?;
    let plan: Plan = serde_json::from_str(&json)?;
    debug!(path = %path.display(), tasks = plan.tasks.len(), "plan loaded");
    Ok(plan)
}
