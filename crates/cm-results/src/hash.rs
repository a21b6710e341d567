//! Content-based hashing for run IDs.

use crate::ResultsResult;
use crate::types::{RunId, RunType};
use cm_project::schema::SystemDef;
use sha2::{Digest, Sha256};

pub fn compute_run_id(
    system: &SystemDef,
    run_type: &RunType,
    solver_version: &str,
) -> ResultsResult<RunId> {
    let mut hasher = Sha256::new();

    hasher.update(serde_json::to_string(system)?.as_bytes());
    hasher.update(serde_json::to_string(run_type)?.as_bytes());
    hasher.update(solver_version.as_bytes());

    Ok(format!("{:x}", hasher.finalize()))
}
