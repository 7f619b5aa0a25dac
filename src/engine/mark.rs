//! engine::mark
//!
//! Record lifecycle changes on a tracked branch: a new status, a PR
//! number, or both. Setting a PR number does not change the status.

use crate::core::metadata::{BranchEntry, BranchStatus};
use crate::core::ops::RepoLock;
use crate::core::stack::update_entry;
use crate::core::types::BranchName;
use crate::git::RepositoryGateway;

use super::repo::RepoHandle;
use super::EngineError;

#[derive(Debug, Clone, Default)]
pub struct MarkRequest {
    pub name: String,
    pub status: Option<BranchStatus>,
    pub pr: Option<u64>,
}

/// Apply `request` and return the updated entry.
pub fn mark<G: RepositoryGateway>(
    handle: &RepoHandle<G>,
    request: &MarkRequest,
) -> Result<BranchEntry, EngineError> {
    let name = BranchName::new(request.name.as_str())?;
    if request.status.is_none() && request.pr.is_none() {
        return Err(EngineError::Rejected(
            "nothing to change: pass a status and/or a PR number".to_string(),
        ));
    }

    let _lock = RepoLock::acquire(handle.paths())?;
    let store = handle.store();
    let doc = store.load()?;
    let next = update_entry(&doc, &name, request.status, request.pr)?;
    store.save(&next)?;

    let entry = next
        .get(&name)
        .cloned()
        .ok_or_else(|| EngineError::Rejected(format!("branch '{}' was not recorded", name)))?;
    tracing::info!(branch = %name, status = %entry.status, pr = ?entry.pr, "updated branch");
    Ok(entry)
}
