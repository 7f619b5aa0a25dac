//! engine::create
//!
//! Create and track a stacked branch.
//!
//! # Flow
//!
//! 1. Parse the name and spec id; a parent spec is only allowed in a child
//!    repository of a workspace.
//! 2. Lock, load the document, resolve the trunk, validate the base.
//! 3. Build the new document (rejects duplicates) before touching Git.
//! 4. Create the Git branch when it does not exist yet, then save.
//! 5. Check out the branch when asked. The entry is already saved, so a
//!    failed checkout is a warning.
//! 6. Report: a missing remote becomes a warning; otherwise the branch
//!    being stacked on may yield a PR suggestion.

use serde::Serialize;

use crate::core::metadata::BranchEntry;
use crate::core::ops::RepoLock;
use crate::core::stack::create_entry;
use crate::core::types::{BranchName, SpecId};
use crate::git::{GitError, RepositoryGateway};

use super::repo::RepoHandle;
use super::suggest::{should_suggest, suggest, PRSuggestion, RepoMetadata};
use super::validate::validate;
use super::{EngineError, Signal, Warning};

/// Input to [`create`]. Raw strings are validated by the operation.
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub name: String,
    pub spec_id: String,
    /// Defaults to the trunk.
    pub base: Option<String>,
    /// Spec of the workspace root this work belongs to.
    pub parent_spec_id: Option<String>,
    /// Switch to the new branch afterwards.
    pub checkout: bool,
}

/// Result of a successful [`create`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutcome {
    pub entry: BranchEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<PRSuggestion>,
    pub warnings: Vec<Warning>,
    /// False when the Git branch already existed and was only tracked.
    pub branch_created: bool,
}

impl CreateOutcome {
    pub fn signal(&self) -> Signal {
        if !self.warnings.is_empty() {
            Signal::CreatedWithWarning
        } else if self.suggestion.is_some() {
            Signal::CreatedWithSuggestion
        } else {
            Signal::Created
        }
    }
}

/// Create `request.name` on top of its base and record it.
pub fn create<G: RepositoryGateway>(
    handle: &RepoHandle<G>,
    request: &CreateRequest,
) -> Result<CreateOutcome, EngineError> {
    let name = BranchName::new(request.name.as_str())?;
    let spec_id = SpecId::new(request.spec_id.as_str())?;
    let parent_spec_id = request
        .parent_spec_id
        .as_deref()
        .map(SpecId::new)
        .transpose()?;
    if parent_spec_id.is_some() && !handle.role().is_child() {
        return Err(EngineError::Rejected(
            "--parent-spec is only valid in a child repository of a workspace".to_string(),
        ));
    }

    let _lock = RepoLock::acquire(handle.paths())?;
    let store = handle.store();
    let doc = store.load()?;

    let trunk = handle.trunk()?;
    if name == trunk {
        return Err(EngineError::Rejected(format!(
            "'{}' is the trunk branch and cannot be stacked",
            name
        )));
    }
    let base = match &request.base {
        Some(base) => BranchName::new(base.as_str())?,
        None => trunk.clone(),
    };

    let git = handle.gateway();
    let local = git.list_local_branch_names()?;
    validate(&trunk, &base, &local)?;

    let next = create_entry(&doc, name.clone(), spec_id, base.clone(), parent_spec_id)?;

    let branch_created = if git.ref_exists(&name) {
        tracing::debug!(branch = %name, "branch exists, tracking only");
        false
    } else {
        git.create_branch(&name, &base)?;
        true
    };

    store.save(&next)?;
    tracing::info!(branch = %name, base = %base, "created stacked branch");

    let entry = next
        .get(&name)
        .cloned()
        .ok_or_else(|| EngineError::Rejected(format!("branch '{}' was not recorded", name)))?;

    let mut outcome = CreateOutcome {
        entry,
        suggestion: None,
        warnings: Vec::new(),
        branch_created,
    };

    if request.checkout {
        if let Err(err) = checkout(git, &name) {
            let warning = Warning::CheckoutFailed {
                branch: name.to_string(),
                reason: err.to_string(),
            };
            tracing::warn!("{}", warning);
            outcome.warnings.push(warning);
        }
    }

    let config = handle.config();
    let has_remote = git
        .has_remote(config.configured_remote())
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not read remotes");
            false
        });
    if !has_remote {
        let remote = config.remote();
        let warning = Warning::NoRemote {
            remote: remote.to_string(),
            hint: git.remote_add_hint(remote),
        };
        tracing::warn!("{}", warning);
        outcome.warnings.push(warning);
        return Ok(outcome);
    }

    if let Some(superseded) = next.get(&base) {
        match git.commit_subjects(&superseded.base_branch, &superseded.name) {
            Ok(subjects) if should_suggest(&doc, superseded, &subjects) => {
                let meta = RepoMetadata {
                    short_name: handle.role().short_name().map(str::to_string),
                    commit_subjects: subjects,
                    max_body_commits: handle.config().max_body_commits(),
                    stack_footer: handle.config().stack_footer(),
                };
                outcome.suggestion = Some(suggest(&next, &meta, superseded));
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(branch = %superseded.name, error = %err, "skipping PR suggestion");
            }
        }
    }

    Ok(outcome)
}

/// Switch to `name` unless it is already checked out.
fn checkout<G: RepositoryGateway>(git: &G, name: &BranchName) -> Result<(), GitError> {
    if git.current_branch()?.as_ref() == Some(name) {
        tracing::debug!(branch = %name, "already checked out");
        return Ok(());
    }
    git.checkout_branch(name)
}
