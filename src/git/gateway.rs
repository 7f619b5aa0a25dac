//! git::gateway
//!
//! The narrow set of repository queries the engine depends on.
//!
//! # Design
//!
//! The engine never talks to `git2` directly. Everything it needs from a
//! repository goes through [`RepositoryGateway`], which has two
//! implementations:
//!
//! - [`crate::git::Git`] - backed by a real repository via `git2`
//! - [`crate::git::mock::MockGateway`] - in-memory, for deterministic tests
//!
//! All branch arguments are short local branch names (`feature/db`, not
//! `refs/heads/feature/db`).

use super::GitError;
use crate::core::types::BranchName;

/// Repository operations required by the dependency engine.
pub trait RepositoryGateway {
    /// Whether a local branch with this name exists.
    fn ref_exists(&self, name: &BranchName) -> bool;

    /// All local branch names, sorted.
    fn list_local_branch_names(&self) -> Result<Vec<BranchName>, GitError>;

    /// Subjects of commits reachable from `to` but not from `from`,
    /// oldest first.
    fn commit_subjects(&self, from: &BranchName, to: &BranchName)
        -> Result<Vec<String>, GitError>;

    /// Whether `remote` is configured, or any remote at all when `None`.
    fn has_remote(&self, remote: Option<&str>) -> Result<bool, GitError>;

    /// A runnable hint for configuring the named remote.
    fn remote_add_hint(&self, remote: &str) -> String {
        format!("git remote add {} <repository-url>", remote)
    }

    /// The checked-out branch, or `None` when HEAD is detached or unborn.
    fn current_branch(&self) -> Result<Option<BranchName>, GitError>;

    /// Create a local branch at the tip of `start_point`.
    fn create_branch(&self, name: &BranchName, start_point: &BranchName) -> Result<(), GitError>;

    /// Switch the working tree to `name`.
    fn checkout_branch(&self, name: &BranchName) -> Result<(), GitError>;

    /// The candidate whose tip is the closest proper ancestor of `branch`.
    ///
    /// Candidates at the same commit as `branch`, or descending from it,
    /// are never chosen. Ties keep the earlier candidate. `None` when no
    /// candidate is a proper ancestor.
    fn nearest_base(
        &self,
        branch: &BranchName,
        candidates: &[BranchName],
    ) -> Result<Option<BranchName>, GitError>;
}
