//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module is the **single doorway** to real repositories. No other
//! module imports `git2`. Errors are normalized into [`GitError`] so higher
//! layers can tell "not a repository" from "missing branch" from everything
//! else.
//!
//! # Example
//!
//! ```ignore
//! use specstack::git::{Git, RepositoryGateway};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! for name in git.list_local_branch_names()? {
//!     println!("{}", name);
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::gateway::RepositoryGateway;
use crate::core::types::{BranchName, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested branch or ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound { refname: String },

    /// A name read from the repository is not a valid branch name.
    #[error("invalid ref name: {message}")]
    InvalidRefName { message: String },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal { message: String },
}

impl GitError {
    /// Normalize a git2 error, naming what was being looked at.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        GitError::InvalidRefName {
            message: err.to_string(),
        }
    }
}

/// A real repository opened through `git2`.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    /// Open the repository containing `path`.
    ///
    /// `path` can be any directory inside the working tree.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// The working directory root.
    pub fn work_dir(&self) -> Result<PathBuf, GitError> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or(GitError::BareRepo)
    }

    fn branch_commit(&self, name: &BranchName) -> Result<git2::Commit<'_>, GitError> {
        let branch = self
            .repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .map_err(|e| GitError::from_git2(e, name.as_str()))?;
        branch
            .get()
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, name.as_str()))
    }

    /// Commits reachable from `tip` but not from `base`.
    fn commit_count(&self, base: git2::Oid, tip: git2::Oid) -> Result<usize, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(tip)?;
        revwalk.hide(base)?;
        Ok(revwalk.count())
    }
}

impl RepositoryGateway for Git {
    fn ref_exists(&self, name: &BranchName) -> bool {
        self.repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .is_ok()
    }

    fn list_local_branch_names(&self) -> Result<Vec<BranchName>, GitError> {
        let branches = self.repo.branches(Some(git2::BranchType::Local))?;

        let mut names = Vec::new();
        for branch in branches {
            let (branch, _) = branch?;
            if let Some(name) = branch.name().ok().flatten() {
                // Skip names git accepts but we cannot represent.
                if let Ok(branch_name) = BranchName::new(name) {
                    names.push(branch_name);
                }
            }
        }

        names.sort();
        Ok(names)
    }

    fn commit_subjects(
        &self,
        from: &BranchName,
        to: &BranchName,
    ) -> Result<Vec<String>, GitError> {
        let base = self.branch_commit(from)?.id();
        let tip = self.branch_commit(to)?.id();

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)?;
        revwalk.push(tip)?;
        revwalk.hide(base)?;

        let mut subjects = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            subjects.push(commit.summary().unwrap_or("").to_string());
        }
        Ok(subjects)
    }

    fn has_remote(&self, remote: Option<&str>) -> Result<bool, GitError> {
        let Some(remote) = remote else {
            return Ok(!self.repo.remotes()?.is_empty());
        };
        match self.repo.find_remote(remote) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) if e.code() == git2::ErrorCode::InvalidSpec => Ok(false),
            Err(e) => Err(GitError::from_git2(e, remote)),
        }
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None)
    }

    fn create_branch(&self, name: &BranchName, start_point: &BranchName) -> Result<(), GitError> {
        let commit = self.branch_commit(start_point)?;
        self.repo
            .branch(name.as_str(), &commit, false)
            .map_err(|e| GitError::from_git2(e, name.as_str()))?;
        tracing::debug!(branch = %name, start_point = %start_point, "created git branch");
        Ok(())
    }

    fn checkout_branch(&self, name: &BranchName) -> Result<(), GitError> {
        let refname = format!("refs/heads/{}", name);
        let commit = self.branch_commit(name)?;
        self.repo
            .checkout_tree(commit.as_object(), Some(git2::build::CheckoutBuilder::new().safe()))
            .map_err(|e| GitError::from_git2(e, &refname))?;
        self.repo
            .set_head(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;
        Ok(())
    }

    fn nearest_base(
        &self,
        branch: &BranchName,
        candidates: &[BranchName],
    ) -> Result<Option<BranchName>, GitError> {
        let tip = self.branch_commit(branch)?.id();

        let mut best: Option<(usize, &BranchName)> = None;
        for candidate in candidates.iter().filter(|c| *c != branch) {
            let Ok(commit) = self.branch_commit(candidate) else {
                continue;
            };
            let candidate_tip = commit.id();
            if candidate_tip == tip || !self.repo.graph_descendant_of(tip, candidate_tip)? {
                continue;
            }

            let distance = self.commit_count(candidate_tip, tip)?;
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, candidate));
            }
        }

        Ok(best.map(|(_, name)| name.clone()))
    }
}
