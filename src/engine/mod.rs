//! engine
//!
//! Orchestrates operations against one repository handle.
//!
//! # Architecture
//!
//! Every mutating operation follows the same lifecycle:
//!
//! ```text
//! Lock -> Load -> Validate -> Mutate (pure) -> Git side effects -> Save -> Report
//! ```
//!
//! - Validation runs before any branch is created or any byte is written.
//! - Document mutations come from [`crate::core::stack`] and are pure.
//! - The handle ([`repo::RepoHandle`]) is passed explicitly; there is no
//!   process-wide document.
//!
//! # Modules
//!
//! - [`repo`] - Repository handle and workspace role
//! - [`trunk`] - Trunk branch detection
//! - [`validate`] - Base branch validation
//! - [`suggest`] - PR suggestion building
//! - [`status`] - Tree rendering for one repository or a workspace
//! - [`create`] - Branch creation
//! - [`mark`] - Status and PR updates
//! - [`import`] - Adopting existing local branches

pub mod create;
pub mod import;
pub mod mark;
pub mod repo;
pub mod status;
pub mod suggest;
pub mod trunk;
pub mod validate;

pub use create::{create, CreateOutcome, CreateRequest};
pub use import::{import, plan_import, ImportCandidate, ImportMode, ImportOutcome};
pub use mark::{mark, MarkRequest};
pub use repo::{RepoHandle, RepoRole};
pub use status::{
    render_repository, render_workspace, repository_status, workspace_status, ChildSection,
    ChildStatus, RepoSection, WorkspaceReport,
};
pub use suggest::{suggest, PRSuggestion, RepoMetadata};
pub use trunk::{detect, EmptyRepository};
pub use validate::{validate, InvalidBaseError};

use std::path::PathBuf;

use serde::Serialize;

use crate::core::config::ConfigError;
use crate::core::metadata::StoreError;
use crate::core::ops::LockError;
use crate::core::stack::StackError;
use crate::core::types::TypeError;
use crate::core::workspace::WorkspaceError;
use crate::git::GitError;

/// Execution context for commands.
///
/// Global settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Print outcomes as JSON.
    pub json: bool,
}

/// Machine-readable outcome of an operation, mapped to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Succeeded with nothing further to report.
    Created,
    /// Succeeded and a PR suggestion is available.
    CreatedWithSuggestion,
    /// Succeeded with an environment warning.
    CreatedWithWarning,
    /// Nothing was changed; the caller must choose spec assignments.
    NeedsDisambiguation,
    /// Rejected before any mutation.
    ValidationRejected,
    /// Storage, Git, or environment failure.
    Failure,
}

impl Signal {
    pub fn exit_code(self) -> i32 {
        match self {
            Signal::Created => 0,
            Signal::Failure => 1,
            Signal::ValidationRejected => 2,
            Signal::CreatedWithSuggestion => 10,
            Signal::CreatedWithWarning => 11,
            Signal::NeedsDisambiguation => 12,
        }
    }
}

/// A condition that does not block the operation but must be surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// The repository has no remote, so no PR can be opened.
    NoRemote { remote: String, hint: String },
    /// The branch was created and tracked, but switching to it failed.
    CheckoutFailed { branch: String, reason: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::NoRemote { hint, .. } => write!(
                f,
                "No remote configured: PR creation is unavailable. Fix with: {}",
                hint
            ),
            Warning::CheckoutFailed { branch, reason } => write!(
                f,
                "Branch '{}' is tracked but could not be checked out: {}. Fix with: git checkout {}",
                branch, reason, branch
            ),
        }
    }
}

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    InvalidInput(#[from] TypeError),

    #[error(transparent)]
    InvalidBase(#[from] InvalidBaseError),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    EmptyRepository(#[from] EmptyRepository),

    /// A request that is well-formed but not allowed here.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl EngineError {
    /// Whether the request was rejected before any mutation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidInput(_)
                | EngineError::InvalidBase(_)
                | EngineError::Stack(_)
                | EngineError::EmptyRepository(_)
                | EngineError::Rejected(_)
        )
    }

    pub fn signal(&self) -> Signal {
        if self.is_validation() {
            Signal::ValidationRejected
        } else {
            Signal::Failure
        }
    }
}
