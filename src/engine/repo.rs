//! engine::repo
//!
//! The explicit, repository-scoped handle every operation receives.
//!
//! # Architecture
//!
//! A [`RepoHandle`] bundles everything an operation may touch for one
//! repository: its working directory, its [`ToolPaths`], its gateway, its
//! loaded configuration, and its role in a workspace. Two handles never
//! share a document, so operations in one repository cannot observe or
//! mutate another's state.

use std::path::{Path, PathBuf};

use crate::core::config::Config;
use crate::core::metadata::{DependencyDocument, DependencyStore};
use crate::core::paths::ToolPaths;
use crate::core::types::BranchName;
use crate::core::workspace::{find_enclosing_workspace, WorkspaceChild, WorkspaceManifest};
use crate::git::{Git, RepositoryGateway};

use super::trunk;
use super::EngineError;

/// Where a repository sits in a multi-repository workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoRole {
    /// Not part of any workspace.
    Standalone,
    /// Holds `.specstack/workspace.toml` and orchestrates children.
    WorkspaceRoot { children: Vec<WorkspaceChild> },
    /// Listed by the workspace at `workspace_root`.
    Child {
        workspace_root: PathBuf,
        short_name: String,
    },
}

impl RepoRole {
    pub fn is_child(&self) -> bool {
        matches!(self, RepoRole::Child { .. })
    }

    /// The child's short name, used as a PR title prefix.
    pub fn short_name(&self) -> Option<&str> {
        match self {
            RepoRole::Child { short_name, .. } => Some(short_name),
            _ => None,
        }
    }

    /// Work out the role of the repository at `root` from the filesystem.
    pub fn detect(root: &Path) -> Result<Self, EngineError> {
        if let Some(manifest) = WorkspaceManifest::load(root)? {
            let children = manifest.resolve_children(root)?;
            return Ok(RepoRole::WorkspaceRoot { children });
        }
        match find_enclosing_workspace(root)? {
            Some((workspace_root, child)) => Ok(RepoRole::Child {
                workspace_root,
                short_name: child.short_name,
            }),
            None => Ok(RepoRole::Standalone),
        }
    }
}

/// Handle to one repository.
#[derive(Debug)]
pub struct RepoHandle<G: RepositoryGateway> {
    root: PathBuf,
    paths: ToolPaths,
    gateway: G,
    role: RepoRole,
    config: Config,
}

impl RepoHandle<Git> {
    /// Open the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let git = Git::open(path)?;
        let root = git.work_dir()?;
        Self::with_gateway(root, git)
    }
}

impl<G: RepositoryGateway> RepoHandle<G> {
    /// Build a handle, detecting the workspace role and loading config.
    pub fn with_gateway(root: PathBuf, gateway: G) -> Result<Self, EngineError> {
        let role = RepoRole::detect(&root)?;
        let paths = ToolPaths::new(root.clone());
        let config = Config::load(Some(&paths))?;
        tracing::debug!(root = %root.display(), role = ?role, "opened repository");
        Ok(Self::from_parts(root, gateway, role, config))
    }

    /// Build a handle from already-resolved parts.
    pub fn from_parts(root: PathBuf, gateway: G, role: RepoRole, config: Config) -> Self {
        Self {
            paths: ToolPaths::new(root.clone()),
            root,
            gateway,
            role,
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self) -> &ToolPaths {
        &self.paths
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn role(&self) -> &RepoRole {
        &self.role
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Display name: the short name in a workspace, else the directory name.
    pub fn display_name(&self) -> String {
        if let Some(short) = self.role.short_name() {
            return short.to_string();
        }
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    pub fn store(&self) -> DependencyStore {
        DependencyStore::new(&self.paths)
    }

    /// Read the document without taking the lock or writing a migration back.
    pub fn read(&self) -> Result<DependencyDocument, EngineError> {
        Ok(self.store().read()?)
    }

    /// The trunk branch: the configured override, else detected.
    ///
    /// A configured trunk must exist as a local branch.
    pub fn trunk(&self) -> Result<BranchName, EngineError> {
        if let Some(configured) = self.config.trunk() {
            let trunk = BranchName::new(configured)?;
            if !self.gateway.ref_exists(&trunk) {
                return Err(EngineError::Rejected(format!(
                    "configured trunk '{}' is not a local branch; fix `trunk` in {}",
                    trunk,
                    self.paths.repo_config_path().display()
                )));
            }
            return Ok(trunk);
        }
        let names = self.gateway.list_local_branch_names()?;
        Ok(trunk::detect(&names)?)
    }
}
