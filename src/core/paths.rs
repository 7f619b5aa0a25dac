//! core::paths
//!
//! Centralized path routing for specstack storage locations.
//!
//! # Storage Layout
//!
//! All per-repository data lives in the tool-private directory
//! `<work_dir>/.specstack/`:
//! - `dependencies.json` - The dependency document
//! - `config.toml` - Repository configuration
//! - `workspace.toml` - Present only at a workspace root
//! - `lock` - Advisory lock for load-mutate-save
//!
//! No code outside this module should compute `*.join(".specstack")` paths.
//!
//! # Example
//!
//! ```
//! use specstack::core::paths::ToolPaths;
//! use std::path::PathBuf;
//!
//! let paths = ToolPaths::new(PathBuf::from("/work/api"));
//! assert_eq!(
//!     paths.document_path(),
//!     PathBuf::from("/work/api/.specstack/dependencies.json")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Name of the tool-private directory inside a repository.
pub const TOOL_DIR: &str = ".specstack";

/// Paths for one repository's specstack storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// Repository working directory.
    pub work_dir: PathBuf,
}

impl ToolPaths {
    pub fn new(work_dir: PathBuf) -> Self {
        Self { work_dir }
    }

    /// `<work_dir>/.specstack`
    pub fn tool_dir(&self) -> PathBuf {
        self.work_dir.join(TOOL_DIR)
    }

    /// `<work_dir>/.specstack/dependencies.json`
    pub fn document_path(&self) -> PathBuf {
        self.tool_dir().join("dependencies.json")
    }

    /// `<work_dir>/.specstack/config.toml`
    pub fn repo_config_path(&self) -> PathBuf {
        self.tool_dir().join("config.toml")
    }

    /// `<work_dir>/.specstack/workspace.toml`
    pub fn workspace_manifest_path(&self) -> PathBuf {
        self.tool_dir().join("workspace.toml")
    }

    /// `<work_dir>/.specstack/lock`
    pub fn lock_path(&self) -> PathBuf {
        self.tool_dir().join("lock")
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}
