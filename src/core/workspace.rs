//! core::workspace
//!
//! Workspace manifest and child discovery.
//!
//! # Layout
//!
//! A workspace root is a repository containing `.specstack/workspace.toml`:
//!
//! ```toml
//! children = ["api", "web"]
//! ```
//!
//! Child paths are relative to the root. An empty or missing `children`
//! list means "every immediate subdirectory that contains `.git`".
//!
//! A repository is a child when some ancestor directory is a workspace
//! root whose resolved children include it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::paths::ToolPaths;

/// Errors from workspace discovery.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to read workspace manifest '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse workspace manifest '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid workspace child '{child}': {reason}")]
    InvalidChild { child: String, reason: String },
}

/// Contents of `.specstack/workspace.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceManifest {
    pub children: Vec<String>,
}

/// One child repository of a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceChild {
    /// Short name used in titles and status headings.
    pub short_name: String,
    /// Absolute path of the child's working directory.
    pub path: PathBuf,
}

impl WorkspaceManifest {
    /// Read the manifest in `root`, if it is a workspace root.
    pub fn load(root: &Path) -> Result<Option<Self>, WorkspaceError> {
        let path = ToolPaths::new(root.to_path_buf()).workspace_manifest_path();
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(WorkspaceError::Read { path, source }),
        };

        let manifest: WorkspaceManifest =
            toml::from_str(&contents).map_err(|e| WorkspaceError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Ok(Some(manifest))
    }

    /// Resolve the children of the workspace rooted at `root`.
    pub fn resolve_children(&self, root: &Path) -> Result<Vec<WorkspaceChild>, WorkspaceError> {
        if self.children.is_empty() {
            return discover_children(root);
        }

        self.children
            .iter()
            .map(|child| {
                let relative = Path::new(child);
                if child.is_empty()
                    || relative.is_absolute()
                    || relative
                        .components()
                        .any(|c| matches!(c, std::path::Component::ParentDir))
                {
                    return Err(WorkspaceError::InvalidChild {
                        child: child.clone(),
                        reason: "must be a relative path inside the workspace root".into(),
                    });
                }
                Ok(WorkspaceChild {
                    short_name: short_name_of(relative),
                    path: root.join(relative),
                })
            })
            .collect()
    }
}

/// Immediate subdirectories of `root` that contain `.git`, sorted by name.
fn discover_children(root: &Path) -> Result<Vec<WorkspaceChild>, WorkspaceError> {
    let entries = fs::read_dir(root).map_err(|source| WorkspaceError::Read {
        path: root.to_path_buf(),
        source,
    })?;

    let mut children: Vec<WorkspaceChild> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.join(".git").exists())
        .map(|path| WorkspaceChild {
            short_name: short_name_of(&path),
            path,
        })
        .collect();
    children.sort_by(|a, b| a.short_name.cmp(&b.short_name));
    Ok(children)
}

fn short_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Find the workspace that lists `repo_root` as a child.
///
/// Returns the workspace root and the child's entry.
pub fn find_enclosing_workspace(
    repo_root: &Path,
) -> Result<Option<(PathBuf, WorkspaceChild)>, WorkspaceError> {
    for ancestor in repo_root.ancestors().skip(1) {
        let Some(manifest) = WorkspaceManifest::load(ancestor)? else {
            continue;
        };
        let children = manifest.resolve_children(ancestor)?;
        if let Some(child) = children.into_iter().find(|c| same_dir(&c.path, repo_root)) {
            return Ok(Some((ancestor.to_path_buf(), child)));
        }
    }
    Ok(None)
}
