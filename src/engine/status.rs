//! engine::status
//!
//! Dependency tree views for one repository or a whole workspace.
//!
//! Branches are grouped by spec in first-seen order. Within a spec, an
//! entry nests under its base when the base belongs to the same spec;
//! otherwise it starts the group and shows where it stacks on:
//!
//! ```text
//! 001-user-auth
//! └── feature/db [active] #12 (base: main)
//!     └── feature/api [active]
//! ```

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::graph::StackGraph;
use crate::core::metadata::{BranchEntry, DependencyDocument, DependencyStore};
use crate::core::paths::ToolPaths;
use crate::git::RepositoryGateway;

use super::repo::{RepoHandle, RepoRole};
use super::{EngineError, Signal};

const NO_TRACKED: &str = "no tracked branches";

/// One repository's name and document.
#[derive(Debug, Clone, Serialize)]
pub struct RepoSection {
    pub name: String,
    pub document: DependencyDocument,
}

/// A child's document, or why it could not be read.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChildStatus {
    Loaded { document: DependencyDocument },
    /// The child directory is not checked out.
    Unavailable { reason: String },
    /// The child's document exists but cannot be trusted.
    Unreadable { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ChildSection {
    pub name: String,
    pub path: PathBuf,
    pub status: ChildStatus,
}

/// Status of a workspace root and all of its children.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceReport {
    pub root: RepoSection,
    pub children: Vec<ChildSection>,
}

impl WorkspaceReport {
    /// Children whose documents could not be read.
    pub fn unreadable(&self) -> impl Iterator<Item = &ChildSection> {
        self.children
            .iter()
            .filter(|c| matches!(c.status, ChildStatus::Unreadable { .. }))
    }

    /// `Failure` when any child document is unreadable.
    pub fn signal(&self) -> Signal {
        if self.unreadable().next().is_some() {
            Signal::Failure
        } else {
            Signal::Created
        }
    }
}

/// Load the status of the repository behind `handle`.
///
/// Read-only: an older document is migrated in memory and left on disk.
pub fn repository_status<G: RepositoryGateway>(
    handle: &RepoHandle<G>,
) -> Result<RepoSection, EngineError> {
    Ok(RepoSection {
        name: handle.display_name(),
        document: handle.store().read()?,
    })
}

/// Load the root document and every child's document.
///
/// A child that cannot be read is reported in its section; it does not
/// stop the other sections from loading. See [`WorkspaceReport::signal`].
pub fn workspace_status<G: RepositoryGateway>(
    handle: &RepoHandle<G>,
) -> Result<WorkspaceReport, EngineError> {
    let RepoRole::WorkspaceRoot { children } = handle.role() else {
        return Err(EngineError::Rejected(format!(
            "{} is not a workspace root (no .specstack/workspace.toml)",
            handle.root().display()
        )));
    };

    let root = repository_status(handle)?;
    let children = children
        .iter()
        .map(|child| {
            let status = if !child.path.is_dir() {
                ChildStatus::Unavailable {
                    reason: format!("directory {} not found", child.path.display()),
                }
            } else {
                match DependencyStore::new(&ToolPaths::new(child.path.clone())).read() {
                    Ok(document) => ChildStatus::Loaded { document },
                    Err(err) => {
                        tracing::warn!(child = %child.short_name, error = %err, "child document unreadable");
                        ChildStatus::Unreadable {
                            reason: err.to_string(),
                        }
                    }
                }
            };
            ChildSection {
                name: child.short_name.clone(),
                path: child.path.clone(),
                status,
            }
        })
        .collect();

    Ok(WorkspaceReport { root, children })
}

/// Render one repository: a heading, then its spec groups.
pub fn render_repository(name: &str, doc: &DependencyDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", name);
    render_body(&mut out, doc);
    out
}

/// Render the root section first, then one headed section per child.
pub fn render_workspace(root: &RepoSection, children: &[ChildSection]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "root: {}", root.name);
    render_body(&mut out, &root.document);

    for child in children {
        let _ = writeln!(out);
        let _ = writeln!(out, "child: {}", child.name);
        match &child.status {
            ChildStatus::Loaded { document } => render_body(&mut out, document),
            ChildStatus::Unavailable { reason } | ChildStatus::Unreadable { reason } => {
                let _ = writeln!(out, "  unavailable: {}", reason);
            }
        }
    }
    out
}

fn render_body(out: &mut String, doc: &DependencyDocument) {
    if doc.is_empty() {
        let _ = writeln!(out, "  {}", NO_TRACKED);
        return;
    }

    let graph = doc.graph();
    for spec in doc.spec_ids() {
        let _ = writeln!(out, "{}", spec);
        let roots: Vec<&BranchEntry> = doc
            .entries_for_spec(spec)
            .filter(|e| doc.get(&e.base_branch).map(|b| &b.spec_id) != Some(spec))
            .collect();

        let mut seen = BTreeSet::new();
        let count = roots.len();
        for (i, entry) in roots.into_iter().enumerate() {
            let node = Node {
                entry,
                prefix: String::new(),
                last: i + 1 == count,
                is_root: true,
            };
            render_entry(out, doc, &graph, node, &mut seen);
        }
    }
}

struct Node<'a> {
    entry: &'a BranchEntry,
    prefix: String,
    last: bool,
    is_root: bool,
}

fn render_entry<'a>(
    out: &mut String,
    doc: &'a DependencyDocument,
    graph: &StackGraph,
    node: Node<'a>,
    seen: &mut BTreeSet<&'a str>,
) {
    let entry = node.entry;
    if !seen.insert(entry.name.as_str()) {
        return;
    }

    let connector = if node.last { "└── " } else { "├── " };
    let _ = write!(out, "{}{}{} [{}]", node.prefix, connector, entry.name, entry.status);
    if let Some(pr) = entry.pr {
        let _ = write!(out, " #{}", pr);
    }
    if node.is_root {
        let _ = write!(out, " (base: {})", entry.base_branch);
    }
    let _ = writeln!(out);

    let child_prefix = format!("{}{}", node.prefix, if node.last { "    " } else { "│   " });
    let children: Vec<&BranchEntry> = graph
        .children(&entry.name)
        .iter()
        .filter_map(|name| doc.get(name))
        .filter(|child| child.spec_id == entry.spec_id)
        .collect();
    let count = children.len();
    for (i, child) in children.into_iter().enumerate() {
        let node = Node {
            entry: child,
            prefix: child_prefix.clone(),
            last: i + 1 == count,
            is_root: false,
        };
        render_entry(out, doc, graph, node, seen);
    }
}
