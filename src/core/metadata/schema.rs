//! core::metadata::schema
//!
//! Dependency document schema (current version).
//!
//! # Schema Design
//!
//! - Self-describing: carries `schemaVersion`
//! - Closed enums: `status` is parsed into [`BranchStatus`], never kept as a string
//! - Strict parsing: unknown fields are rejected
//!
//! # Invariants
//!
//! [`DependencyDocument::check_consistency`] verifies the invariants that can be
//! decided from the document alone:
//!
//! - branch names are unique
//! - `specIndex` is exactly derived from `branches`
//! - base-branch pointers form a forest (no cycles)
//! - `updatedAt >= createdAt`
//! - `parentSpecId` is a valid spec id (enforced by [`SpecId`] at parse time)
//!
//! Whether a base resolves inside this repository needs the Git gateway, so
//! the engine checks it before any mutation.
//!
//! # Example
//!
//! ```
//! use specstack::core::metadata::schema::{parse_document, DependencyDocument};
//!
//! let doc = DependencyDocument::empty();
//! let json = doc.to_json().unwrap();
//! let parsed = parse_document(&json).unwrap();
//! assert_eq!(parsed, doc);
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::graph::StackGraph;
use crate::core::types::{BranchName, SchemaVersion, SpecId, UtcTimestamp};

/// Current schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: SchemaVersion = SchemaVersion::new(1, 1, 0);

/// Errors from document parsing and consistency checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("failed to parse document: {0}")]
    Parse(String),

    #[error("schema version {found} is not the current version {}", CURRENT_SCHEMA_VERSION)]
    VersionMismatch { found: SchemaVersion },

    #[error("branch '{0}' appears more than once")]
    DuplicateBranch(String),

    #[error("spec index out of sync for spec '{spec}': {detail}")]
    SpecIndexMismatch { spec: String, detail: String },

    #[error("base-branch cycle detected at '{0}'")]
    Cycle(String),

    #[error("branch '{0}' has updatedAt earlier than createdAt")]
    TimestampOrder(String),
}

/// Lifecycle status of a tracked branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    /// Work in progress, no PR submitted yet
    Active,
    /// A pull request has been opened
    Submitted,
    /// The pull request was merged
    Merged,
    /// The branch was given up on
    Abandoned,
}

impl BranchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchStatus::Active => "active",
            BranchStatus::Submitted => "submitted",
            BranchStatus::Merged => "merged",
            BranchStatus::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BranchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BranchStatus::Active),
            "submitted" => Ok(BranchStatus::Submitted),
            "merged" => Ok(BranchStatus::Merged),
            "abandoned" => Ok(BranchStatus::Abandoned),
            other => Err(format!(
                "unknown status '{other}', expected active|submitted|merged|abandoned"
            )),
        }
    }
}

/// One tracked branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BranchEntry {
    pub name: BranchName,
    pub spec_id: SpecId,
    pub base_branch: BranchName,
    pub status: BranchStatus,
    pub pr: Option<u64>,
    pub created_at: UtcTimestamp,
    pub updated_at: UtcTimestamp,
    /// Only present in child repositories of a workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_spec_id: Option<SpecId>,
}

impl BranchEntry {
    /// Create a fresh `active` entry with both timestamps set to now.
    pub fn new(
        name: BranchName,
        spec_id: SpecId,
        base_branch: BranchName,
        parent_spec_id: Option<SpecId>,
    ) -> Self {
        let now = UtcTimestamp::now();
        Self {
            name,
            spec_id,
            base_branch,
            status: BranchStatus::Active,
            pr: None,
            created_at: now.clone(),
            updated_at: now,
            parent_spec_id,
        }
    }

    /// Update the `updatedAt` timestamp to now.
    pub fn touch(&mut self) {
        let now = UtcTimestamp::now();
        // Clock skew must not break updatedAt >= createdAt.
        self.updated_at = if now < self.created_at {
            self.created_at.clone()
        } else {
            now
        };
    }

    /// An entry still open for a PR suggestion: active and without a PR.
    pub fn is_unsubmitted(&self) -> bool {
        self.status == BranchStatus::Active && self.pr.is_none()
    }
}

/// The per-repository dependency document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DependencyDocument {
    pub schema_version: SchemaVersion,
    /// Insertion order is creation order.
    pub branches: Vec<BranchEntry>,
    pub spec_index: BTreeMap<SpecId, Vec<BranchName>>,
}

impl Default for DependencyDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl DependencyDocument {
    /// An empty document at the current schema version.
    pub fn empty() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            branches: Vec::new(),
            spec_index: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Look up a tracked branch by name.
    pub fn get(&self, name: &BranchName) -> Option<&BranchEntry> {
        self.branches.iter().find(|e| &e.name == name)
    }

    pub fn get_mut(&mut self, name: &BranchName) -> Option<&mut BranchEntry> {
        self.branches.iter_mut().find(|e| &e.name == name)
    }

    pub fn contains(&self, name: &BranchName) -> bool {
        self.get(name).is_some()
    }

    /// Spec ids in order of first appearance in `branches`.
    pub fn spec_ids(&self) -> Vec<&SpecId> {
        let mut seen = HashSet::new();
        self.branches
            .iter()
            .map(|e| &e.spec_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Entries belonging to `spec`, in creation order.
    pub fn entries_for_spec<'a>(
        &'a self,
        spec: &'a SpecId,
    ) -> impl Iterator<Item = &'a BranchEntry> + 'a {
        self.branches.iter().filter(move |e| &e.spec_id == spec)
    }

    /// Derive the spec index from `branches`.
    pub fn derived_spec_index(&self) -> BTreeMap<SpecId, Vec<BranchName>> {
        let mut index: BTreeMap<SpecId, Vec<BranchName>> = BTreeMap::new();
        for entry in &self.branches {
            index
                .entry(entry.spec_id.clone())
                .or_default()
                .push(entry.name.clone());
        }
        index
    }

    /// Replace `spec_index` with the one derived from `branches`.
    pub fn rebuild_spec_index(&mut self) {
        self.spec_index = self.derived_spec_index();
    }

    /// Build the base-branch graph for traversal.
    pub fn graph(&self) -> StackGraph {
        let mut graph = StackGraph::new();
        for entry in &self.branches {
            graph.add_edge(entry.name.clone(), entry.base_branch.clone());
        }
        graph
    }

    /// Verify the document-local invariants (1, 3, 4, 5).
    pub fn check_consistency(&self) -> Result<(), DocumentError> {
        let mut names = HashSet::new();
        for entry in &self.branches {
            if !names.insert(&entry.name) {
                return Err(DocumentError::DuplicateBranch(entry.name.to_string()));
            }
            if entry.updated_at < entry.created_at {
                return Err(DocumentError::TimestampOrder(entry.name.to_string()));
            }
        }

        let derived = self.derived_spec_index();
        for (spec, expected) in &derived {
            let stored: HashSet<&BranchName> = self
                .spec_index
                .get(spec)
                .map(|v| v.iter().collect())
                .unwrap_or_default();
            let expected: HashSet<&BranchName> = expected.iter().collect();
            if stored != expected {
                return Err(DocumentError::SpecIndexMismatch {
                    spec: spec.to_string(),
                    detail: "indexed branches differ from branches with this spec".into(),
                });
            }
        }
        for (spec, stored) in &self.spec_index {
            if !derived.contains_key(spec) {
                return Err(DocumentError::SpecIndexMismatch {
                    spec: spec.to_string(),
                    detail: format!("{} stale entries for a spec with no branches", stored.len()),
                });
            }
            let unique: HashSet<&BranchName> = stored.iter().collect();
            if unique.len() != stored.len() {
                return Err(DocumentError::SpecIndexMismatch {
                    spec: spec.to_string(),
                    detail: "a branch is listed more than once".into(),
                });
            }
        }

        if let Some(branch) = self.graph().find_cycle() {
            return Err(DocumentError::Cycle(branch.to_string()));
        }

        Ok(())
    }

    /// Serialize to pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| DocumentError::Parse(e.to_string()))
    }
}

/// Parse a current-version document and check its consistency.
///
/// Older versions must go through [`crate::core::metadata::migrate`] first;
/// this parser only accepts [`CURRENT_SCHEMA_VERSION`].
///
/// # Example
///
/// ```
/// use specstack::core::metadata::schema::{parse_document, BranchStatus};
///
/// let json = r#"{
///     "schemaVersion": "1.1.0",
///     "branches": [{
///         "name": "feature/db",
///         "specId": "001-user-auth",
///         "baseBranch": "main",
///         "status": "active",
///         "pr": null,
///         "createdAt": "2024-01-01T00:00:00Z",
///         "updatedAt": "2024-01-01T00:00:00Z"
///     }],
///     "specIndex": { "001-user-auth": ["feature/db"] }
/// }"#;
///
/// let doc = parse_document(json).unwrap();
/// assert_eq!(doc.branches[0].status, BranchStatus::Active);
/// ```
pub fn parse_document(json: &str) -> Result<DependencyDocument, DocumentError> {
    let doc: DependencyDocument =
        serde_json::from_str(json).map_err(|e| DocumentError::Parse(e.to_string()))?;
    if doc.schema_version != CURRENT_SCHEMA_VERSION {
        return Err(DocumentError::VersionMismatch {
            found: doc.schema_version,
        });
    }
    doc.check_consistency()?;
    Ok(doc)
}
