//! core::stack
//!
//! Pure document mutations and stack traversal.
//!
//! # Architecture
//!
//! Every function here takes a document and returns a new one (or a view
//! of it). Nothing touches the filesystem or Git; base validation against
//! the repository happens in the engine before these are called.
//!
//! # Example
//!
//! ```
//! use specstack::core::metadata::DependencyDocument;
//! use specstack::core::stack::{create_entry, resolve_stack};
//! use specstack::core::types::{BranchName, SpecId};
//!
//! let spec = SpecId::new("001-user-auth").unwrap();
//! let main = BranchName::new("main").unwrap();
//! let db = BranchName::new("feature/db").unwrap();
//! let api = BranchName::new("feature/api").unwrap();
//!
//! let doc = DependencyDocument::empty();
//! let doc = create_entry(&doc, db.clone(), spec.clone(), main, None).unwrap();
//! let doc = create_entry(&doc, api.clone(), spec, db.clone(), None).unwrap();
//!
//! let names: Vec<_> = resolve_stack(&doc, &api).into_iter().map(|e| e.name).collect();
//! assert_eq!(names, vec![db, api]);
//! ```

use thiserror::Error;

use super::metadata::schema::{BranchEntry, BranchStatus, DependencyDocument};
use super::types::{BranchName, SpecId};

/// Errors from stack mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackError {
    #[error("branch '{0}' is already tracked")]
    DuplicateBranchName(BranchName),

    #[error("branch '{0}' cannot be based on itself")]
    SelfReference(BranchName),

    #[error("branch '{0}' is not tracked")]
    UnknownBranch(BranchName),
}

/// Append a new `active` entry and index it under its spec.
///
/// Rejects a name that is already tracked or a base equal to the name.
pub fn create_entry(
    doc: &DependencyDocument,
    name: BranchName,
    spec_id: SpecId,
    base: BranchName,
    parent_spec_id: Option<SpecId>,
) -> Result<DependencyDocument, StackError> {
    if doc.contains(&name) {
        return Err(StackError::DuplicateBranchName(name));
    }
    if base == name {
        return Err(StackError::SelfReference(name));
    }

    let mut next = doc.clone();
    next.spec_index
        .entry(spec_id.clone())
        .or_default()
        .push(name.clone());
    next.branches
        .push(BranchEntry::new(name, spec_id, base, parent_spec_id));
    Ok(next)
}

/// The chain of tracked entries ending at `name`, root first.
///
/// Follows base pointers until reaching a base that is not tracked (the
/// trunk or an untracked local branch), which is excluded. Bounded by the
/// number of entries, so a corrupt cyclic document cannot loop forever.
/// Returns an empty chain when `name` is not tracked.
pub fn resolve_stack(doc: &DependencyDocument, name: &BranchName) -> Vec<BranchEntry> {
    let mut chain = Vec::new();
    let mut current = doc.get(name);

    while let Some(entry) = current {
        if chain.len() >= doc.branches.len() {
            break;
        }
        chain.push(entry.clone());
        current = doc.get(&entry.base_branch);
    }

    chain.reverse();
    chain
}

/// Change an entry's status and/or PR number and bump `updatedAt`.
pub fn update_entry(
    doc: &DependencyDocument,
    name: &BranchName,
    status: Option<BranchStatus>,
    pr: Option<u64>,
) -> Result<DependencyDocument, StackError> {
    let mut next = doc.clone();
    let entry = next
        .get_mut(name)
        .ok_or_else(|| StackError::UnknownBranch(name.clone()))?;

    if let Some(status) = status {
        entry.status = status;
    }
    if let Some(pr) = pr {
        entry.pr = Some(pr);
    }
    entry.touch();
    Ok(next)
}
