//! engine::import
//!
//! Adopt local branches that exist in Git but are not tracked yet.
//!
//! # Inference
//!
//! For every untracked local branch (other than the trunk), the base is the
//! closest proper ancestor among the trunk and the other local branches;
//! when none is found the trunk is used. A spec id is suggested when the
//! last path component of the name looks like `NNN-kebab-name`.
//!
//! # Modes
//!
//! - [`ImportMode::Batch`] applies every candidate at once. Spec ids come
//!   from an explicit assignment, then the name, then the default.
//! - [`ImportMode::Interactive`] changes nothing and hands the candidates
//!   back so the caller can ask which spec each belongs to.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::metadata::{BranchEntry, DependencyDocument};
use crate::core::ops::RepoLock;
use crate::core::stack::create_entry;
use crate::core::types::{BranchName, SpecId};
use crate::git::RepositoryGateway;

use super::repo::RepoHandle;
use super::{EngineError, Signal};

/// An untracked local branch and what could be inferred about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCandidate {
    pub name: BranchName,
    pub inferred_base: BranchName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_spec: Option<SpecId>,
}

#[derive(Debug, Clone)]
pub enum ImportMode {
    Batch {
        default_spec: Option<SpecId>,
        assignments: BTreeMap<BranchName, SpecId>,
    },
    Interactive,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ImportOutcome {
    Imported {
        entries: Vec<BranchEntry>,
    },
    NeedsDisambiguation {
        candidates: Vec<ImportCandidate>,
        #[serde(rename = "knownSpecs")]
        known_specs: Vec<SpecId>,
    },
    NothingToImport,
}

impl ImportOutcome {
    pub fn signal(&self) -> Signal {
        match self {
            ImportOutcome::NeedsDisambiguation { .. } => Signal::NeedsDisambiguation,
            ImportOutcome::Imported { .. } | ImportOutcome::NothingToImport => Signal::Created,
        }
    }
}

/// List untracked local branches with their inferred base and spec.
pub fn plan_import<G: RepositoryGateway>(
    handle: &RepoHandle<G>,
    doc: &DependencyDocument,
) -> Result<Vec<ImportCandidate>, EngineError> {
    let trunk = handle.trunk()?;
    let git = handle.gateway();
    let local = git.list_local_branch_names()?;

    // Trunk first so it wins ties.
    let mut bases = vec![trunk.clone()];
    bases.extend(local.iter().filter(|b| **b != trunk).cloned());

    let mut candidates = Vec::new();
    for name in local.iter().filter(|b| **b != trunk && !doc.contains(b)) {
        let others: Vec<BranchName> = bases.iter().filter(|b| *b != name).cloned().collect();
        let inferred_base = git
            .nearest_base(name, &others)?
            .unwrap_or_else(|| trunk.clone());
        tracing::debug!(branch = %name, base = %inferred_base, "import candidate");

        candidates.push(ImportCandidate {
            suggested_spec: SpecId::new(name.leaf()).ok(),
            name: name.clone(),
            inferred_base,
        });
    }
    Ok(candidates)
}

/// Import untracked branches according to `mode`.
pub fn import<G: RepositoryGateway>(
    handle: &RepoHandle<G>,
    mode: &ImportMode,
) -> Result<ImportOutcome, EngineError> {
    let (default_spec, assignments) = match mode {
        ImportMode::Interactive => {
            let doc = handle.read()?;
            let candidates = plan_import(handle, &doc)?;
            if candidates.is_empty() {
                return Ok(ImportOutcome::NothingToImport);
            }
            return Ok(ImportOutcome::NeedsDisambiguation {
                candidates,
                known_specs: doc.spec_ids().into_iter().cloned().collect(),
            });
        }
        ImportMode::Batch {
            default_spec,
            assignments,
        } => (default_spec, assignments),
    };

    let _lock = RepoLock::acquire(handle.paths())?;
    let store = handle.store();
    let doc = store.load()?;
    let candidates = plan_import(handle, &doc)?;

    let names: BTreeSet<&BranchName> = candidates.iter().map(|c| &c.name).collect();
    if let Some(stray) = assignments.keys().find(|b| !names.contains(b)) {
        return Err(EngineError::Rejected(format!(
            "cannot assign a spec to '{}': it is not an untracked local branch",
            stray
        )));
    }
    if candidates.is_empty() {
        return Ok(ImportOutcome::NothingToImport);
    }

    let mut resolved = Vec::with_capacity(candidates.len());
    let mut unresolved = Vec::new();
    for candidate in &candidates {
        let spec = assignments
            .get(&candidate.name)
            .or(candidate.suggested_spec.as_ref())
            .or(default_spec.as_ref());
        match spec {
            Some(spec) => resolved.push((candidate, spec.clone())),
            None => unresolved.push(candidate.name.to_string()),
        }
    }
    if !unresolved.is_empty() {
        return Err(EngineError::Rejected(format!(
            "no spec id for: {}; pass --default-spec or --assign <branch>=<spec>",
            unresolved.join(", ")
        )));
    }

    let mut next = doc;
    let mut imported = Vec::new();
    for (candidate, spec) in bases_first(resolved)? {
        next = create_entry(
            &next,
            candidate.name.clone(),
            spec,
            candidate.inferred_base.clone(),
            None,
        )?;
        imported.push(candidate.name.clone());
    }
    store.save(&next)?;
    tracing::info!(count = imported.len(), "imported branches");

    let entries = imported
        .iter()
        .filter_map(|name| next.get(name).cloned())
        .collect();
    Ok(ImportOutcome::Imported { entries })
}

/// Order candidates so a branch comes after any candidate it is based on.
fn bases_first(
    mut pending: Vec<(&ImportCandidate, SpecId)>,
) -> Result<Vec<(&ImportCandidate, SpecId)>, EngineError> {
    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let waiting: BTreeSet<BranchName> = pending.iter().map(|(c, _)| c.name.clone()).collect();
        let (ready, blocked): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|(c, _)| !waiting.contains(&c.inferred_base));
        if ready.is_empty() {
            return Err(EngineError::Rejected(
                "inferred bases form a cycle; import these branches one at a time".to_string(),
            ));
        }
        ordered.extend(ready);
        pending = blocked;
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::engine::repo::RepoRole;
    use crate::git::mock::MockGateway;
    use tempfile::TempDir;

    fn b(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    fn s(id: &str) -> SpecId {
        SpecId::new(id).unwrap()
    }

    fn handle(git: MockGateway) -> (TempDir, RepoHandle<MockGateway>) {
        let temp = TempDir::new().unwrap();
        let handle = RepoHandle::from_parts(
            temp.path().to_path_buf(),
            git,
            RepoRole::Standalone,
            Config::default(),
        );
        (temp, handle)
    }

    /// main <- db <- api, plus an unrelated branch off main.
    fn stacked_repo() -> MockGateway {
        let git = MockGateway::new("main");
        git.add_branch("feature/001-user-auth", "main");
        git.commit("feature/001-user-auth", "Add users table");
        git.add_branch("feature/api", "feature/001-user-auth");
        git.commit("feature/api", "Add endpoints");
        git.add_branch("docs", "main");
        git.commit("docs", "Write docs");
        git
    }

    fn batch(default_spec: Option<&str>, assign: &[(&str, &str)]) -> ImportMode {
        ImportMode::Batch {
            default_spec: default_spec.map(s),
            assignments: assign.iter().map(|(n, id)| (b(n), s(id))).collect(),
        }
    }

    #[test]
    fn plan_infers_bases_and_specs() {
        let (_t, h) = handle(stacked_repo());
        let plan = plan_import(&h, &DependencyDocument::empty()).unwrap();

        let by_name: BTreeMap<_, _> = plan.iter().map(|c| (c.name.as_str(), c)).collect();
        assert_eq!(by_name.len(), 3);
        assert_eq!(by_name["feature/api"].inferred_base, b("feature/001-user-auth"));
        assert_eq!(by_name["feature/001-user-auth"].inferred_base, b("main"));
        assert_eq!(by_name["docs"].inferred_base, b("main"));
        assert_eq!(
            by_name["feature/001-user-auth"].suggested_spec,
            Some(s("001-user-auth"))
        );
        assert_eq!(by_name["docs"].suggested_spec, None);
    }

    #[test]
    fn branch_at_trunk_tip_falls_back_to_trunk() {
        let git = MockGateway::new("main");
        git.add_branch("fresh", "main");
        let (_t, h) = handle(git);

        let plan = plan_import(&h, &DependencyDocument::empty()).unwrap();
        assert_eq!(plan[0].inferred_base, b("main"));
    }

    #[test]
    fn batch_applies_in_dependency_order() {
        let (_t, h) = handle(stacked_repo());
        let outcome = import(
            &h,
            &batch(Some("009-misc"), &[("feature/api", "001-user-auth")]),
        )
        .unwrap();

        let ImportOutcome::Imported { entries } = outcome else {
            panic!("expected import");
        };
        assert_eq!(entries.len(), 3);

        let doc = h.read().unwrap();
        let pos = |n: &str| doc.branches.iter().position(|e| e.name.as_str() == n).unwrap();
        assert!(pos("feature/001-user-auth") < pos("feature/api"));
        assert_eq!(doc.get(&b("docs")).unwrap().spec_id, s("009-misc"));
        assert_eq!(doc.get(&b("feature/api")).unwrap().spec_id, s("001-user-auth"));
        assert!(doc.check_consistency().is_ok());
    }

    #[test]
    fn batch_without_spec_rejected_and_nothing_saved() {
        let (_t, h) = handle(stacked_repo());
        let err = import(&h, &batch(None, &[])).unwrap_err();

        assert!(err.is_validation());
        assert!(err.to_string().contains("docs"));
        assert!(!h.store().path().exists());
    }

    #[test]
    fn assignment_to_unknown_branch_rejected() {
        let (_t, h) = handle(stacked_repo());
        let err = import(&h, &batch(Some("009-misc"), &[("main", "001-user-auth")])).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn interactive_returns_candidates_without_writing() {
        let (_t, h) = handle(stacked_repo());
        let outcome = import(&h, &ImportMode::Interactive).unwrap();

        assert_eq!(outcome.signal(), Signal::NeedsDisambiguation);
        let ImportOutcome::NeedsDisambiguation { candidates, .. } = outcome else {
            panic!("expected disambiguation");
        };
        assert_eq!(candidates.len(), 3);
        assert!(!h.paths().tool_dir().exists());
    }

    #[test]
    fn nothing_to_import() {
        let (_t, h) = handle(MockGateway::new("main"));
        let outcome = import(&h, &batch(Some("009-misc"), &[])).unwrap();
        assert!(matches!(outcome, ImportOutcome::NothingToImport));
    }
}
