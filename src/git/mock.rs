//! git::mock
//!
//! In-memory repository gateway for deterministic testing.
//!
//! # Design
//!
//! Branches are modelled as linear commit histories of `(id, subject)`
//! pairs. A new branch copies the history of its start point, so ancestry
//! is a prefix check. That is enough to answer every [`RepositoryGateway`]
//! query without a real repository.
//!
//! # Example
//!
//! ```
//! use specstack::git::mock::MockGateway;
//! use specstack::git::RepositoryGateway;
//! use specstack::core::types::BranchName;
//!
//! let git = MockGateway::new("main");
//! git.add_branch("feature/db", "main");
//! git.commit("feature/db", "Add users table");
//!
//! let main = BranchName::new("main").unwrap();
//! let db = BranchName::new("feature/db").unwrap();
//! assert_eq!(git.commit_subjects(&main, &db).unwrap(), vec!["Add users table"]);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use super::gateway::RepositoryGateway;
use super::GitError;
use crate::core::types::BranchName;

/// Mock gateway for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>`; clones share state.
#[derive(Debug, Clone)]
pub struct MockGateway {
    inner: Arc<Mutex<MockInner>>,
}

#[derive(Debug, Default)]
struct MockInner {
    branches: BTreeMap<String, MockBranch>,
    remotes: BTreeSet<String>,
    head: Option<String>,
    /// Recorded mutations for verification.
    operations: Vec<MockOperation>,
    /// Make `create_branch` fail (for error-path tests).
    fail_create: bool,
    /// Make `checkout_branch` fail, as a dirty working tree would.
    fail_checkout: bool,
}

/// A branch as a full linear history of commit ids and subjects.
#[derive(Debug, Clone, Default)]
struct MockBranch {
    history: Vec<(u64, String)>,
}

/// Recorded mutation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    CreateBranch { name: String, start_point: String },
    Checkout { name: String },
}

static NEXT_COMMIT: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

fn next_commit_id() -> u64 {
    NEXT_COMMIT.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
}

impl MockGateway {
    /// A repository whose only branch is `trunk` with one root commit.
    pub fn new(trunk: &str) -> Self {
        let gateway = Self::empty();
        {
            let mut inner = gateway.lock();
            inner.branches.insert(
                trunk.to_string(),
                MockBranch {
                    history: vec![(next_commit_id(), "Initial commit".to_string())],
                },
            );
            inner.head = Some(trunk.to_string());
        }
        gateway
    }

    /// A repository with no branches at all.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockInner::default())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockInner> {
        // A poisoned mock only happens after a test already panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create `name` at the tip of `from`. Test setup, not recorded.
    ///
    /// # Panics
    ///
    /// If `from` does not exist.
    pub fn add_branch(&self, name: &str, from: &str) -> &Self {
        let mut inner = self.lock();
        let history = inner
            .branches
            .get(from)
            .unwrap_or_else(|| panic!("mock branch '{}' does not exist", from))
            .history
            .clone();
        inner
            .branches
            .insert(name.to_string(), MockBranch { history });
        self
    }

    /// Append a commit with `subject` to `branch`.
    ///
    /// # Panics
    ///
    /// If `branch` does not exist.
    pub fn commit(&self, branch: &str, subject: &str) -> &Self {
        let mut inner = self.lock();
        inner
            .branches
            .get_mut(branch)
            .unwrap_or_else(|| panic!("mock branch '{}' does not exist", branch))
            .history
            .push((next_commit_id(), subject.to_string()));
        self
    }

    pub fn add_remote(&self, name: &str) -> &Self {
        self.lock().remotes.insert(name.to_string());
        self
    }

    pub fn set_head(&self, branch: Option<&str>) -> &Self {
        self.lock().head = branch.map(str::to_string);
        self
    }

    /// Make every subsequent `create_branch` fail.
    pub fn fail_create_branch(&self) -> &Self {
        self.lock().fail_create = true;
        self
    }

    /// Make every subsequent `checkout_branch` fail.
    pub fn fail_checkout(&self) -> &Self {
        self.lock().fail_checkout = true;
        self
    }

    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    fn history(&self, name: &BranchName) -> Result<Vec<(u64, String)>, GitError> {
        self.lock()
            .branches
            .get(name.as_str())
            .map(|b| b.history.clone())
            .ok_or_else(|| GitError::RefNotFound {
                refname: name.to_string(),
            })
    }
}

impl RepositoryGateway for MockGateway {
    fn ref_exists(&self, name: &BranchName) -> bool {
        self.lock().branches.contains_key(name.as_str())
    }

    fn list_local_branch_names(&self) -> Result<Vec<BranchName>, GitError> {
        self.lock()
            .branches
            .keys()
            .map(|k| BranchName::new(k.as_str()).map_err(GitError::from))
            .collect()
    }

    fn commit_subjects(
        &self,
        from: &BranchName,
        to: &BranchName,
    ) -> Result<Vec<String>, GitError> {
        let base = self.history(from)?;
        let tip = self.history(to)?;
        let hidden: BTreeSet<u64> = base.iter().map(|(id, _)| *id).collect();

        Ok(tip
            .into_iter()
            .filter(|(id, _)| !hidden.contains(id))
            .map(|(_, subject)| subject)
            .collect())
    }

    fn has_remote(&self, remote: Option<&str>) -> Result<bool, GitError> {
        let inner = self.lock();
        Ok(match remote {
            Some(name) => inner.remotes.contains(name),
            None => !inner.remotes.is_empty(),
        })
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        match self.lock().head.as_deref() {
            Some(name) => Ok(Some(BranchName::new(name)?)),
            None => Ok(None),
        }
    }

    fn create_branch(&self, name: &BranchName, start_point: &BranchName) -> Result<(), GitError> {
        let history = self.history(start_point)?;
        let mut inner = self.lock();
        if inner.fail_create {
            return Err(GitError::Internal {
                message: "mock create_branch failure".to_string(),
            });
        }
        if inner.branches.contains_key(name.as_str()) {
            return Err(GitError::Internal {
                message: format!("branch '{}' already exists", name),
            });
        }
        inner
            .branches
            .insert(name.to_string(), MockBranch { history });
        inner.operations.push(MockOperation::CreateBranch {
            name: name.to_string(),
            start_point: start_point.to_string(),
        });
        Ok(())
    }

    fn checkout_branch(&self, name: &BranchName) -> Result<(), GitError> {
        self.history(name)?;
        let mut inner = self.lock();
        if inner.fail_checkout {
            return Err(GitError::Internal {
                message: "mock checkout failure: working tree has local changes".to_string(),
            });
        }
        inner.head = Some(name.to_string());
        inner.operations.push(MockOperation::Checkout {
            name: name.to_string(),
        });
        Ok(())
    }

    fn nearest_base(
        &self,
        branch: &BranchName,
        candidates: &[BranchName],
    ) -> Result<Option<BranchName>, GitError> {
        let tip = self.history(branch)?;

        let mut best: Option<(usize, &BranchName)> = None;
        for candidate in candidates.iter().filter(|c| *c != branch) {
            let Ok(history) = self.history(candidate) else {
                continue;
            };
            // Proper ancestor: a strict prefix of the branch's history.
            if history.len() >= tip.len() || tip[..history.len()] != history[..] {
                continue;
            }
            let distance = tip.len() - history.len();
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, candidate));
            }
        }

        Ok(best.map(|(_, name)| name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[test]
    fn empty_has_no_branches() {
        let git = MockGateway::empty();
        assert!(git.list_local_branch_names().unwrap().is_empty());
        assert_eq!(git.current_branch().unwrap(), None);
    }

    #[test]
    fn subjects_exclude_base_history() {
        let git = MockGateway::new("main");
        git.add_branch("db", "main");
        git.commit("db", "one").commit("db", "two");
        git.commit("main", "unrelated");

        assert_eq!(
            git.commit_subjects(&b("main"), &b("db")).unwrap(),
            vec!["one", "two"]
        );
    }

    #[test]
    fn create_branch_records_operation() {
        let git = MockGateway::new("main");
        git.create_branch(&b("x"), &b("main")).unwrap();

        assert!(git.ref_exists(&b("x")));
        assert_eq!(
            git.operations(),
            vec![MockOperation::CreateBranch {
                name: "x".into(),
                start_point: "main".into()
            }]
        );
    }

    #[test]
    fn configured_failure() {
        let git = MockGateway::new("main");
        git.fail_create_branch();
        assert!(git.create_branch(&b("x"), &b("main")).is_err());
        assert!(!git.ref_exists(&b("x")));
    }

    #[test]
    fn nearest_base_uses_history_prefix() {
        let git = MockGateway::new("main");
        git.add_branch("db", "main").commit("db", "db");
        git.add_branch("api", "db").commit("api", "api");
        git.add_branch("same", "main");

        let all = git.list_local_branch_names().unwrap();
        assert_eq!(git.nearest_base(&b("api"), &all).unwrap(), Some(b("db")));
        assert_eq!(git.nearest_base(&b("db"), &all).unwrap(), Some(b("main")));
        assert_eq!(git.nearest_base(&b("same"), &all).unwrap(), None);
    }
}
