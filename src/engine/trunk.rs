//! engine::trunk
//!
//! Trunk branch detection.
//!
//! Preference order: `main`, `master`, `develop`, then the first remaining
//! local branch in lexical order. A repository without any branch has no
//! trunk, and that is reported rather than guessed.

use thiserror::Error;

use crate::core::types::BranchName;

/// Conventional trunk names in preference order.
pub const CONVENTIONAL_TRUNKS: &[&str] = &["main", "master", "develop"];

/// The repository has no local branches at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("repository has no local branches; commit something on a trunk branch first")]
pub struct EmptyRepository;

/// Pick the trunk branch from the local branch names.
///
/// # Example
///
/// ```
/// use specstack::engine::trunk::detect;
/// use specstack::core::types::BranchName;
///
/// let names: Vec<_> = ["zeta", "develop", "master"]
///     .iter()
///     .map(|n| BranchName::new(*n).unwrap())
///     .collect();
/// assert_eq!(detect(&names).unwrap().as_str(), "master");
/// ```
pub fn detect(local_branch_names: &[BranchName]) -> Result<BranchName, EmptyRepository> {
    for conventional in CONVENTIONAL_TRUNKS {
        if let Some(found) = local_branch_names
            .iter()
            .find(|b| b.as_str() == *conventional)
        {
            return Ok(found.clone());
        }
    }

    local_branch_names
        .iter()
        .min()
        .cloned()
        .ok_or(EmptyRepository)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<BranchName> {
        list.iter().map(|n| BranchName::new(*n).unwrap()).collect()
    }

    #[test]
    fn prefers_main() {
        let found = detect(&names(&["develop", "master", "main"])).unwrap();
        assert_eq!(found.as_str(), "main");
    }

    #[test]
    fn falls_back_to_master_then_develop() {
        assert_eq!(detect(&names(&["develop", "master"])).unwrap().as_str(), "master");
        assert_eq!(detect(&names(&["feature", "develop"])).unwrap().as_str(), "develop");
    }

    #[test]
    fn lexical_fallback_ignores_input_order() {
        let found = detect(&names(&["trunk", "alpha", "release"])).unwrap();
        assert_eq!(found.as_str(), "alpha");
    }

    #[test]
    fn empty_repository_reported() {
        assert_eq!(detect(&[]), Err(EmptyRepository));
    }
}
