//! engine::validate
//!
//! Base branch validation.
//!
//! A base must resolve inside the current repository: either the trunk, or
//! a branch that exists locally. A name that only exists in some other
//! repository of the workspace is rejected, with concrete ways forward.

use thiserror::Error;

use crate::core::types::BranchName;

/// A proposed base branch that does not resolve in this repository.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub struct InvalidBaseError {
    pub rejected: BranchName,
    pub trunk: BranchName,
    pub explanation: String,
    pub alternatives: Vec<String>,
}

impl InvalidBaseError {
    fn new(rejected: &BranchName, trunk: &BranchName) -> Self {
        Self {
            rejected: rejected.clone(),
            trunk: trunk.clone(),
            explanation: format!(
                "base branch '{}' does not exist in this repository; \
                 cross-repository base dependencies are not supported",
                rejected
            ),
            alternatives: vec![
                format!(
                    "Merge to {} first: land the dependency on {}, then base the new branch on {}",
                    trunk, trunk, trunk
                ),
                "Extract the shared contract or interface into an independent artifact \
                 both repositories can consume"
                    .to_string(),
                "Use manual coordination: open both pull requests independently and \
                 link them in their descriptions"
                    .to_string(),
            ],
        }
    }
}

impl std::fmt::Display for InvalidBaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\nAlternatives:", self.explanation)?;
        for (i, alt) in self.alternatives.iter().enumerate() {
            write!(f, "\n  {}. {}", i + 1, alt)?;
        }
        Ok(())
    }
}

/// Accept `proposed_base` if it is the trunk or a local branch.
pub fn validate(
    trunk: &BranchName,
    proposed_base: &BranchName,
    local_branch_names: &[BranchName],
) -> Result<(), InvalidBaseError> {
    if proposed_base == trunk || local_branch_names.contains(proposed_base) {
        return Ok(());
    }
    Err(InvalidBaseError::new(proposed_base, trunk))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[test]
    fn trunk_always_accepted() {
        assert!(validate(&b("main"), &b("main"), &[]).is_ok());
    }

    #[test]
    fn local_branch_accepted() {
        let local = vec![b("main"), b("feature/db")];
        assert!(validate(&b("main"), &b("feature/db"), &local).is_ok());
    }

    #[test]
    fn foreign_branch_rejected_with_alternatives() {
        let local = vec![b("main"), b("feature/db")];
        let err = validate(&b("main"), &b("feature/db-from-other-repo"), &local).unwrap_err();

        assert_eq!(err.rejected, b("feature/db-from-other-repo"));
        assert!(err.alternatives.len() >= 3);

        let message = err.to_string();
        assert!(message.contains("cross-repository"));
        assert!(message.to_lowercase().contains("merge to main"));
        assert!(message.contains("manual coordination"));
        assert!(message.contains("independent artifact"));
    }
}
