//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (first match wins):
//! 1. `$SPECSTACK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/specstack/config.toml`
//! 3. `~/.specstack/config.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `<repo>/.specstack/config.toml`.
//!
//! # Validation
//!
//! Values are validated after parsing (trunk must be a valid branch name,
//! the remote name must be non-empty, body limits must be positive).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// [suggest]
/// max_body_commits = 20
/// stack_footer = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// PR suggestion defaults
    pub suggest: Option<SuggestDefaults>,
}

impl GlobalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(suggest) = &self.suggest {
            suggest.validate()?;
        }
        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// trunk = "main"
/// remote = "origin"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Trunk branch name, overriding detection
    pub trunk: Option<String>,

    /// Remote name (default: "origin")
    pub remote: Option<String>,
}

impl RepoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(trunk) = &self.trunk {
            BranchName::new(trunk).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid trunk branch name: {}", e))
            })?;
        }

        if let Some(remote) = &self.remote {
            if remote.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "remote cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// PR suggestion defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SuggestDefaults {
    /// Cap on bullet lines in a suggested body
    pub max_body_commits: Option<usize>,

    /// Append the `Spec:` and `Stack:` footer lines
    pub stack_footer: Option<bool>,
}

impl SuggestDefaults {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_commits == Some(0) {
            return Err(ConfigError::InvalidValue(
                "suggest.max_body_commits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
