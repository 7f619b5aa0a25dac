//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Two configuration scopes:
//! - **Global**: User-level settings (PR suggestion shape)
//! - **Repo**: Repository-level settings (trunk override, remote name)
//!
//! Missing files are not an error; defaults apply.
//!
//! # Global Config Locations
//!
//! 1. `$SPECSTACK_CONFIG` if set (used exclusively, even when missing)
//! 2. `$XDG_CONFIG_HOME/specstack/config.toml`
//! 3. `~/.specstack/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use specstack::core::config::Config;
//! use specstack::core::paths::ToolPaths;
//! use std::path::PathBuf;
//!
//! let paths = ToolPaths::new(PathBuf::from("/path/to/repo"));
//! let config = Config::load(Some(&paths)).unwrap();
//!
//! if let Some(trunk) = config.trunk() {
//!     println!("Trunk branch: {}", trunk);
//! }
//! println!("Remote: {}", config.remote());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, RepoConfig, SuggestDefaults};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::paths::ToolPaths;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "SPECSTACK_CONFIG";

/// Default cap on bullet lines in a suggested PR body.
pub const DEFAULT_MAX_BODY_COMMITS: usize = 50;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from both scopes.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub repo: RepoConfig,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// If `paths` is provided, also loads that repository's config.
    pub fn load(paths: Option<&ToolPaths>) -> Result<Config, ConfigError> {
        let global_path = Self::global_config_candidate();
        Self::load_from(global_path.as_deref(), paths)
    }

    /// Load configuration with an explicit global config location.
    pub fn load_from(
        global_path: Option<&Path>,
        paths: Option<&ToolPaths>,
    ) -> Result<Config, ConfigError> {
        let (global, global_found) = match global_path {
            Some(path) if path.is_file() => (Self::read_toml::<GlobalConfig>(path)?, Some(path)),
            _ => (GlobalConfig::default(), None),
        };

        let repo_file = paths.map(ToolPaths::repo_config_path);
        let (repo, repo_found) = match repo_file {
            Some(path) if path.is_file() => (Self::read_toml::<RepoConfig>(&path)?, Some(path)),
            _ => (RepoConfig::default(), None),
        };

        global.validate()?;
        repo.validate()?;

        tracing::debug!(
            global = ?global_found,
            repo = ?repo_found,
            "loaded configuration"
        );

        Ok(Config { global, repo })
    }

    /// The global config file that would be read, if any location applies.
    fn global_config_candidate() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        if let Some(xdg_home) = std::env::var_os("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("specstack/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir().map(|home| home.join(".specstack/config.toml"))
    }

    fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessors with defaults applied
    // =========================================================================

    /// Configured trunk override, if any.
    pub fn trunk(&self) -> Option<&str> {
        self.repo.trunk.as_deref()
    }

    /// Remote name. Defaults to "origin".
    pub fn remote(&self) -> &str {
        self.configured_remote().unwrap_or("origin")
    }

    /// Remote name set in the repo config. `None` means any remote will do.
    pub fn configured_remote(&self) -> Option<&str> {
        self.repo.remote.as_deref()
    }

    /// Maximum bullet lines in a suggested body.
    pub fn max_body_commits(&self) -> usize {
        self.global
            .suggest
            .as_ref()
            .and_then(|s| s.max_body_commits)
            .unwrap_or(DEFAULT_MAX_BODY_COMMITS)
    }

    /// Whether suggested bodies end with the spec and stack lines.
    /// Defaults to `true`.
    pub fn stack_footer(&self) -> bool {
        self.global
            .suggest
            .as_ref()
            .and_then(|s| s.stack_footer)
            .unwrap_or(true)
    }
}
