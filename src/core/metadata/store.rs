//! core::metadata::store
//!
//! File-backed storage for the dependency document.
//!
//! # Architecture
//!
//! One document per repository at [`ToolPaths::document_path`]. Each
//! mutation is a read-modify-write: [`DependencyStore::load`], mutate in
//! memory, [`DependencyStore::save`]. `save` writes a uniquely named
//! temporary file next to the target, syncs it, then renames it over the
//! target, so readers never observe a half-written document.
//!
//! # Corruption
//!
//! Content that is not valid JSON, carries an unknown status, or violates
//! the document invariants surfaces as [`StoreError::CorruptDocument`].
//! The store never falls back to an empty document in that case.
//!
//! # Example
//!
//! ```ignore
//! let store = DependencyStore::new(&paths);
//! let mut doc = store.load()?;
//! // ... mutate ...
//! store.save(&doc)?;
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use super::migrate::{self, MigrationError};
use super::schema::{parse_document, DependencyDocument, DocumentError};
use crate::core::paths::ToolPaths;
use crate::core::types::SchemaVersion;

/// Errors from document storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The persisted document exists but cannot be trusted.
    #[error("dependency document '{path}' is corrupt: {reason}")]
    CorruptDocument { path: PathBuf, reason: String },

    /// The document was written by a newer release.
    #[error("dependency document '{path}' has schema version {found}, newer than this build supports")]
    UnsupportedVersion { path: PathBuf, found: SchemaVersion },

    /// The in-memory document failed its own consistency check before save.
    #[error("refusing to save inconsistent document: {0}")]
    Inconsistent(#[from] DocumentError),

    #[error("failed to {action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StoreError {
    fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(std::io::Error) -> Self + 'a {
        move |source| StoreError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    fn corrupt(path: &Path, reason: impl ToString) -> Self {
        StoreError::CorruptDocument {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Repository-scoped document store.
#[derive(Debug, Clone)]
pub struct DependencyStore {
    path: PathBuf,
}

impl DependencyStore {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            path: paths.document_path(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// An empty current-version document.
    pub fn create_empty() -> DependencyDocument {
        DependencyDocument::empty()
    }

    /// Load the document.
    ///
    /// - absent file: empty document, nothing written
    /// - older schema: migrated, written back, then returned
    /// - anything unreadable: [`StoreError::CorruptDocument`]
    ///
    /// Callers hold the repository lock, since a migration writes.
    pub fn load(&self) -> Result<DependencyDocument, StoreError> {
        let (doc, migrated) = self.read_document()?;
        if migrated {
            self.save(&doc)?;
        }
        Ok(doc)
    }

    /// Load the document without ever writing.
    ///
    /// An older schema is migrated in memory only and stays on disk as it
    /// was until the next locked [`load`](Self::load).
    pub fn read(&self) -> Result<DependencyDocument, StoreError> {
        Ok(self.read_document()?.0)
    }

    /// The current document, and whether it had to be migrated.
    fn read_document(&self) -> Result<(DependencyDocument, bool), StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no dependency document yet");
                return Ok((Self::create_empty(), false));
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(StoreError::corrupt(&self.path, "content is not valid UTF-8"));
            }
            Err(e) => return Err(StoreError::io("read", &self.path)(e)),
        };

        let raw: Value =
            serde_json::from_str(&contents).map_err(|e| StoreError::corrupt(&self.path, e))?;

        let needs_migration = migrate::needs_migration(&raw).map_err(|e| self.map_migration(e))?;
        if needs_migration {
            let from = migrate::detect_version(&raw).map_err(|e| self.map_migration(e))?;
            let doc = migrate::migrate(raw).map_err(|e| self.map_migration(e))?;
            tracing::info!(
                path = %self.path.display(),
                from = %from,
                to = %doc.schema_version,
                "migrated dependency document"
            );
            return Ok((doc, true));
        }

        let doc = parse_document(&contents).map_err(|e| StoreError::corrupt(&self.path, e))?;
        tracing::debug!(
            path = %self.path.display(),
            branches = doc.branches.len(),
            "loaded dependency document"
        );
        Ok((doc, false))
    }

    /// Atomically persist the document.
    pub fn save(&self, doc: &DependencyDocument) -> Result<(), StoreError> {
        doc.check_consistency()?;
        let json = doc.to_json()?;

        let dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir).map_err(StoreError::io("create directory", &dir))?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dependencies.json");
        let temp_path = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        let result = Self::write_temp(&temp_path, json.as_bytes())
            .and_then(|()| fs::rename(&temp_path, &self.path).map_err(StoreError::io("replace", &self.path)));
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result?;

        tracing::debug!(
            path = %self.path.display(),
            branches = doc.branches.len(),
            "saved dependency document"
        );
        Ok(())
    }

    fn write_temp(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let mut file = fs::File::create(path).map_err(StoreError::io("create", path))?;
        file.write_all(bytes).map_err(StoreError::io("write", path))?;
        file.sync_all().map_err(StoreError::io("sync", path))?;
        Ok(())
    }

    fn map_migration(&self, err: MigrationError) -> StoreError {
        match err {
            MigrationError::FromTheFuture { found } => StoreError::UnsupportedVersion {
                path: self.path.clone(),
                found,
            },
            other => StoreError::corrupt(&self.path, other),
        }
    }
}
