//! core::metadata::migrate
//!
//! Forward-only schema migration for dependency documents.
//!
//! # Architecture
//!
//! Migration is an ordered list of [`MigrationStep`]s. Each step is a pure,
//! total function from one JSON shape to the next, and never fails on a
//! structurally plausible input. After the last step every entry is
//! projected onto the current field set: unknown fields are dropped and
//! missing lifecycle fields are default-filled. The spec index is then
//! rebuilt from `branches`, so the index invariant holds regardless of what
//! the stored index contained.
//!
//! # History
//!
//! | Version | Shape |
//! |---|---|
//! | `0.x` (or no `schemaVersion`) | entries keyed `spec` / `base`, a `created` timestamp, per-entry `commits`, no `specIndex` |
//! | `1.0.0` | current field names, no `parentSpecId` |
//! | `1.1.0` | optional `parentSpecId` |
//!
//! # Example
//!
//! ```
//! use specstack::core::metadata::migrate::{migrate, needs_migration};
//!
//! let legacy = serde_json::json!({
//!     "branches": [{
//!         "name": "feature/db",
//!         "spec": "001-user-auth",
//!         "base": "main",
//!         "created": "2024-01-01T00:00:00Z"
//!     }]
//! });
//!
//! assert!(needs_migration(&legacy).unwrap());
//! let doc = migrate(legacy).unwrap();
//! assert_eq!(doc.spec_index.len(), 1);
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

use super::schema::{DependencyDocument, DocumentError, CURRENT_SCHEMA_VERSION};
use crate::core::types::SchemaVersion;

/// Version assumed for documents that carry no `schemaVersion` at all.
pub const LEGACY_SCHEMA_VERSION: SchemaVersion = SchemaVersion::new(0, 1, 0);

/// Creation time given to entries that never recorded one.
pub const UNKNOWN_CREATED_AT: &str = "1970-01-01T00:00:00Z";

const DOCUMENT_FIELDS: &[&str] = &["schemaVersion", "branches", "specIndex"];

const ENTRY_FIELDS: &[&str] = &[
    "name",
    "specId",
    "baseBranch",
    "status",
    "pr",
    "createdAt",
    "updatedAt",
    "parentSpecId",
];

/// Errors from migration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MigrationError {
    /// The input is not a document of any known shape.
    #[error("not a dependency document: {0}")]
    UnrecognizedShape(String),

    /// The document was written by a newer release; there is no downgrade path.
    #[error("schema version {found} is newer than supported version {}", CURRENT_SCHEMA_VERSION)]
    FromTheFuture { found: SchemaVersion },

    /// The migrated document still fails to parse or violates invariants.
    #[error("migrated document is invalid: {0}")]
    Invalid(#[from] DocumentError),
}

/// One version-to-version transform.
pub struct MigrationStep {
    /// Documents with a version below this are transformed by the step.
    pub to: SchemaVersion,
    pub description: &'static str,
    pub apply: fn(Map<String, Value>) -> Map<String, Value>,
}

/// All steps, in the order they must run.
pub const STEPS: &[MigrationStep] = &[
    MigrationStep {
        to: SchemaVersion::new(1, 0, 0),
        description: "rename legacy entry fields and default-fill lifecycle fields",
        apply: legacy_to_v1_0,
    },
    MigrationStep {
        to: SchemaVersion::new(1, 1, 0),
        description: "allow optional parentSpecId on entries",
        apply: v1_0_to_v1_1,
    },
];

/// Read the schema version of a raw document.
///
/// A missing version means the legacy pre-1.0 shape. A present but
/// malformed version is an unrecognized shape.
pub fn detect_version(raw: &Value) -> Result<SchemaVersion, MigrationError> {
    let obj = as_document(raw)?;
    match obj.get("schemaVersion") {
        None | Some(Value::Null) => Ok(LEGACY_SCHEMA_VERSION),
        Some(Value::String(s)) => SchemaVersion::parse(s)
            .map_err(|e| MigrationError::UnrecognizedShape(e.to_string())),
        Some(other) => Err(MigrationError::UnrecognizedShape(format!(
            "schemaVersion must be a string, found {other}"
        ))),
    }
}

/// Whether the raw document is older than the current schema.
pub fn needs_migration(raw: &Value) -> Result<bool, MigrationError> {
    let version = detect_version(raw)?;
    if version > CURRENT_SCHEMA_VERSION {
        return Err(MigrationError::FromTheFuture { found: version });
    }
    Ok(version < CURRENT_SCHEMA_VERSION)
}

/// Apply every pending step and return a validated current document.
///
/// A document already at the current version passes through unchanged
/// apart from the spec-index rebuild, which is a no-op for a consistent
/// document. Migrating twice therefore equals migrating once.
pub fn migrate(raw: Value) -> Result<DependencyDocument, MigrationError> {
    let version = detect_version(&raw)?;
    if version > CURRENT_SCHEMA_VERSION {
        return Err(MigrationError::FromTheFuture { found: version });
    }

    let Value::Object(mut obj) = raw else {
        return Err(MigrationError::UnrecognizedShape(
            "top level is not an object".into(),
        ));
    };

    for step in STEPS.iter().filter(|s| version < s.to) {
        tracing::debug!(from = %version, to = %step.to, "migration step: {}", step.description);
        obj = (step.apply)(obj);
        obj.insert("schemaVersion".into(), Value::String(step.to.to_string()));
    }
    let mut obj = project(obj);
    obj.insert(
        "schemaVersion".into(),
        Value::String(CURRENT_SCHEMA_VERSION.to_string()),
    );
    // Rebuilt below; whatever was stored is discarded.
    obj.insert("specIndex".into(), Value::Object(Map::new()));

    let mut doc: DependencyDocument = serde_json::from_value(Value::Object(obj))
        .map_err(|e| DocumentError::Parse(e.to_string()))?;
    doc.rebuild_spec_index();
    doc.check_consistency()?;
    Ok(doc)
}

fn as_document(raw: &Value) -> Result<&Map<String, Value>, MigrationError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| MigrationError::UnrecognizedShape("top level is not an object".into()))?;
    match obj.get("branches") {
        Some(Value::Array(_)) | Some(Value::Object(_)) => Ok(obj),
        Some(_) => Err(MigrationError::UnrecognizedShape(
            "'branches' is neither a list nor a map".into(),
        )),
        None => Err(MigrationError::UnrecognizedShape(
            "missing 'branches'".into(),
        )),
    }
}

/// Keep only current fields, default-filling the lifecycle ones.
fn project(mut doc: Map<String, Value>) -> Map<String, Value> {
    doc.retain(|key, _| DOCUMENT_FIELDS.contains(&key.as_str()));
    if let Some(Value::Array(entries)) = doc.get_mut("branches") {
        for entry in entries.iter_mut() {
            if let Value::Object(e) = entry {
                e.retain(|key, _| ENTRY_FIELDS.contains(&key.as_str()));
                fill(e, "status", Value::String("active".into()));
                fill(e, "pr", Value::Null);
                fill(e, "createdAt", Value::String(UNKNOWN_CREATED_AT.into()));
                let created = e.get("createdAt").cloned().unwrap_or(Value::Null);
                fill(e, "updatedAt", created);
            }
        }
    }
    doc
}

/// Set `key` when it is absent or null.
fn fill(entry: &mut Map<String, Value>, key: &str, value: Value) {
    match entry.get(key) {
        None | Some(Value::Null) => {
            entry.insert(key.to_string(), value);
        }
        Some(_) => {}
    }
}

/// Move `from` to `to` unless `to` is already present.
fn rename(entry: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(v) = entry.remove(from) {
        entry.entry(to.to_string()).or_insert(v);
    }
}

/// `0.x -> 1.0.0`
///
/// Legacy documents stored entries either as a list or as a map keyed by
/// branch name. Field renames: `spec -> specId`, `base -> baseBranch`,
/// `created -> createdAt`, `updated -> updatedAt`. Leftover fields such as
/// `commits` are dropped by the final projection.
fn legacy_to_v1_0(mut doc: Map<String, Value>) -> Map<String, Value> {
    let entries: Vec<Value> = match doc.remove("branches") {
        Some(Value::Array(list)) => list,
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(name, mut v)| {
                if let Value::Object(e) = &mut v {
                    e.entry("name".to_string()).or_insert(Value::String(name));
                }
                v
            })
            .collect(),
        _ => Vec::new(),
    };

    let migrated = entries
        .into_iter()
        .map(|value| match value {
            Value::Object(mut e) => {
                rename(&mut e, "spec", "specId");
                rename(&mut e, "base", "baseBranch");
                rename(&mut e, "created", "createdAt");
                rename(&mut e, "updated", "updatedAt");
                Value::Object(e)
            }
            other => other,
        })
        .collect();

    doc.insert("branches".into(), Value::Array(migrated));
    doc
}

/// `1.0.0 -> 1.1.0`
///
/// `parentSpecId` is optional and stays absent when missing. Empty strings
/// written by some 1.0 tooling are treated as absent rather than kept.
fn v1_0_to_v1_1(mut doc: Map<String, Value>) -> Map<String, Value> {
    if let Some(Value::Array(entries)) = doc.get_mut("branches") {
        for entry in entries.iter_mut() {
            if let Value::Object(e) = entry {
                let blank = match e.get("parentSpecId") {
                    Some(Value::Null) => true,
                    Some(Value::String(s)) => s.is_empty(),
                    _ => false,
                };
                if blank {
                    e.remove("parentSpecId");
                }
            }
        }
    }
    doc
}
