//! core::metadata
//!
//! Dependency document schema, migration, and storage.
//!
//! # Modules
//!
//! - [`schema`] - Current document schema and consistency checks
//! - [`migrate`] - Ordered forward migrations from older schema versions
//! - [`store`] - File-backed storage with atomic replace
//!
//! # Architecture
//!
//! Each repository owns one JSON document at
//! `<repo>/.specstack/dependencies.json`. Nothing is shared between
//! repositories; a workspace is just several independent documents.
//!
//! # Example
//!
//! ```
//! use specstack::core::metadata::{parse_document, DependencyDocument};
//!
//! let doc = DependencyDocument::empty();
//! let json = doc.to_json().unwrap();
//! assert_eq!(parse_document(&json).unwrap(), doc);
//! ```

pub mod migrate;
pub mod schema;
pub mod store;

pub use migrate::{migrate, needs_migration, MigrationError};
pub use schema::{
    parse_document, BranchEntry, BranchStatus, DependencyDocument, DocumentError,
    CURRENT_SCHEMA_VERSION,
};
pub use store::{DependencyStore, StoreError};
