//! core
//!
//! Core domain types, schemas, and pure operations for specstack.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, SpecId, SchemaVersion, UtcTimestamp
//! - [`graph`] - Base-branch graph: traversal and cycle checks
//! - [`stack`] - Pure document mutations and stack resolution
//! - [`metadata`] - Dependency document schema, migration, and storage
//! - [`config`] - Configuration schema and loading
//! - [`workspace`] - Workspace manifest and child discovery
//! - [`ops`] - Repository locking
//! - [`paths`] - Centralized path routing for specstack storage
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Document mutations are pure; I/O lives at the edges

pub mod config;
pub mod graph;
pub mod metadata;
pub mod ops;
pub mod paths;
pub mod stack;
pub mod types;
pub mod workspace;
