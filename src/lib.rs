//! specstack - Branch dependencies and PR suggestions for spec-driven work
//!
//! specstack records which branch each branch is stacked on and which spec
//! it implements, per repository, in `.specstack/dependencies.json`. When a
//! new branch is stacked on one that is ready for review, it suggests the
//! PR for that branch, targeted at the branch's own base. Repositories can
//! be grouped into a workspace whose status is reported as one tree.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Operations against an explicit repository handle
//! - [`core`] - Domain types, the dependency document, config, workspace
//! - [`git`] - The repository gateway and its `git2` implementation
//!
//! # Correctness Invariants
//!
//! specstack maintains the following invariants:
//!
//! 1. Branch names are unique within a repository's document
//! 2. Bases resolve inside the same repository
//! 3. The spec index always matches the branch list
//! 4. Base pointers never form a cycle
//! 5. A corrupt document is reported, never silently reset

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
