//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. The engine depends on the
//! [`RepositoryGateway`] trait; [`Git`] implements it over `git2` and
//! [`mock::MockGateway`] implements it in memory. No other module imports
//! `git2`.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Local branch enumeration and creation
//! - Commit subject listing between two branches
//! - Ancestry queries for base inference
//! - Remote presence checks

mod gateway;
mod interface;
pub mod mock;

pub use gateway::RepositoryGateway;
pub use interface::{Git, GitError};
