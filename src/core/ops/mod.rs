//! core::ops
//!
//! Operation locking.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive repository lock
//!
//! # Architecture
//!
//! Every mutating operation:
//! 1. Acquires the exclusive repo lock
//! 2. Loads the dependency document
//! 3. Validates and mutates in memory
//! 4. Saves atomically
//! 5. Releases the lock on drop

pub mod lock;

pub use lock::{LockError, RepoLock};
