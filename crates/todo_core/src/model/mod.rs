//! Domain model for todos, sub-todos and the trash view.
//!
//! # Responsibility
//! - Define canonical data structures used by lifecycle services.
//! - Hold the pure completion and trash rules, free of storage concerns.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Deletion is a `deleted_at` tombstone until a record is purged.

pub mod lifecycle;
pub mod todo;
