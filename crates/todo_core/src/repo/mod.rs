//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage primitives lifecycle services compose.
//! - Isolate SQLite query details from cascade orchestration.
//!
//! # Invariants
//! - Repository writes validate records before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod todo_repo;
