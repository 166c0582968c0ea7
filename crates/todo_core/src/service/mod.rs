//! Lifecycle use-case services.
//!
//! # Responsibility
//! - Orchestrate repository primitives into cascade-safe operations.
//! - Keep the HTTP layer decoupled from storage details.
//!
//! # Invariants
//! - One public operation maps to exactly one repository unit of work.

pub mod todo_service;
pub mod trash_service;
