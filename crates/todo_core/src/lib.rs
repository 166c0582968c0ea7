//! Core domain logic for the todo backend.
//! This crate is the single source of truth for todo lifecycle invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging};
pub use model::lifecycle::{assemble_trash, derive_completion, TrashEntry, TrashEntryKind};
pub use model::todo::{
    validate_date, validate_text, SubTodo, SubTodoId, Todo, TodoDetail, TodoId,
    TodoValidationError, MAX_TEXT_CHARS,
};
pub use repo::todo_repo::{
    DeletionFilter, RepoError, RepoResult, SqliteTodoRepository, TodoRepository,
};
pub use service::todo_service::{
    LifecycleError, LifecycleResult, NewTodo, SubTodoPatch, TodoPatch, TodoService,
};
pub use service::trash_service::{EmptyTrashReport, TrashService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
