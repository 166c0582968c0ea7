//! Todo and sub-todo domain model.
//!
//! # Responsibility
//! - Define the canonical records for top-level todos and their sub-todos.
//! - Provide field validation shared by the store and the request layer.
//! - Provide soft-delete helpers driven by a `deleted_at` tombstone.
//!
//! # Invariants
//! - `id` is a non-nil UUID, stable for the record lifetime.
//! - `text` holds 1..=255 characters.
//! - `date`, when present, is shaped `YYYY-MM-DD`.
//! - `deleted_at.is_some()` is the only source of truth for "in trash".

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Maximum number of characters accepted in `text`.
pub const MAX_TEXT_CHARS: usize = 255;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));

/// Stable identifier of a top-level todo.
pub type TodoId = Uuid;

/// Stable identifier of a sub-todo.
pub type SubTodoId = Uuid;

/// Field-level validation failure for todo records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    /// `id` is the nil UUID.
    NilId,
    /// `text` is empty.
    EmptyText,
    /// `text` is longer than [`MAX_TEXT_CHARS`].
    TextTooLong { chars: usize },
    /// `date` is not shaped `YYYY-MM-DD`.
    InvalidDate(String),
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "id must not be nil"),
            Self::EmptyText => write!(f, "text must not be empty"),
            Self::TextTooLong { chars } => write!(
                f,
                "text must be at most {MAX_TEXT_CHARS} characters, got {chars}"
            ),
            Self::InvalidDate(value) => {
                write!(f, "date must be formatted YYYY-MM-DD, got `{value}`")
            }
        }
    }
}

impl Error for TodoValidationError {}

/// Checks the 1..=255 character rule for todo and sub-todo text.
pub fn validate_text(text: &str) -> Result<(), TodoValidationError> {
    if text.is_empty() {
        return Err(TodoValidationError::EmptyText);
    }
    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(TodoValidationError::TextTooLong { chars });
    }
    Ok(())
}

/// Checks the `YYYY-MM-DD` shape of a due date.
///
/// Only the shape is checked; `2024-02-31` passes.
pub fn validate_date(date: &str) -> Result<(), TodoValidationError> {
    if DATE_RE.is_match(date) {
        Ok(())
    } else {
        Err(TodoValidationError::InvalidDate(date.to_string()))
    }
}

/// Top-level todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    /// Optional due date, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Trash tombstone. `None` means active.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Todo {
    /// Creates an active, incomplete todo with a generated id.
    pub fn new(text: impl Into<String>, date: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            completed: false,
            date,
            created_at: now_millis(),
            deleted_at: None,
        }
    }

    /// Validates id, text and date.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.id.is_nil() {
            return Err(TodoValidationError::NilId);
        }
        validate_text(&self.text)?;
        if let Some(date) = self.date.as_deref() {
            validate_date(date)?;
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Moves the todo into the trash at `at`.
    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    pub fn restore(&mut self) {
        self.deleted_at = None;
    }
}

/// Sub-item owned by exactly one todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTodo {
    pub id: SubTodoId,
    /// Owning todo. A relation, not shared ownership.
    pub todo_id: TodoId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Independent from the parent's tombstone.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SubTodo {
    /// Creates an active, incomplete sub-todo under `todo_id`.
    pub fn new(todo_id: TodoId, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            todo_id,
            text: text.into(),
            completed: false,
            created_at: now_millis(),
            deleted_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.id.is_nil() || self.todo_id.is_nil() {
            return Err(TodoValidationError::NilId);
        }
        validate_text(&self.text)
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    pub fn restore(&mut self) {
        self.deleted_at = None;
    }
}

/// A todo together with the sub-todos selected for one view.
///
/// Active views carry active sub-todos only; trash views carry all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDetail {
    #[serde(flatten)]
    pub todo: Todo,
    /// Creation order.
    pub sub_todos: Vec<SubTodo>,
}

/// Current time truncated to storage precision (epoch milliseconds).
///
/// Truncation keeps values written and read back from SQLite equal.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
