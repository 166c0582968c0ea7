//! JSON shapes returned to clients.
//!
//! Bookkeeping fields (`created_at`, per-sub-todo tombstones, owner ids on
//! nested sub-todos) stay server-side.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use todo_core::{EmptyTrashReport, SubTodo, TodoDetail, TrashEntry, TrashEntryKind};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubTodoView {
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
}

impl From<SubTodo> for SubTodoView {
    fn from(value: SubTodo) -> Self {
        Self {
            id: value.id,
            text: value.text,
            completed: value.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoView {
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
    pub date: Option<String>,
    pub sub_todos: Vec<SubTodoView>,
}

impl From<TodoDetail> for TodoView {
    fn from(value: TodoDetail) -> Self {
        Self {
            id: value.todo.id,
            text: value.todo.text,
            completed: value.todo.completed,
            date: value.todo.date,
            sub_todos: value.sub_todos.into_iter().map(SubTodoView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashEntryView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TrashEntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_todo_id: Option<Uuid>,
    pub text: String,
    pub completed: bool,
    pub date: Option<String>,
    pub sub_todos: Vec<SubTodoView>,
    /// ISO-8601 UTC with millisecond precision.
    pub deleted_at: String,
}

impl From<TrashEntry> for TrashEntryView {
    fn from(value: TrashEntry) -> Self {
        Self {
            id: value.id,
            kind: value.kind,
            original_todo_id: value.original_todo_id,
            text: value.text,
            completed: value.completed,
            date: value.date,
            sub_todos: value.sub_todos.into_iter().map(SubTodoView::from).collect(),
            deleted_at: iso_millis(value.deleted_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyTrashView {
    pub todos: usize,
    pub sub_todos: usize,
}

impl From<EmptyTrashReport> for EmptyTrashView {
    fn from(value: EmptyTrashReport) -> Self {
        Self {
            todos: value.todos,
            sub_todos: value.sub_todos,
        }
    }
}

fn iso_millis(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
