//! Pure lifecycle rules shared by the todo and trash services.
//!
//! # Responsibility
//! - Derive parent completion from sub-todo state.
//! - Assemble the combined, deduplicated trash listing.
//!
//! # Invariants
//! - A todo with no sub-todos has no derived completion; its flag stays
//!   client-driven.
//! - Soft-deleted sub-todos still count toward parent completion until they
//!   are purged.
//! - A deleted sub-todo under a deleted parent is listed only inside the
//!   parent's trash entry.
//! - Trash order is `deleted_at DESC, id ASC`.

use crate::model::todo::{SubTodo, TodoDetail, TodoId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Returns the completion a parent must have given its sub-todos.
///
/// `None` when `sub_todos` is empty. Callers pass every sub-todo that has not
/// been purged, deleted or not.
pub fn derive_completion(sub_todos: &[SubTodo]) -> Option<bool> {
    if sub_todos.is_empty() {
        return None;
    }
    Some(sub_todos.iter().all(|sub| sub.completed))
}

/// Which record a trash entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrashEntryKind {
    Todo,
    SubTodo,
}

/// One row of the trash view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TrashEntryKind,
    /// Parent id for sub-todo entries.
    pub original_todo_id: Option<TodoId>,
    pub text: String,
    pub completed: bool,
    pub date: Option<String>,
    /// All sub-todos of a deleted todo, regardless of their own tombstone.
    /// Always empty for sub-todo entries.
    pub sub_todos: Vec<SubTodo>,
    pub deleted_at: DateTime<Utc>,
}

/// Builds the trash listing from deleted todos and deleted sub-todos.
///
/// Records without a tombstone are ignored, as are deleted sub-todos whose
/// parent is itself in `deleted_todos`.
pub fn assemble_trash(
    deleted_todos: Vec<TodoDetail>,
    deleted_sub_todos: Vec<SubTodo>,
) -> Vec<TrashEntry> {
    let deleted_parents: HashSet<TodoId> = deleted_todos
        .iter()
        .filter(|detail| detail.todo.deleted_at.is_some())
        .map(|detail| detail.todo.id)
        .collect();

    let todo_entries = deleted_todos.into_iter().filter_map(|detail| {
        let deleted_at = detail.todo.deleted_at?;
        Some(TrashEntry {
            id: detail.todo.id,
            kind: TrashEntryKind::Todo,
            original_todo_id: None,
            text: detail.todo.text,
            completed: detail.todo.completed,
            date: detail.todo.date,
            sub_todos: detail.sub_todos,
            deleted_at,
        })
    });

    let sub_entries = deleted_sub_todos
        .into_iter()
        .filter(|sub| !deleted_parents.contains(&sub.todo_id))
        .filter_map(|sub| {
            let deleted_at = sub.deleted_at?;
            Some(TrashEntry {
                id: sub.id,
                kind: TrashEntryKind::SubTodo,
                original_todo_id: Some(sub.todo_id),
                text: sub.text,
                completed: sub.completed,
                date: None,
                sub_todos: Vec::new(),
                deleted_at,
            })
        });

    let mut entries: Vec<TrashEntry> = todo_entries.chain(sub_entries).collect();
    entries.sort_by(|left, right| {
        right
            .deleted_at
            .cmp(&left.deleted_at)
            .then_with(|| left.id.cmp(&right.id))
    });
    entries
}
