//! Trash use-case service.
//!
//! # Responsibility
//! - List trashed todos and sub-todos as one deduplicated view.
//! - Restore trashed records and purge them permanently.
//!
//! # Invariants
//! - Restoring a todo restores every sub-todo it owns, including ones that
//!   were trashed individually before.
//! - Restoring a sub-todo never looks at its parent's tombstone.
//! - Purging a todo removes all of its sub-todos.
//! - Emptying the trash leaves no tombstoned row of either kind behind.

use crate::model::lifecycle::{assemble_trash, TrashEntry};
use crate::model::todo::{SubTodo, SubTodoId, TodoDetail, TodoId};
use crate::repo::todo_repo::{DeletionFilter, RepoError, TodoRepository};
use crate::service::todo_service::{reconcile_parent_completion, LifecycleError, LifecycleResult};
use log::info;
use std::collections::BTreeSet;

/// Rows removed by [`TrashService::empty_trash`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyTrashReport {
    pub todos: usize,
    pub sub_todos: usize,
}

impl EmptyTrashReport {
    pub fn is_empty(&self) -> bool {
        self.todos == 0 && self.sub_todos == 0
    }
}

/// Trash service facade over repository implementations.
pub struct TrashService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TrashService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists the trash, most recently deleted first.
    ///
    /// Trashed todos carry all of their sub-todos. Trashed sub-todos get an
    /// entry of their own only while their parent is active.
    pub fn list_trash(&self) -> LifecycleResult<Vec<TrashEntry>> {
        self.repo.atomically(|repo| {
            let deleted_todos = repo.list_todos(DeletionFilter::Deleted)?;
            let mut details = Vec::with_capacity(deleted_todos.len());
            for todo in deleted_todos {
                let sub_todos = repo.list_sub_todos(todo.id, true)?;
                details.push(TodoDetail { todo, sub_todos });
            }
            let deleted_sub_todos = repo.list_deleted_sub_todos()?;
            Ok::<_, LifecycleError>(assemble_trash(details, deleted_sub_todos))
        })
    }

    /// Restores a trashed todo together with every sub-todo it owns.
    pub fn restore_todo(&self, todo_id: TodoId) -> LifecycleResult<TodoDetail> {
        let detail = self.repo.atomically(|repo| {
            let mut todo = repo
                .get_todo(todo_id, true)?
                .filter(|todo| !todo.is_active())
                .ok_or(LifecycleError::TodoNotFound(todo_id))?;
            todo.restore();
            repo.update_todo(&todo)?;
            repo.set_sub_todos_deleted_at(todo_id, None)?;
            let sub_todos = repo.list_sub_todos(todo_id, false)?;
            Ok::<_, LifecycleError>(TodoDetail { todo, sub_todos })
        })?;
        info!(
            "event=todo_restore module=service status=ok todo_id={todo_id} sub_todos={}",
            detail.sub_todos.len()
        );
        Ok(detail)
    }

    /// Restores one trashed sub-todo, whatever the state of its parent.
    pub fn restore_sub_todo(&self, sub_todo_id: SubTodoId) -> LifecycleResult<SubTodo> {
        let sub_todo = self.repo.atomically(|repo| {
            let mut sub_todo = repo
                .get_sub_todo(sub_todo_id, true)?
                .filter(|sub_todo| !sub_todo.is_active())
                .ok_or(LifecycleError::SubTodoNotFound(sub_todo_id))?;
            sub_todo.restore();
            repo.update_sub_todo(&sub_todo)?;
            Ok::<_, LifecycleError>(sub_todo)
        })?;
        info!(
            "event=sub_todo_restore module=service status=ok sub_todo_id={sub_todo_id} todo_id={}",
            sub_todo.todo_id
        );
        Ok(sub_todo)
    }

    /// Permanently removes a todo and all of its sub-todos.
    ///
    /// Active todos can be purged too; only existence is required.
    pub fn purge_todo(&self, todo_id: TodoId) -> LifecycleResult<()> {
        let purged_sub_todos = self.repo.atomically(|repo| {
            if repo.get_todo(todo_id, true)?.is_none() {
                return Err(LifecycleError::TodoNotFound(todo_id));
            }
            let purged_sub_todos = repo.delete_sub_todos_by_todo(todo_id)?;
            repo.delete_todo(todo_id).map_err(|err| match err {
                RepoError::NotFound(_) => LifecycleError::TodoNotFound(todo_id),
                other => LifecycleError::Repo(other),
            })?;
            Ok(purged_sub_todos)
        })?;
        info!(
            "event=todo_purge module=service status=ok todo_id={todo_id} sub_todos={purged_sub_todos}"
        );
        Ok(())
    }

    /// Permanently removes one sub-todo, trashed or not.
    ///
    /// An active parent's completion is re-derived from the sub-todos it
    /// keeps. A trashed parent is left as it was deleted.
    pub fn purge_sub_todo(&self, sub_todo_id: SubTodoId) -> LifecycleResult<()> {
        let todo_id = self.repo.atomically(|repo| {
            let sub_todo = repo
                .get_sub_todo(sub_todo_id, true)?
                .ok_or(LifecycleError::SubTodoNotFound(sub_todo_id))?;
            repo.delete_sub_todo(sub_todo_id)?;
            reconcile_parent_completion(repo, sub_todo.todo_id)?;
            Ok::<_, LifecycleError>(sub_todo.todo_id)
        })?;
        info!(
            "event=sub_todo_purge module=service status=ok sub_todo_id={sub_todo_id} todo_id={todo_id}"
        );
        Ok(())
    }

    /// Permanently removes every trashed todo and sub-todo.
    ///
    /// Sub-todos still owned by a trashed todo go with it, even if they were
    /// restored on their own. Calling this on an empty trash removes nothing.
    pub fn empty_trash(&self) -> LifecycleResult<EmptyTrashReport> {
        let report = self.repo.atomically(|repo| {
            let deleted_todo_ids: BTreeSet<TodoId> = repo
                .list_todos(DeletionFilter::Deleted)?
                .into_iter()
                .map(|todo| todo.id)
                .collect();
            let surviving_parents: BTreeSet<TodoId> = repo
                .list_deleted_sub_todos()?
                .into_iter()
                .map(|sub_todo| sub_todo.todo_id)
                .filter(|todo_id| !deleted_todo_ids.contains(todo_id))
                .collect();

            let mut report = EmptyTrashReport {
                sub_todos: repo.delete_deleted_sub_todos()?,
                ..EmptyTrashReport::default()
            };
            for todo_id in &deleted_todo_ids {
                report.sub_todos += repo.delete_sub_todos_by_todo(*todo_id)?;
            }
            report.todos = repo.delete_deleted_todos()?;

            for todo_id in surviving_parents {
                reconcile_parent_completion(repo, todo_id)?;
            }
            Ok::<_, LifecycleError>(report)
        })?;
        info!(
            "event=trash_empty module=service status=ok todos={} sub_todos={}",
            report.todos, report.sub_todos
        );
        Ok(report)
    }
}
