//! Todo use-case service.
//!
//! # Responsibility
//! - Provide create/read/update/soft-delete APIs for todos and sub-todos.
//! - Enforce completion cascades across one todo aggregate.
//!
//! # Invariants
//! - Every write runs inside one repository unit of work.
//! - Setting a todo's completion propagates to all of its sub-todos.
//! - Any sub-todo write re-derives the parent's completion before commit.
//! - Soft-deleting a todo stamps the todo and all sub-todos with one value.
//! - Lookups are active-scoped: trashed records report not-found.

use crate::model::lifecycle::derive_completion;
use crate::model::todo::{now_millis, SubTodo, SubTodoId, Todo, TodoDetail, TodoId};
use crate::repo::todo_repo::{DeletionFilter, RepoError, TodoRepository};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure of a lifecycle operation.
#[derive(Debug)]
pub enum LifecycleError {
    /// Todo is missing or not in the deletion state the operation needs.
    TodoNotFound(TodoId),
    /// Sub-todo is missing, not in the required deletion state, or does not
    /// belong to the addressed todo.
    SubTodoNotFound(SubTodoId),
    /// Store-level failure. The whole operation has been rolled back.
    Repo(RepoError),
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TodoNotFound(id) => write!(f, "todo not found: {id}"),
            Self::SubTodoNotFound(id) => write!(f, "sub-todo not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LifecycleError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Input for [`TodoService::create_todo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub text: String,
    /// `YYYY-MM-DD`.
    pub date: Option<String>,
}

/// Partial update for a todo. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub text: Option<String>,
    /// Client-driven completion; cascades to every sub-todo.
    pub completed: Option<bool>,
    /// `Some(None)` clears the date.
    pub date: Option<Option<String>>,
}

/// Partial update for a sub-todo. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubTodoPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

/// Todo service facade over repository implementations.
pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists active todos, newest first, each with its active sub-todos.
    pub fn list_todos(&self) -> LifecycleResult<Vec<TodoDetail>> {
        self.repo.atomically(|repo| {
            let todos = repo.list_todos(DeletionFilter::Active)?;
            let mut details = Vec::with_capacity(todos.len());
            for todo in todos {
                let sub_todos = repo.list_sub_todos(todo.id, false)?;
                details.push(TodoDetail { todo, sub_todos });
            }
            Ok::<_, LifecycleError>(details)
        })
    }

    /// Loads one active todo with its active sub-todos.
    pub fn get_todo(&self, todo_id: TodoId) -> LifecycleResult<TodoDetail> {
        self.repo
            .atomically(|repo| load_active_detail(repo, todo_id))
    }

    /// Creates an incomplete todo without sub-todos.
    pub fn create_todo(&self, input: NewTodo) -> LifecycleResult<TodoDetail> {
        let todo = Todo::new(input.text, input.date);
        self.repo.atomically(|repo| {
            repo.insert_todo(&todo)?;
            Ok::<_, LifecycleError>(())
        })?;
        info!("event=todo_create module=service status=ok todo_id={}", todo.id);
        Ok(TodoDetail {
            todo,
            sub_todos: Vec::new(),
        })
    }

    /// Applies a partial update to an active todo.
    ///
    /// A present `completed` follows [`TodoService::set_todo_completion`]
    /// semantics within the same unit of work.
    pub fn update_todo(&self, todo_id: TodoId, patch: &TodoPatch) -> LifecycleResult<TodoDetail> {
        self.repo.atomically(|repo| {
            let mut todo = require_active_todo(repo, todo_id)?;
            if let Some(text) = &patch.text {
                todo.text = text.clone();
            }
            if let Some(date) = &patch.date {
                todo.date = date.clone();
            }
            if let Some(completed) = patch.completed {
                todo.completed = completed;
            }
            repo.update_todo(&todo)?;

            if let Some(completed) = patch.completed {
                let cascaded = repo.set_sub_todos_completed(todo_id, completed)?;
                debug!(
                    "event=todo_completion_cascade module=service status=ok todo_id={todo_id} completed={completed} sub_todos={cascaded}"
                );
            }
            load_active_detail(repo, todo_id)
        })
    }

    /// Sets completion on an active todo and on every sub-todo it owns.
    pub fn set_todo_completion(
        &self,
        todo_id: TodoId,
        completed: bool,
    ) -> LifecycleResult<TodoDetail> {
        self.update_todo(
            todo_id,
            &TodoPatch {
                completed: Some(completed),
                ..TodoPatch::default()
            },
        )
    }

    /// Moves an active todo and all of its sub-todos into the trash.
    ///
    /// Returns the trashed todo with every sub-todo it owns.
    pub fn soft_delete_todo(&self, todo_id: TodoId) -> LifecycleResult<TodoDetail> {
        let detail = self.repo.atomically(|repo| {
            let mut todo = require_active_todo(repo, todo_id)?;
            let deleted_at = now_millis();
            todo.soft_delete(deleted_at);
            repo.update_todo(&todo)?;
            repo.set_sub_todos_deleted_at(todo_id, Some(deleted_at))?;
            let sub_todos = repo.list_sub_todos(todo_id, true)?;
            Ok::<_, LifecycleError>(TodoDetail { todo, sub_todos })
        })?;
        info!(
            "event=todo_soft_delete module=service status=ok todo_id={todo_id} sub_todos={}",
            detail.sub_todos.len()
        );
        Ok(detail)
    }

    /// Appends an incomplete sub-todo to an active todo.
    ///
    /// The parent's completion is re-derived, so a completed parent becomes
    /// incomplete.
    pub fn create_sub_todo(
        &self,
        todo_id: TodoId,
        text: impl Into<String>,
    ) -> LifecycleResult<SubTodo> {
        let sub_todo = SubTodo::new(todo_id, text);
        self.repo.atomically(|repo| {
            require_active_todo(repo, todo_id)?;
            repo.insert_sub_todo(&sub_todo)?;
            reconcile_parent_completion(repo, todo_id)
        })?;
        info!(
            "event=sub_todo_create module=service status=ok todo_id={todo_id} sub_todo_id={}",
            sub_todo.id
        );
        Ok(sub_todo)
    }

    /// Applies a partial update to an active sub-todo of an active todo.
    ///
    /// A present `completed` re-derives the parent's completion.
    pub fn update_sub_todo(
        &self,
        todo_id: TodoId,
        sub_todo_id: SubTodoId,
        patch: &SubTodoPatch,
    ) -> LifecycleResult<SubTodo> {
        self.repo.atomically(|repo| {
            let mut sub_todo = require_active_sub_todo(repo, todo_id, sub_todo_id)?;
            if let Some(text) = &patch.text {
                sub_todo.text = text.clone();
            }
            if let Some(completed) = patch.completed {
                sub_todo.completed = completed;
            }
            repo.update_sub_todo(&sub_todo)?;

            if patch.completed.is_some() {
                reconcile_parent_completion(repo, todo_id)?;
            }
            Ok::<_, LifecycleError>(sub_todo)
        })
    }

    /// Sets completion on one sub-todo and re-derives its parent.
    pub fn set_sub_todo_completion(
        &self,
        todo_id: TodoId,
        sub_todo_id: SubTodoId,
        completed: bool,
    ) -> LifecycleResult<SubTodo> {
        self.update_sub_todo(
            todo_id,
            sub_todo_id,
            &SubTodoPatch {
                completed: Some(completed),
                ..SubTodoPatch::default()
            },
        )
    }

    /// Moves one sub-todo into the trash. The parent is untouched.
    pub fn soft_delete_sub_todo(
        &self,
        todo_id: TodoId,
        sub_todo_id: SubTodoId,
    ) -> LifecycleResult<SubTodo> {
        let sub_todo = self.repo.atomically(|repo| {
            let mut sub_todo = require_active_sub_todo(repo, todo_id, sub_todo_id)?;
            sub_todo.soft_delete(now_millis());
            repo.update_sub_todo(&sub_todo)?;
            Ok::<_, LifecycleError>(sub_todo)
        })?;
        info!(
            "event=sub_todo_soft_delete module=service status=ok todo_id={todo_id} sub_todo_id={sub_todo_id}"
        );
        Ok(sub_todo)
    }
}

/// Re-derives a todo's completion from every sub-todo it still owns.
///
/// Leaves the flag alone when the todo has no sub-todos or is not active.
/// Trashed todos keep the completion they were deleted with.
pub(crate) fn reconcile_parent_completion<R: TodoRepository>(
    repo: &R,
    todo_id: TodoId,
) -> LifecycleResult<()> {
    let Some(mut todo) = repo.get_todo(todo_id, false)? else {
        return Ok(());
    };
    let sub_todos = repo.list_sub_todos(todo_id, true)?;
    match derive_completion(&sub_todos) {
        Some(completed) if completed != todo.completed => {
            todo.completed = completed;
            repo.update_todo(&todo)?;
            debug!(
                "event=todo_completion_derive module=service status=ok todo_id={todo_id} completed={completed}"
            );
        }
        _ => {}
    }
    Ok(())
}

fn require_active_todo<R: TodoRepository>(repo: &R, todo_id: TodoId) -> LifecycleResult<Todo> {
    repo.get_todo(todo_id, false)?
        .ok_or(LifecycleError::TodoNotFound(todo_id))
}

fn require_active_sub_todo<R: TodoRepository>(
    repo: &R,
    todo_id: TodoId,
    sub_todo_id: SubTodoId,
) -> LifecycleResult<SubTodo> {
    require_active_todo(repo, todo_id)?;
    repo.get_sub_todo(sub_todo_id, false)?
        .filter(|sub_todo| sub_todo.todo_id == todo_id)
        .ok_or(LifecycleError::SubTodoNotFound(sub_todo_id))
}

fn load_active_detail<R: TodoRepository>(
    repo: &R,
    todo_id: TodoId,
) -> LifecycleResult<TodoDetail> {
    let todo = require_active_todo(repo, todo_id)?;
    let sub_todos = repo.list_sub_todos(todo_id, false)?;
    Ok(TodoDetail { todo, sub_todos })
}
