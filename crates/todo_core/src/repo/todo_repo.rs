//! Todo/sub-todo repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide record-level CRUD primitives over `todos` and `sub_todos`.
//! - Provide by-parent bulk writes used by lifecycle cascades.
//! - Provide a unit-of-work wrapper so one cascade commits or rolls back
//!   as a whole.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Sub-todo lists are in creation order: `created_at ASC, rowid ASC`.
//! - Purging a todo removes its sub-todos through `ON DELETE CASCADE`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::todo::{SubTodo, SubTodoId, Todo, TodoId, TodoValidationError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TODO_SELECT_SQL: &str = "SELECT
    id,
    text,
    completed,
    date,
    created_at,
    deleted_at
FROM todos";

const SUB_TODO_SELECT_SQL: &str = "SELECT
    id,
    todo_id,
    text,
    completed,
    created_at,
    deleted_at
FROM sub_todos";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for todo persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TodoValidationError),
    Db(DbError),
    /// No row matched the targeted id.
    NotFound(Uuid),
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "todo repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "todo repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "todo repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TodoValidationError> for RepoError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Tombstone filter for todo listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionFilter {
    /// `deleted_at IS NULL`, newest created first.
    #[default]
    Active,
    /// `deleted_at IS NOT NULL`, most recently deleted first.
    Deleted,
    /// Every row, newest created first.
    All,
}

/// Storage primitives the lifecycle services are built on.
pub trait TodoRepository {
    /// Runs `work` as one atomic unit of work.
    ///
    /// Every write made by `work` commits together, or none does when it
    /// returns an error. Calls made while a unit is already open join it.
    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>;

    fn insert_todo(&self, todo: &Todo) -> RepoResult<()>;
    /// Rewrites text, completion, date and tombstone of an existing todo.
    fn update_todo(&self, todo: &Todo) -> RepoResult<()>;
    fn get_todo(&self, id: TodoId, include_deleted: bool) -> RepoResult<Option<Todo>>;
    fn list_todos(&self, filter: DeletionFilter) -> RepoResult<Vec<Todo>>;
    /// Permanently removes one todo and, by cascade, its sub-todos.
    fn delete_todo(&self, id: TodoId) -> RepoResult<()>;
    /// Permanently removes every todo in the trash. Returns removed rows.
    fn delete_deleted_todos(&self) -> RepoResult<usize>;

    fn insert_sub_todo(&self, sub_todo: &SubTodo) -> RepoResult<()>;
    /// Rewrites text, completion and tombstone of an existing sub-todo.
    fn update_sub_todo(&self, sub_todo: &SubTodo) -> RepoResult<()>;
    fn get_sub_todo(&self, id: SubTodoId, include_deleted: bool) -> RepoResult<Option<SubTodo>>;
    /// Lists sub-todos of one todo in creation order.
    fn list_sub_todos(&self, todo_id: TodoId, include_deleted: bool)
        -> RepoResult<Vec<SubTodo>>;
    /// Lists every sub-todo with a tombstone, whatever its parent's state.
    fn list_deleted_sub_todos(&self) -> RepoResult<Vec<SubTodo>>;
    /// Sets `completed` on every sub-todo of one todo.
    fn set_sub_todos_completed(&self, todo_id: TodoId, completed: bool) -> RepoResult<usize>;
    /// Sets or clears `deleted_at` on every sub-todo of one todo.
    fn set_sub_todos_deleted_at(
        &self,
        todo_id: TodoId,
        deleted_at: Option<DateTime<Utc>>,
    ) -> RepoResult<usize>;
    fn delete_sub_todo(&self, id: SubTodoId) -> RepoResult<()>;
    fn delete_sub_todos_by_todo(&self, todo_id: TodoId) -> RepoResult<usize>;
    /// Permanently removes every sub-todo with a tombstone.
    fn delete_deleted_sub_todos(&self) -> RepoResult<usize>;
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_todo_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>,
    {
        if !self.conn.is_autocommit() {
            return work(self);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let output = work(self)?;
        tx.commit().map_err(RepoError::from)?;
        Ok(output)
    }

    fn insert_todo(&self, todo: &Todo) -> RepoResult<()> {
        todo.validate()?;

        self.conn.execute(
            "INSERT INTO todos (
                id,
                text,
                completed,
                date,
                created_at,
                updated_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6);",
            params![
                todo.id.to_string(),
                todo.text.as_str(),
                bool_to_int(todo.completed),
                todo.date.as_deref(),
                todo.created_at.timestamp_millis(),
                todo.deleted_at.map(|at| at.timestamp_millis()),
            ],
        )?;
        Ok(())
    }

    fn update_todo(&self, todo: &Todo) -> RepoResult<()> {
        todo.validate()?;

        let changed = self.conn.execute(
            "UPDATE todos
             SET
                text = ?2,
                completed = ?3,
                date = ?4,
                deleted_at = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                todo.id.to_string(),
                todo.text.as_str(),
                bool_to_int(todo.completed),
                todo.date.as_deref(),
                todo.deleted_at.map(|at| at.timestamp_millis()),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(todo.id));
        }
        Ok(())
    }

    fn get_todo(&self, id: TodoId, include_deleted: bool) -> RepoResult<Option<Todo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TODO_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_todo_row(row)?));
        }
        Ok(None)
    }

    fn list_todos(&self, filter: DeletionFilter) -> RepoResult<Vec<Todo>> {
        let clause = match filter {
            DeletionFilter::Active => "WHERE deleted_at IS NULL ORDER BY created_at DESC, id ASC",
            DeletionFilter::Deleted => {
                "WHERE deleted_at IS NOT NULL ORDER BY deleted_at DESC, id ASC"
            }
            DeletionFilter::All => "ORDER BY created_at DESC, id ASC",
        };

        let mut stmt = self.conn.prepare(&format!("{TODO_SELECT_SQL} {clause};"))?;
        let mut rows = stmt.query([])?;
        let mut todos = Vec::new();
        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }
        Ok(todos)
    }

    fn delete_todo(&self, id: TodoId) -> RepoResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1;", [id.to_string()])?;
        if deleted == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_deleted_todos(&self) -> RepoResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM todos WHERE deleted_at IS NOT NULL;", [])?;
        Ok(deleted)
    }

    fn insert_sub_todo(&self, sub_todo: &SubTodo) -> RepoResult<()> {
        sub_todo.validate()?;

        self.conn.execute(
            "INSERT INTO sub_todos (
                id,
                todo_id,
                text,
                completed,
                created_at,
                updated_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6);",
            params![
                sub_todo.id.to_string(),
                sub_todo.todo_id.to_string(),
                sub_todo.text.as_str(),
                bool_to_int(sub_todo.completed),
                sub_todo.created_at.timestamp_millis(),
                sub_todo.deleted_at.map(|at| at.timestamp_millis()),
            ],
        )?;
        Ok(())
    }

    fn update_sub_todo(&self, sub_todo: &SubTodo) -> RepoResult<()> {
        sub_todo.validate()?;

        let changed = self.conn.execute(
            "UPDATE sub_todos
             SET
                text = ?2,
                completed = ?3,
                deleted_at = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                sub_todo.id.to_string(),
                sub_todo.text.as_str(),
                bool_to_int(sub_todo.completed),
                sub_todo.deleted_at.map(|at| at.timestamp_millis()),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(sub_todo.id));
        }
        Ok(())
    }

    fn get_sub_todo(&self, id: SubTodoId, include_deleted: bool) -> RepoResult<Option<SubTodo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUB_TODO_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_sub_todo_row(row)?));
        }
        Ok(None)
    }

    fn list_sub_todos(
        &self,
        todo_id: TodoId,
        include_deleted: bool,
    ) -> RepoResult<Vec<SubTodo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUB_TODO_SELECT_SQL}
             WHERE todo_id = ?1
               AND (?2 = 1 OR deleted_at IS NULL)
             ORDER BY created_at ASC, rowid ASC;"
        ))?;

        let mut rows = stmt.query(params![todo_id.to_string(), bool_to_int(include_deleted)])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_sub_todo_row(row)?);
        }
        Ok(items)
    }

    fn list_deleted_sub_todos(&self) -> RepoResult<Vec<SubTodo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUB_TODO_SELECT_SQL}
             WHERE deleted_at IS NOT NULL
             ORDER BY deleted_at DESC, id ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_sub_todo_row(row)?);
        }
        Ok(items)
    }

    fn set_sub_todos_completed(&self, todo_id: TodoId, completed: bool) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE sub_todos
             SET
                completed = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE todo_id = ?1;",
            params![todo_id.to_string(), bool_to_int(completed)],
        )?;
        Ok(changed)
    }

    fn set_sub_todos_deleted_at(
        &self,
        todo_id: TodoId,
        deleted_at: Option<DateTime<Utc>>,
    ) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE sub_todos
             SET
                deleted_at = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE todo_id = ?1;",
            params![
                todo_id.to_string(),
                deleted_at.map(|at| at.timestamp_millis())
            ],
        )?;
        Ok(changed)
    }

    fn delete_sub_todo(&self, id: SubTodoId) -> RepoResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM sub_todos WHERE id = ?1;", [id.to_string()])?;
        if deleted == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_sub_todos_by_todo(&self, todo_id: TodoId) -> RepoResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM sub_todos WHERE todo_id = ?1;",
            [todo_id.to_string()],
        )?;
        Ok(deleted)
    }

    fn delete_deleted_sub_todos(&self) -> RepoResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM sub_todos WHERE deleted_at IS NOT NULL;", [])?;
        Ok(deleted)
    }
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    let todo = Todo {
        id: parse_uuid(row, "id", "todos.id")?,
        text: row.get("text")?,
        completed: parse_bool(row, "completed", "todos.completed")?,
        date: row.get("date")?,
        created_at: parse_millis(row.get("created_at")?, "todos.created_at")?,
        deleted_at: parse_optional_millis(row.get("deleted_at")?, "todos.deleted_at")?,
    };
    todo.validate()
        .map_err(|err| RepoError::InvalidData(format!("todo {}: {err}", todo.id)))?;
    Ok(todo)
}

fn parse_sub_todo_row(row: &Row<'_>) -> RepoResult<SubTodo> {
    let sub_todo = SubTodo {
        id: parse_uuid(row, "id", "sub_todos.id")?,
        todo_id: parse_uuid(row, "todo_id", "sub_todos.todo_id")?,
        text: row.get("text")?,
        completed: parse_bool(row, "completed", "sub_todos.completed")?,
        created_at: parse_millis(row.get("created_at")?, "sub_todos.created_at")?,
        deleted_at: parse_optional_millis(row.get("deleted_at")?, "sub_todos.deleted_at")?,
    };
    sub_todo
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("sub-todo {}: {err}", sub_todo.id)))?;
    Ok(sub_todo)
}

fn parse_uuid(row: &Row<'_>, column: &str, field: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {field}")))
}

fn parse_bool(row: &Row<'_>, column: &str, field: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {field}"
        ))),
    }
}

fn parse_millis(value: i64, field: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{value}` in {field}")))
}

fn parse_optional_millis(value: Option<i64>, field: &str) -> RepoResult<Option<DateTime<Utc>>> {
    value.map(|millis| parse_millis(millis, field)).transpose()
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_todo_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let required: [(&'static str, &[&'static str]); 2] = [
        (
            "todos",
            &[
                "id",
                "text",
                "completed",
                "date",
                "created_at",
                "updated_at",
                "deleted_at",
            ],
        ),
        (
            "sub_todos",
            &[
                "id",
                "todo_id",
                "text",
                "completed",
                "created_at",
                "updated_at",
                "deleted_at",
            ],
        ),
    ];

    for (table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
