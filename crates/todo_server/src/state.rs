//! Shared request state.
//!
//! The process owns one SQLite connection. Handlers never touch it on the
//! async runtime; every call hops to the blocking pool and serializes on the
//! connection lock.

use crate::error::{ApiError, ApiResult};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use todo_core::{LifecycleResult, SqliteTodoRepository, TodoService, TrashService};

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Wraps a connection already bootstrapped by `todo_core::db::open_db`.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `work` against a todo service on the blocking pool.
    pub async fn with_todos<T, F>(&self, work: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&TodoService<SqliteTodoRepository<'_>>) -> LifecycleResult<T> + Send + 'static,
    {
        self.blocking(move |conn| {
            let service = TodoService::new(SqliteTodoRepository::try_new(conn)?);
            work(&service).map_err(ApiError::from)
        })
        .await
    }

    /// Runs `work` against a trash service on the blocking pool.
    pub async fn with_trash<T, F>(&self, work: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&TrashService<SqliteTodoRepository<'_>>) -> LifecycleResult<T> + Send + 'static,
    {
        self.blocking(move |conn| {
            let service = TrashService::new(SqliteTodoRepository::try_new(conn)?);
            work(&service).map_err(ApiError::from)
        })
        .await
    }

    async fn blocking<T, F>(&self, work: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> ApiResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| ApiError::internal("database connection lock poisoned"))?;
            work(&conn)
        })
        .await
        .map_err(|err| ApiError::internal(format!("blocking task failed: {err}")))?
    }
}
