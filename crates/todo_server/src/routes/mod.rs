//! Route table.
//!
//! # Invariants
//! - Every route, including the fallback, answers with the JSON envelope.
//! - Request logs carry method, path, status, and latency only.

pub mod todos;
pub mod trash;

use crate::error::Envelope;
use crate::state::AppState;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use log::{debug, warn};
use serde::Serialize;
use std::time::Instant;
use tower_http::cors::CorsLayer;

#[derive(Debug, Serialize)]
struct Health {
    success: bool,
    message: &'static str,
    version: &'static str,
}

/// Builds the application router over `state`.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route(
            "/todos/:id",
            get(todos::get_todo)
                .put(todos::update_todo)
                .delete(todos::delete_todo),
        )
        .route("/todos/:id/subtodos", post(todos::create_sub_todo))
        .route(
            "/todos/:id/subtodos/:sub_id",
            put(todos::update_sub_todo).delete(todos::delete_sub_todo),
        )
        .route("/trash", get(trash::list_trash).delete(trash::empty_trash))
        .route("/trash/todos/:id/restore", post(trash::restore_todo))
        .route("/trash/subtodos/:id/restore", post(trash::restore_sub_todo))
        .route("/trash/todos/:id", delete(trash::purge_todo))
        .route("/trash/subtodos/:id", delete(trash::purge_sub_todo));

    Router::new()
        .route("/", get(health))
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
}

async fn health() -> Json<Health> {
    Json(Health {
        success: true,
        message: "todo server is running",
        version: todo_core::core_version(),
    })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(Envelope::failure("route not found", Vec::new())),
    )
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = started_at.elapsed().as_millis();
    if status.is_server_error() {
        warn!(
            "event=http_request module=server status=error method={method} path={path} code={} duration_ms={duration_ms}",
            status.as_u16()
        );
    } else {
        debug!(
            "event=http_request module=server status=ok method={method} path={path} code={} duration_ms={duration_ms}",
            status.as_u16()
        );
    }
    response
}
