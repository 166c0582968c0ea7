//! Active todo and sub-todo handlers.

use crate::error::{ApiResult, Envelope};
use crate::input;
use crate::state::AppState;
use crate::views::{SubTodoView, TodoView};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

type Reply<T> = ApiResult<Json<Envelope<T>>>;
type Created<T> = ApiResult<(StatusCode, Json<Envelope<T>>)>;

pub async fn list_todos(State(state): State<AppState>) -> Reply<Vec<TodoView>> {
    let todos = state.with_todos(|service| service.list_todos()).await?;
    let views: Vec<TodoView> = todos.into_iter().map(TodoView::from).collect();
    Ok(Json(Envelope::success(
        format!("{} todos", views.len()),
        views,
    )))
}

pub async fn get_todo(State(state): State<AppState>, Path(id): Path<String>) -> Reply<TodoView> {
    let todo_id = input::parse_id("id", &id)?;
    let detail = state
        .with_todos(move |service| service.get_todo(todo_id))
        .await?;
    Ok(Json(Envelope::success("todo found", detail.into())))
}

pub async fn create_todo(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Created<TodoView> {
    let new_todo = input::create_todo(body)?;
    let detail = state
        .with_todos(move |service| service.create_todo(new_todo))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::success("todo created", detail.into())),
    ))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Reply<TodoView> {
    let todo_id = input::parse_id("id", &id);
    let patch = input::update_todo(body);
    let (todo_id, patch) = input::both(todo_id, patch)?;
    let detail = state
        .with_todos(move |service| service.update_todo(todo_id, &patch))
        .await?;
    Ok(Json(Envelope::success("todo updated", detail.into())))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Reply<TodoView> {
    let todo_id = input::parse_id("id", &id)?;
    let detail = state
        .with_todos(move |service| service.soft_delete_todo(todo_id))
        .await?;
    Ok(Json(Envelope::success("todo moved to trash", detail.into())))
}

pub async fn create_sub_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Created<SubTodoView> {
    let todo_id = input::parse_id("id", &id);
    let text = input::create_sub_todo(body);
    let (todo_id, text) = input::both(todo_id, text)?;
    let sub_todo = state
        .with_todos(move |service| service.create_sub_todo(todo_id, text))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::success("sub-todo created", sub_todo.into())),
    ))
}

pub async fn update_sub_todo(
    State(state): State<AppState>,
    Path((id, sub_id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Reply<SubTodoView> {
    let ids = input::parse_id_pair(&id, &sub_id);
    let patch = input::update_sub_todo(body);
    let ((todo_id, sub_todo_id), patch) = input::both(ids, patch)?;
    let sub_todo = state
        .with_todos(move |service| service.update_sub_todo(todo_id, sub_todo_id, &patch))
        .await?;
    Ok(Json(Envelope::success("sub-todo updated", sub_todo.into())))
}

pub async fn delete_sub_todo(
    State(state): State<AppState>,
    Path((id, sub_id)): Path<(String, String)>,
) -> Reply<SubTodoView> {
    let (todo_id, sub_todo_id) = input::parse_id_pair(&id, &sub_id)?;
    let sub_todo = state
        .with_todos(move |service| service.soft_delete_sub_todo(todo_id, sub_todo_id))
        .await?;
    Ok(Json(Envelope::success(
        "sub-todo moved to trash",
        sub_todo.into(),
    )))
}
