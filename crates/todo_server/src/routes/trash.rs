//! Trash handlers: listing, restore, and permanent removal.

use crate::error::{ApiResult, Envelope};
use crate::input;
use crate::state::AppState;
use crate::views::{EmptyTrashView, SubTodoView, TodoView, TrashEntryView};
use axum::extract::{Path, State};
use axum::Json;

pub async fn list_trash(
    State(state): State<AppState>,
) -> ApiResult<Json<Envelope<Vec<TrashEntryView>>>> {
    let entries = state.with_trash(|service| service.list_trash()).await?;
    let views: Vec<TrashEntryView> = entries.into_iter().map(TrashEntryView::from).collect();
    Ok(Json(Envelope::success(
        format!("{} items in trash", views.len()),
        views,
    )))
}

pub async fn restore_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<TodoView>>> {
    let todo_id = input::parse_id("id", &id)?;
    let detail = state
        .with_trash(move |service| service.restore_todo(todo_id))
        .await?;
    Ok(Json(Envelope::success("todo restored", detail.into())))
}

pub async fn restore_sub_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<SubTodoView>>> {
    let sub_todo_id = input::parse_id("id", &id)?;
    let sub_todo = state
        .with_trash(move |service| service.restore_sub_todo(sub_todo_id))
        .await?;
    Ok(Json(Envelope::success("sub-todo restored", sub_todo.into())))
}

pub async fn purge_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<()>>> {
    let todo_id = input::parse_id("id", &id)?;
    state
        .with_trash(move |service| service.purge_todo(todo_id))
        .await?;
    Ok(Json(Envelope::message("todo permanently deleted")))
}

pub async fn purge_sub_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<()>>> {
    let sub_todo_id = input::parse_id("id", &id)?;
    state
        .with_trash(move |service| service.purge_sub_todo(sub_todo_id))
        .await?;
    Ok(Json(Envelope::message("sub-todo permanently deleted")))
}

pub async fn empty_trash(
    State(state): State<AppState>,
) -> ApiResult<Json<Envelope<EmptyTrashView>>> {
    let report = state.with_trash(|service| service.empty_trash()).await?;
    Ok(Json(Envelope::success("trash emptied", report.into())))
}
