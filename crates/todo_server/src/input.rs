//! Request validation.
//!
//! Bodies are read as raw JSON objects so that every problem can be reported
//! in one response instead of stopping at the first bad field.

use crate::error::{ApiError, ApiResult, FieldError};
use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::{Map, Value};
use todo_core::{
    validate_date, validate_text, NewTodo, SubTodoPatch, TodoPatch, TodoValidationError,
    MAX_TEXT_CHARS,
};
use uuid::Uuid;

/// Parses a path segment as a record id.
pub fn parse_id(field: &str, raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::Validation(vec![FieldError::new(
            field,
            format!("{field} must be a UUID"),
        )])
    })
}

/// Parses a todo id and a sub-todo id, reporting both when both are malformed.
pub fn parse_id_pair(todo_id: &str, sub_todo_id: &str) -> ApiResult<(Uuid, Uuid)> {
    both(parse_id("id", todo_id), parse_id("subId", sub_todo_id))
}

/// Joins two independent checks, merging their field errors.
pub fn both<A, B>(first: ApiResult<A>, second: ApiResult<B>) -> ApiResult<(A, B)> {
    match (first, second) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(ApiError::Validation(mut errors)), Err(ApiError::Validation(more))) => {
            errors.extend(more);
            Err(ApiError::Validation(errors))
        }
        (Err(err), _) | (_, Err(err)) => Err(err),
    }
}

pub fn create_todo(body: Result<Json<Value>, JsonRejection>) -> ApiResult<NewTodo> {
    let mut reader = BodyReader::new(body, &["text", "date"])?;
    let text = reader.text(true);
    let date = reader.date().flatten();
    reader.finish()?;
    Ok(NewTodo {
        text: text.unwrap_or_default(),
        date,
    })
}

pub fn update_todo(body: Result<Json<Value>, JsonRejection>) -> ApiResult<TodoPatch> {
    let mut reader = BodyReader::new(body, &["text", "completed", "date"])?;
    let patch = TodoPatch {
        text: reader.text(false),
        completed: reader.completed(),
        date: reader.date(),
    };
    reader.finish()?;
    Ok(patch)
}

pub fn create_sub_todo(body: Result<Json<Value>, JsonRejection>) -> ApiResult<String> {
    let mut reader = BodyReader::new(body, &["text"])?;
    let text = reader.text(true);
    reader.finish()?;
    Ok(text.unwrap_or_default())
}

pub fn update_sub_todo(body: Result<Json<Value>, JsonRejection>) -> ApiResult<SubTodoPatch> {
    let mut reader = BodyReader::new(body, &["text", "completed"])?;
    let patch = SubTodoPatch {
        text: reader.text(false),
        completed: reader.completed(),
    };
    reader.finish()?;
    Ok(patch)
}

struct BodyReader {
    fields: Map<String, Value>,
    errors: Vec<FieldError>,
}

impl BodyReader {
    fn new(body: Result<Json<Value>, JsonRejection>, allowed: &[&str]) -> ApiResult<Self> {
        let Json(value) = body.map_err(|rejection| {
            ApiError::Validation(vec![FieldError::new("body", rejection.body_text())])
        })?;
        let Value::Object(fields) = value else {
            return Err(ApiError::Validation(vec![FieldError::new(
                "body",
                "body must be a JSON object",
            )]));
        };

        let errors = fields
            .keys()
            .filter(|key| !allowed.contains(&key.as_str()))
            .map(|key| FieldError::new(key.as_str(), format!("unknown field `{key}`")))
            .collect();
        Ok(Self { fields, errors })
    }

    fn text(&mut self, required: bool) -> Option<String> {
        match self.fields.get("text") {
            None if required => {
                self.reject("text", "text is required");
                None
            }
            None => None,
            Some(Value::String(text)) => match validate_text(text) {
                Ok(()) => Some(text.clone()),
                Err(err) => {
                    self.reject("text", text_message(&err));
                    None
                }
            },
            Some(_) => {
                self.reject("text", "text must be a string");
                None
            }
        }
    }

    fn completed(&mut self) -> Option<bool> {
        match self.fields.get("completed") {
            None => None,
            Some(Value::Bool(completed)) => Some(*completed),
            Some(_) => {
                self.reject("completed", "completed must be a boolean");
                None
            }
        }
    }

    /// `Some(None)` when the client sent an explicit `null`.
    fn date(&mut self) -> Option<Option<String>> {
        match self.fields.get("date") {
            None => None,
            Some(Value::Null) => Some(None),
            Some(Value::String(date)) => match validate_date(date) {
                Ok(()) => Some(Some(date.clone())),
                Err(_) => {
                    self.reject("date", "date must be formatted YYYY-MM-DD");
                    None
                }
            },
            Some(_) => {
                self.reject("date", "date must be a string or null");
                None
            }
        }
    }

    fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn finish(self) -> ApiResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

fn text_message(err: &TodoValidationError) -> String {
    match err {
        TodoValidationError::EmptyText => "text must not be empty".to_string(),
        TodoValidationError::TextTooLong { .. } => {
            format!("text must be at most {MAX_TEXT_CHARS} characters")
        }
        other => other.to_string(),
    }
}
