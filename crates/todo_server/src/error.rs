//! Response envelope and HTTP error mapping.
//!
//! # Invariants
//! - Every response body, success or failure, is an [`Envelope`].
//! - Store failures never leak their cause to clients; it goes to the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::Serialize;
use todo_core::{LifecycleError, RepoError};

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Uniform JSON body for every route.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            errors: Vec::new(),
        }
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            errors: Vec::new(),
        }
    }

    pub fn failure(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            errors,
        }
    }
}

/// Failure of a request, mapped onto a status code by [`IntoResponse`].
#[derive(Debug)]
pub enum ApiError {
    /// Rejected input; all offending fields are reported together.
    Validation(Vec<FieldError>),
    /// Addressed record is absent in the required state.
    NotFound(String),
    /// Store or runtime failure. Carries the cause for logging only.
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn internal(cause: impl Into<String>) -> Self {
        Self::Internal(cause.into())
    }
}

impl From<LifecycleError> for ApiError {
    fn from(value: LifecycleError) -> Self {
        match value {
            LifecycleError::TodoNotFound(_) => Self::NotFound("todo not found".to_string()),
            LifecycleError::SubTodoNotFound(_) => {
                Self::NotFound("sub-todo not found".to_string())
            }
            LifecycleError::Repo(err) => Self::from(err),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Envelope::failure("invalid request", errors),
            ),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Envelope::failure(message, Vec::new()),
            ),
            Self::Internal(cause) => {
                error!("event=request_failed module=server status=error cause={cause}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Envelope::failure("internal server error", Vec::new()),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
