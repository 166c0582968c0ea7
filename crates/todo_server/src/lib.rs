//! HTTP surface for the todo backend.
//!
//! Handlers validate input, hand the work to `todo_core` services on the
//! blocking pool, and wrap results in the JSON envelope.

pub mod config;
pub mod error;
pub mod input;
pub mod routes;
pub mod state;
pub mod views;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, Envelope, FieldError};
pub use routes::build_router;
pub use state::AppState;
