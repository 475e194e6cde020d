use crate::validation::FormErrors;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Outcome of a failed action (list, get, create, update, delete).
///
/// Validation failures carry the full field map; persistence failures are
/// already reduced to one human-readable, form-level message.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Validation failed: {0}")]
    Validation(FormErrors),

    #[error("{0}")]
    Persistence(String),

    #[error("Record not found")]
    NotFound,
}

impl ActionError {
    /// Error map suitable for re-rendering a form or a JSON error body.
    pub fn into_form_errors(self) -> FormErrors {
        match self {
            ActionError::Validation(errors) => errors,
            ActionError::Persistence(message) => FormErrors::form_level(message),
            ActionError::NotFound => FormErrors::form_level("Record not found"),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ActionError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ActionError::Persistence(_) => StatusCode::CONFLICT,
            ActionError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Not found")]
    NotFound,

    #[error("Invalid or expired form token")]
    Forbidden,

    #[error("{0}")]
    Action(#[from] ActionError),

    #[error("Internal server error")]
    InternalError,
}

const NOT_FOUND_PAGE: &str = "<!DOCTYPE html><html><head><title>Not found</title>\
<link rel=\"stylesheet\" href=\"/static/style.css\"></head><body><main class=\"container\">\
<h1>Not found</h1><p>The record you are looking for does not exist.</p>\
<p><a href=\"/\">Back to home</a></p></main></body></html>";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound | AppError::Action(ActionError::NotFound) => {
                (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response()
            }
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Invalid or expired form token".to_string(),
            )
                .into_response(),
            AppError::Action(ActionError::Validation(errors)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, errors.to_string()).into_response()
            }
            AppError::Action(ActionError::Persistence(message)) => {
                (StatusCode::CONFLICT, message).into_response()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                internal_error()
            }
            AppError::Template(e) => {
                tracing::error!("Template error: {}", e);
                internal_error()
            }
            AppError::Session(e) => {
                tracing::error!("Session error: {}", e);
                internal_error()
            }
            AppError::InternalError => internal_error(),
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
        .into_response()
}
