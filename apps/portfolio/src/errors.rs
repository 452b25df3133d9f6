use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::repository::RepoError;
use crate::views::{escape, public_page, Meta};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Editor and form failures do not come through here: those pages re-render
/// with the message and the visitor's input.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error("Malformed upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Repository(e @ (RepoError::Validation(_) | RepoError::Upload(_))) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::Repository(e @ RepoError::Auth(_)) => (StatusCode::UNAUTHORIZED, e.to_string()),
            AppError::Repository(e) => {
                tracing::error!("Repository error: {e}");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::Multipart(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        };

        let main = format!(
            "<section class=\"error-page\"><h1>{code}</h1><p>{message}</p><a href=\"/\">Back home</a></section>",
            code = status.as_u16(),
            message = escape(&message),
        );
        let title = status.canonical_reason().unwrap_or("Error");
        (status, Html(public_page(&Meta::titled(title), "", &main))).into_response()
    }
}
