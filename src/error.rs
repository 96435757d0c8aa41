//! Error types for the yatube service.
//!
//! Only failures that end the request as an error live here. Form validation
//! problems are `FormErrors` and are rendered with the form; authorisation
//! refusals are redirects.

use poem::error::ResponseError;
use poem::http::StatusCode;
use poem::{IntoResponse, Response};
use sea_orm::DbErr;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Unknown post id, group slug, username
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    /// Media store read/write failed
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<password_hash::Error> for AppError {
    fn from(err: password_hash::Error) -> Self {
        AppError::PasswordHash(err.to_string())
    }
}

impl ResponseError for AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Storage(_)
            | AppError::PasswordHash(_)
            | AppError::Token(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn as_response(&self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut resp = poem::web::Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
        .into_response();
        resp.set_status(status);
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::NotFound("post");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "post not found");
    }

    #[test]
    fn storage_failures_are_server_errors() {
        let err = AppError::from(std::io::Error::other("disk full"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.as_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
