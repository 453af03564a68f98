use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::tokens::TokenError;
use crate::db::posts::PostStoreError;
use crate::db::users::UserStoreError;

/// Per-request failure taxonomy. Every variant maps to a status code and a
/// JSON `{message}` body; nothing here takes the process down.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("duplicated username")]
    DuplicateUsername,
    #[error("bad username or password")]
    InvalidCredentials,
    #[error("authentication required")]
    InvalidToken,
    #[error("post not found")]
    NotFound,
    #[error("not the author")]
    NotAuthor,
    #[error("internal error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::DuplicateUsername
            | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::NotAuthor => StatusCode::FORBIDDEN,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<UserStoreError> for ApiError {
    fn from(e: UserStoreError) -> Self {
        match e {
            UserStoreError::EmptyCredentials => ApiError::Validation("Bad request".to_string()),
            UserStoreError::DuplicateUsername => ApiError::DuplicateUsername,
            UserStoreError::InvalidCredentials => ApiError::InvalidCredentials,
            UserStoreError::Storage(e) => {
                error!(error = %e, "user store failure");
                ApiError::Internal
            }
            UserStoreError::Hash => {
                error!("password hashing failure");
                ApiError::Internal
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(_: TokenError) -> Self {
        ApiError::InvalidToken
    }
}

impl From<PostStoreError> for ApiError {
    fn from(e: PostStoreError) -> Self {
        match e {
            PostStoreError::NotFound => ApiError::NotFound,
            PostStoreError::NotAuthor => ApiError::NotAuthor,
        }
    }
}
