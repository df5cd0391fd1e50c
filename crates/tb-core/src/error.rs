//! # AppError
//!
//! Centralized error handling for the Topic-Board core.
//! Every service operation reports failure as one of these kinds; nothing is
//! retried internally.

use thiserror::Error;

use crate::models::PostId;

/// The primary error type for all tb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing/blank required field or malformed timestamp
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Duplicate username on registration
    #[error("user {0} already exists")]
    AlreadyExists(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing or unverifiable bearer token
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("post not found with ID {0}")]
    PostNotFound(PostId),

    /// Interaction type outside like/dislike/comment
    #[error("invalid interaction type: {0}")]
    InvalidKind(String),

    /// Reserved for a per-post comment policy; never produced today.
    #[error("comments are not allowed on post {0}")]
    CommentNotAllowed(PostId),

    /// Infrastructure failure (e.g., DB down, token signing failure)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for Topic-Board logic.
pub type Result<T> = std::result::Result<T, AppError>;
