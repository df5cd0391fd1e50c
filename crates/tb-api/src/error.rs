//! HTTP mapping of core errors.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use tb_core::error::AppError;

/// Wrapper that lets handlers return `tb_core` errors with `?`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::ValidationError(_) | AppError::InvalidKind(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::PostNotFound(_) => StatusCode::NOT_FOUND,
            AppError::CommentNotAllowed(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match &self.0 {
            AppError::Internal(detail) => {
                // Storage details stay in the log.
                log::error!("request failed: {detail}");
                "Internal server error".to_string()
            }
            AppError::PostNotFound(_) => "Post not found".to_string(),
            AppError::InvalidKind(_) => "Invalid interaction type".to_string(),
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
