use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::api::response::ApiResponse;
use crate::blockchain::ClientError;
use crate::service::ServiceError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Student is already enrolled in this course")]
    AlreadyEnrolled,

    #[error("{0}")]
    Conflict(String),

    #[error("Missing or invalid X-Student-Id header")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Blockchain error: {0}")]
    Blockchain(#[from] ClientError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)
            | ApiError::AlreadyEnrolled
            | ApiError::InvalidAddress(_)
            | ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Database(_) | ApiError::Blockchain(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                ApiResponse::<()>::failure("Database error occurred", Some(e.to_string()))
            }
            ApiError::Blockchain(e) => {
                error!("Blockchain error: {}", e);
                ApiResponse::<()>::failure("Blockchain operation failed", Some(e.to_string()))
            }
            ApiError::Internal(e) => {
                error!("Internal error: {}", e);
                ApiResponse::<()>::failure("Internal server error", Some(e.clone()))
            }
            _ => ApiResponse::<()>::failure(self.to_string(), None),
        };

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidWalletAddress(address) => ApiError::InvalidAddress(address),
            ValidationError::MissingParameter(param) => {
                ApiError::BadRequest(format!("Missing parameter: {}", param))
            }
            ValidationError::InvalidParameter(msg) => ApiError::InvalidParameter(msg),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => ApiError::NotFound(what),
            ServiceError::AlreadyEnrolled => ApiError::AlreadyEnrolled,
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Validation(e) => e.into(),
            ServiceError::Blockchain(e) => ApiError::Blockchain(e),
            ServiceError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidParameter(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidParameter(rejection.body_text())
    }
}
