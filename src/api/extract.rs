use axum::{
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};

use crate::api::error::ApiError;

pub const STUDENT_ID_HEADER: &str = "x-student-id";

/// Caller identity for student-scoped routes, taken from `X-Student-Id`.
/// Authentication itself happens upstream of this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for StudentId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(STUDENT_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        match raw.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(StudentId(id)),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

/// `axum::Json` whose rejection uses the JSON error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` whose rejection uses the JSON error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `axum::extract::Query` whose rejection uses the JSON error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
