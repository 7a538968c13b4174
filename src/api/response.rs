use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Every response body: `{success, message, data?}` or `{success, message, error?}`.
#[derive(Debug)]
pub enum ApiResponse<T> {
    Success { message: String, data: Option<T> },
    Failure { message: String, error: Option<String> },
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        ApiResponse::Success {
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse::Success {
            message: message.into(),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        ApiResponse::Failure {
            message: message.into(),
            error,
        }
    }
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ApiResponse::Success { message, data } => {
                let len = if data.is_some() { 3 } else { 2 };
                let mut s = serializer.serialize_struct("ApiResponse", len)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("message", message)?;
                if let Some(data) = data {
                    s.serialize_field("data", data)?;
                }
                s.end()
            }
            ApiResponse::Failure { message, error } => {
                let len = if error.is_some() { 3 } else { 2 };
                let mut s = serializer.serialize_struct("ApiResponse", len)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("message", message)?;
                if let Some(error) = error {
                    s.serialize_field("error", error)?;
                }
                s.end()
            }
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, mut headers: HeaderMap, body: &ApiResponse<T>) -> Response {
    let json = match serde_json::to_string(body) {
        Ok(json) => json,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    (status, headers, json).into_response()
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        json_response(StatusCode::OK, HeaderMap::new(), &self)
    }
}

/// 201 with the created resource.
pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    json_response(StatusCode::CREATED, HeaderMap::new(), &ApiResponse::success(message, data))
}

pub fn with_total_count<T: Serialize>(message: impl Into<String>, data: T, count: i64) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from(count));

    json_response(StatusCode::OK, headers, &ApiResponse::success(message, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_omits_missing_data() {
        let body = serde_json::to_value(ApiResponse::<()>::message("ok")).unwrap();
        assert_eq!(body, json!({"success": true, "message": "ok"}));
    }

    #[test]
    fn failure_carries_error_detail() {
        let body = serde_json::to_value(ApiResponse::<()>::failure(
            "Blockchain operation failed",
            Some("timed out".to_string()),
        ))
        .unwrap();
        assert_eq!(
            body,
            json!({"success": false, "message": "Blockchain operation failed", "error": "timed out"})
        );
    }
}
