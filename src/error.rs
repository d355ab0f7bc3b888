use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// API failure cases, mapped onto the JSON error envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("validation failed")]
    Validation(serde_json::Value),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        ApiError::Unprocessable(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, body) = match self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "status": false, "message": msg }),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": false, "message": msg }),
            ),
            ApiError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                json!({ "status": false, "message": msg }),
            ),
            ApiError::Unprocessable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "status": false, "message": msg }),
            ),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "status": false, "errors": errors }),
            ),
            ApiError::Database(e) => {
                tracing::error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "status": false, "message": "Internal server error" }),
                )
            }
        };
        (code, Json(body)).into_response()
    }
}

/// Collects per-field validation messages; empty means the input passed.
#[derive(Default)]
pub struct FieldErrors {
    errors: serde_json::Map<String, serde_json::Value>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let entry = self
            .errors
            .entry(field.to_string())
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        if let serde_json::Value::Array(list) = entry {
            list.push(serde_json::Value::String(message.into()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `Err(ApiError::Validation)` when any field failed.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(serde_json::Value::Object(self.errors)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_accumulate_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("title", "title is required");
        errors.add("title", "title is too long");
        errors.add("deadline", "deadline must be in the future");

        let err = errors.into_result().unwrap_err();
        match err {
            ApiError::Validation(value) => {
                assert_eq!(value["title"].as_array().unwrap().len(), 2);
                assert_eq!(
                    value["deadline"][0],
                    serde_json::json!("deadline must be in the future")
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn empty_field_errors_pass() {
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
