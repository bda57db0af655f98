/// Error handling for the API server
///
/// Handlers and request guards return `Result<T, ApiError>`, which converts
/// into an HTTP response with a JSON body:
///
/// ```json
/// { "error": "not_found", "message": "Proyecto no encontrado" }
/// ```
///
/// Validation failures add an `errors` array with one entry per violation.
///
/// # Example
///
/// ```
/// use uptask_api::error::{ApiError, ApiResult};
///
/// fn find(id: u32) -> ApiResult<&'static str> {
///     if id == 1 {
///         Ok("P1")
///     } else {
///         Err(ApiError::NotFound("Proyecto no encontrado".to_string()))
///     }
/// }
///
/// assert!(find(2).is_err());
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

const VALIDATION_MESSAGE: &str = "Los datos enviados no son válidos";

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// One or more field rules failed (400)
    #[error("Validation failed: {} errors", .0.len())]
    ValidationFailure(Vec<ValidationErrorDetail>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Entities exist but the operation does not apply to them (400)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The message is shown to the client; the cause is only logged
    #[error("Internal error: {0}")]
    InternalFailure(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation, as named on the wire
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g. "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Logs `cause` and returns a 500 carrying `message`
    pub fn internal(message: &str, cause: impl fmt::Display) -> Self {
        tracing::error!(error = %cause, "{}", message);
        ApiError::InternalFailure(message.to_string())
    }
}

/// Converts any error into a 500 with a per-action message
pub trait OrInternal<T> {
    fn or_internal(self, message: &str) -> ApiResult<T>;
}

impl<T, E: fmt::Display> OrInternal<T> for Result<T, E> {
    fn or_internal(self, message: &str) -> ApiResult<T> {
        self.map_err(|e| ApiError::internal(message, e))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ValidationFailure(_)
            | ApiError::BadRequest(_)
            | ApiError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable `error` field of the body
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ValidationFailure(_) => "validation_error",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::InvalidOperation(_) => "invalid_operation",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::InternalFailure(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.code().to_string();

        let body = match self {
            ApiError::ValidationFailure(details) => ErrorResponse {
                error,
                message: VALIDATION_MESSAGE.to_string(),
                errors: Some(details),
            },
            ApiError::BadRequest(message)
            | ApiError::InvalidOperation(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::InternalFailure(message) => ErrorResponse {
                error,
                message,
                errors: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("Proyecto no encontrado".to_string());
        assert_eq!(err.to_string(), "Not found: Proyecto no encontrado");

        let err = ApiError::ValidationFailure(vec![
            ValidationErrorDetail::new("name", "a"),
            ValidationErrorDetail::new("description", "b"),
        ]);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[tokio::test]
    async fn test_status_codes() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::InvalidOperation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::InternalFailure("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_validation_body_lists_every_error() {
        let response = ApiError::ValidationFailure(vec![
            ValidationErrorDetail::new("description", "La descripción es requerida"),
            ValidationErrorDetail::new("name", "El nombre es requerido"),
        ])
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
        assert_eq!(body["errors"][1]["field"], "name");
    }

    #[tokio::test]
    async fn test_message_body_has_no_errors_key() {
        let body = body_json(ApiError::NotFound("Tarea no encontrada".into()).into_response()).await;
        assert_eq!(body["message"], "Tarea no encontrada");
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_or_internal_keeps_action_message() {
        let result: Result<(), &str> = Err("connection reset");
        match result.or_internal("Error al crear la tarea") {
            Err(ApiError::InternalFailure(msg)) => assert_eq!(msg, "Error al crear la tarea"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
