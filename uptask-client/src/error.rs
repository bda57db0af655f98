/// Client error types

use reqwest::StatusCode;
use serde::Deserialize;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api {
        status: StatusCode,
        message: String,
        errors: Vec<FieldError>,
    },

    /// The response body does not match the expected type
    #[error("Unexpected response body: {0}")]
    Schema(String),

    #[error("Invalid base URL: {0}")]
    BaseUrl(String),
}

impl ClientError {
    /// HTTP status for [`ClientError::Api`]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// One rejected field from a validation failure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<FieldError>,
}

/// Builds the error for a non-success response
///
/// The server's `message` is preferred; validation failures fall back to
/// their first field message, and unparseable bodies to the status text.
pub(crate) fn api_error(status: StatusCode, body: &[u8]) -> ClientError {
    let parsed = serde_json::from_slice::<ErrorBody>(body).ok();
    let (message, errors) = match parsed {
        Some(ErrorBody { message, errors }) => {
            let message = message
                .or_else(|| errors.first().map(|e| e.message.clone()))
                .unwrap_or_else(|| status.to_string());
            (message, errors)
        }
        None => (status.to_string(), Vec::new()),
    };

    ClientError::Api {
        status,
        message,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_uses_server_message() {
        let body = br#"{"error":"not_found","message":"Proyecto no encontrado"}"#;
        let err = api_error(StatusCode::NOT_FOUND, body);
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("Proyecto no encontrado"));
    }

    #[test]
    fn test_api_error_keeps_field_errors() {
        let body = r#"{"error":"validation_failed","message":"Los datos enviados no son válidos","errors":[{"field":"name","message":"El nombre es requerido"}]}"#.as_bytes();
        match api_error(StatusCode::BAD_REQUEST, body) {
            ClientError::Api { errors, .. } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "name");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_api_error_without_json_body() {
        let err = api_error(StatusCode::BAD_GATEWAY, b"<html>");
        match err {
            ClientError::Api { message, errors, .. } => {
                assert!(message.contains("502"));
                assert!(errors.is_empty());
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
