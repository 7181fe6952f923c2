use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::fmt;
use storage::error::StorageError;
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Validation(ValidationErrors),
    BadRequest(String),
    Unauthorized,
    NotFound(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::NotFound(what) => write!(f, "Not found: {}", what),
        }
    }
}

impl WebError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Storage(StorageError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(StorageError::ConstraintViolation(_)) => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::Storage(StorageError::NotFound) => json!({ "error": "Resource not found" }),
            Self::Storage(StorageError::ConstraintViolation(msg)) | Self::BadRequest(msg) => {
                json!({ "error": msg })
            }
            Self::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                json!({ "error": "An internal error occurred" })
            }
            Self::Validation(errors) => json!({
                "error": "Validation failed",
                "details": field_messages(errors),
            }),
            Self::Unauthorized => json!({ "error": "Unauthorized" }),
            Self::NotFound(what) => json!({ "error": format!("{} not found", what) }),
        }
    }
}

fn field_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                let reason = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, reason)
            })
        })
        .collect();
    messages.sort();
    messages
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}
