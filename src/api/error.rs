//! Unified API error handling.
//!
//! All domain failures are mapped to a JSON `{message, detail?}` body with the
//! matching status code at the request boundary. Nothing is retried here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Error categories for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed or missing input (400)
    Validation,
    /// Unknown id or entity (404)
    NotFound,
    /// Bad credentials or expired token (401)
    Unauthorized,
    /// Authenticated but not allowed, e.g. unverified account (403)
    Forbidden,
    /// Unique constraint or state conflict (409)
    Conflict,
    /// External system rejected the operation with a business reason (400)
    RemoteBusiness,
    /// External system unreachable or errored at transport level (500 by
    /// default; call sites relaying a remote rejection use 400)
    RemoteUnavailable,
    /// Storage-level failure (500)
    Database,
    /// Unexpected failure (500); detail is logged server-side only
    Internal,
}

impl ErrorCode {
    /// Default HTTP status code for this category
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Validation => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::RemoteBusiness => StatusCode::BAD_REQUEST,
            ErrorCode::RemoteUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Database => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Response envelope: `{message, detail?}`
#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<Value>,
}

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    status: StatusCode,
    message: String,
    detail: Option<Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.status_code(),
            code,
            message: message.into(),
            detail: None,
        }
    }

    /// Override the HTTP status code
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Attach a detail payload passed through to the caller
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    // -------------------------------------------------------------------------
    // Convenience constructors for common error types
    // -------------------------------------------------------------------------

    /// Validation error (400)
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Not found error (404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Unauthorized error (401)
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Forbidden error (403)
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Conflict error (409)
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Remote system rejected the operation for a business reason (400),
    /// carrying the remote detail verbatim
    pub fn remote_business(message: impl Into<String>, detail: Value) -> Self {
        Self::new(ErrorCode::RemoteBusiness, message).with_detail(detail)
    }

    /// Remote system unreachable or failed at transport level (500)
    pub fn remote_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RemoteUnavailable, message)
    }

    /// Database error (500)
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Database, message)
    }

    /// Internal server error (500)
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let response = ErrorResponse {
            message: self.message,
            detail: self.detail,
        };
        (self.status, Json(response)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

// -------------------------------------------------------------------------
// Conversion implementations for common error types
// -------------------------------------------------------------------------

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);

        match &err {
            sqlx::Error::RowNotFound => ApiError::not_found("Resource not found"),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    ApiError::conflict("A resource with this identifier already exists")
                } else if db_err.is_foreign_key_violation() {
                    ApiError::validation("Referenced resource does not exist")
                } else {
                    ApiError::database("A database error occurred")
                }
            }
            _ => ApiError::database("A database error occurred"),
        }
    }
}

// -------------------------------------------------------------------------
// Builder for field-level validation errors
// -------------------------------------------------------------------------

/// Collects per-field validation messages into a single ApiError
#[derive(Debug, Default)]
pub struct ValidationErrorBuilder {
    errors: HashMap<String, Vec<String>>,
}

impl ValidationErrorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Return Ok(()) if no errors, or Err(ApiError) carrying the field map
    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            return Ok(());
        }

        let message = if self.errors.len() == 1 {
            self.errors
                .values()
                .next()
                .and_then(|v| v.first())
                .cloned()
                .unwrap_or_else(|| "Validation failed".to_string())
        } else {
            format!("Validation failed for {} fields", self.errors.len())
        };

        let detail = serde_json::to_value(&self.errors).unwrap_or(Value::Null);
        Err(ApiError::validation(message).with_detail(detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_status_codes() {
        assert_eq!(ErrorCode::Validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorCode::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorCode::RemoteBusiness.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::RemoteUnavailable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::not_found("Pedido no encontrado");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Pedido no encontrado");
    }

    #[test]
    fn test_remote_business_carries_detail() {
        let err = ApiError::remote_business(
            "Error en pedido SAP",
            serde_json::json!("Cliente bloqueado"),
        );
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.detail, Some(serde_json::json!("Cliente bloqueado")));
    }

    #[test]
    fn test_custom_status_code() {
        let err =
            ApiError::remote_unavailable("ERP returned 503").with_status(StatusCode::BAD_REQUEST);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, ErrorCode::RemoteUnavailable);
    }

    #[test]
    fn test_validation_builder_single_field() {
        let mut builder = ValidationErrorBuilder::new();
        builder.add("email", "Email is required");
        assert!(!builder.is_empty());

        let err = builder.finish().unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert!(err.message.contains("Email is required"));
    }

    #[test]
    fn test_validation_builder_multiple_fields() {
        let mut builder = ValidationErrorBuilder::new();
        builder.add("username", "Username is required");
        builder.add("email", "Invalid email format");

        let err = builder.finish().unwrap_err();
        assert!(err.message.contains("2 fields"));
        assert!(err.detail.is_some());
    }

    #[test]
    fn test_validation_builder_empty_is_ok() {
        assert!(ValidationErrorBuilder::new().finish().is_ok());
    }
}
