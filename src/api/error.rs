//! Shared error handling for API endpoints.

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, PathRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error};

use crate::auth::AuthServiceError;

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn db_err(self, msg: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn db_err(self, msg: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::db_error(msg, e))
    }
}

/// API error type with automatic response conversion.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    UnsupportedMediaType(String),
    UnprocessableEntity(String),
    TooManyRequests(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn too_many_requests(msg: impl Into<String>) -> Self {
        Self::TooManyRequests(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn db_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!(error = %e, "{}", context);
        Self::Internal("Database error".into())
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(e: AuthServiceError) -> Self {
        match e {
            AuthServiceError::InvalidUsername
            | AuthServiceError::InvalidPassword
            | AuthServiceError::Conflict => {
                Self::BadRequest(e.to_string())
            }
            AuthServiceError::InvalidCredentials => Self::Unauthorized(e.to_string()),
            AuthServiceError::Store(e) => Self::db_error("Credential store failure", e),
            AuthServiceError::Hashing(_)
            | AuthServiceError::Token(_)
            | AuthServiceError::Task(_) => {
                error!(error = %e, "Authentication failure");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "Rejected JSON body");
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                Self::UnsupportedMediaType("Expected a JSON request body".into())
            }
            JsonRejection::JsonDataError(_) => {
                Self::UnprocessableEntity("Invalid request body".into())
            }
            _ => Self::bad_request("Malformed JSON request body"),
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        debug!(error = %rejection.body_text(), "Rejected form body");
        match rejection {
            FormRejection::InvalidFormContentType(_) => {
                Self::UnsupportedMediaType("Expected a form request body".into())
            }
            FormRejection::FailedToDeserializeForm(_)
            | FormRejection::FailedToDeserializeFormBody(_) => {
                Self::UnprocessableEntity("Invalid form data".into())
            }
            _ => Self::bad_request("Malformed form request body"),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!(error = %rejection.body_text(), "Rejected path parameters");
        Self::bad_request("Invalid path parameter")
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        let mut response = (status, Json(ErrorResponse { error: message })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Validate a category name and return it trimmed.
pub fn validate_category_name(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Category name cannot be empty"));
    }
    if name.chars().count() > 100 {
        return Err(ApiError::bad_request(
            "Category name cannot be longer than 100 characters",
        ));
    }
    Ok(name)
}

/// Validate an expense amount: finite and strictly positive.
pub fn validate_amount(amount: f64) -> Result<f64, ApiError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::bad_request("Expense amount must be greater than 0"));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_name_trimmed() {
        assert_eq!(validate_category_name("  Food ").unwrap(), "Food");
        assert!(validate_category_name("   ").is_err());
        assert!(validate_category_name(&"x".repeat(101)).is_err());
        assert!(validate_category_name(&"x".repeat(100)).is_ok());
    }

    #[test]
    fn test_amount_bounds() {
        assert!(validate_amount(0.01).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-5.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn test_service_errors_map_to_statuses() {
        let status = |e: AuthServiceError| ApiError::from(e).into_response().status();
        assert_eq!(status(AuthServiceError::Conflict), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(AuthServiceError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(AuthServiceError::Store(sqlx::Error::PoolTimedOut)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rate_limit_errors_are_json() {
        let response = ApiError::too_many_requests("slow down").into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let response = ApiError::forbidden("no ip").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
