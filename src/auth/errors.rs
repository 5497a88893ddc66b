//! Authentication error types.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::cookie::clear_session_cookie;

/// Why a request could not be resolved to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// No token in the header or cookie
    NotAuthenticated,
    /// Bad signature, wrong algorithm, malformed or expired token
    InvalidToken,
    /// Token is valid but its user no longer exists
    UserNotFound,
    /// The credential store could not be reached
    DatabaseError,
}

/// API authentication errors (JSON body; clears the session cookie when the
/// rejected token came from it).
#[derive(Debug)]
pub struct ApiAuthError {
    pub kind: AuthErrorKind,
    /// `Some(secure)` when the response must clear the session cookie
    pub(super) clear_cookie: Option<bool>,
}

impl ApiAuthError {
    pub(super) fn new(kind: AuthErrorKind) -> Self {
        Self {
            kind,
            clear_cookie: None,
        }
    }

    pub(super) fn clearing_cookie(kind: AuthErrorKind, secure: bool) -> Self {
        Self {
            kind,
            clear_cookie: Some(secure),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            AuthErrorKind::NotAuthenticated | AuthErrorKind::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthErrorKind::UserNotFound => StatusCode::NOT_FOUND,
            AuthErrorKind::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::NotAuthenticated => "Not authenticated",
            AuthErrorKind::InvalidToken => "Invalid or expired token",
            AuthErrorKind::UserNotFound => "User not found",
            AuthErrorKind::DatabaseError => "Database error",
        }
    }
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ApiAuthError {}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        let status = self.status_code();
        let mut response = (
            status,
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response();

        let headers = response.headers_mut();
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        if let Some(secure) = self.clear_cookie {
            if let Ok(value) = HeaderValue::from_str(&clear_session_cookie(secure)) {
                headers.append(header::SET_COOKIE, value);
            }
        }

        response
    }
}
