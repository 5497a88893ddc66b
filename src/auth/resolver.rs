//! Request identity resolution.
//!
//! Steps, first failure wins:
//! 1. pick the candidate token (bearer header, then session cookie)
//! 2. verify signature and expiry
//! 3. load the user the token was issued for
//!
//! Token verification is pure computation; the only await point is the user
//! lookup, and no lock is held across it.

use axum::http::HeaderMap;
use tracing::{debug, error, warn};

use super::credentials::{TokenSource, candidate_token};
use super::errors::{ApiAuthError, AuthErrorKind};
use crate::db::{Database, User};
use crate::jwt::JwtConfig;

/// Resolve the authenticated user for a request.
pub async fn resolve_principal(
    headers: &HeaderMap,
    jwt: &JwtConfig,
    db: &Database,
    secure_cookies: bool,
) -> Result<User, ApiAuthError> {
    let candidate = candidate_token(headers).ok_or_else(|| {
        debug!("No access token in request");
        ApiAuthError::new(AuthErrorKind::NotAuthenticated)
    })?;

    let source = candidate.source;
    let reject = move |kind| match source {
        TokenSource::Cookie => ApiAuthError::clearing_cookie(kind, secure_cookies),
        TokenSource::Header => ApiAuthError::new(kind),
    };

    let user_id = jwt.verify(candidate.token).map_err(|e| {
        warn!(source = ?source, error = %e, "Rejected access token");
        reject(AuthErrorKind::InvalidToken)
    })?;

    let user = db
        .users()
        .get_by_id(user_id)
        .await
        .map_err(|e| {
            error!(user_id, error = %e, "Failed to get user");
            ApiAuthError::new(AuthErrorKind::DatabaseError)
        })?
        .ok_or_else(|| {
            warn!(user_id, "User not found for valid token");
            reject(AuthErrorKind::UserNotFound)
        })?;

    debug!(user_id = user.id, username = %user.username, "User authenticated");
    Ok(user)
}
