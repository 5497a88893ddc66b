//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::ApiAuthError;
use super::state::HasAuthBackend;
use crate::db::User;

/// Extractor for endpoints that require an authenticated user.
///
/// Accepts a bearer token or the session cookie and rejects with a JSON
/// error (401/404/500) otherwise.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        state
            .auth()
            .current_principal(&parts.headers)
            .await
            .map(CurrentUser)
    }
}
