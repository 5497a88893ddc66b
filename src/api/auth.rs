//! Authentication endpoints.
//!
//! Two thin adapters over the same `AuthService`: a JSON API (bearer tokens)
//! and a form/cookie flow for browsers.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use super::error::ApiError;
use super::extract::{ApiForm, ApiJson};
use crate::auth::{AuthService, CurrentUser, clear_session_cookie, session_cookie};
use crate::impl_has_auth_backend;
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_register};

/// Where a successful form login lands.
const LOGIN_REDIRECT: &str = "/dashboard";

#[derive(Clone)]
pub struct AuthState {
    pub auth: AuthService,
    pub rate_limit: Option<Arc<RateLimitConfig>>,
}

impl_has_auth_backend!(AuthState);

pub fn router(state: AuthState) -> Router {
    let register_router = Router::new()
        .route("/auth/", post(register_json))
        .route("/auth", post(register_json))
        .route("/auth/register", post(register_form))
        .with_state(state.clone());

    let login_router = Router::new()
        .route("/auth/token", post(issue_token))
        .route("/auth/login", post(login_form))
        .with_state(state.clone());

    let (register_router, login_router) = match &state.rate_limit {
        Some(config) => (
            register_router.layer(middleware::from_fn_with_state(
                config.clone(),
                rate_limit_register,
            )),
            login_router.layer(middleware::from_fn_with_state(
                config.clone(),
                rate_limit_login,
            )),
        ),
        None => (register_router, login_router),
    };

    let session_router = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/logout", get(logout))
        .with_state(state);

    Router::new()
        .merge(register_router)
        .merge(login_router)
        .merge(session_router)
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
}

#[derive(Serialize)]
struct MeResponse {
    user_id: i64,
    username: String,
    is_active: bool,
    is_superuser: bool,
}

async fn register_json(
    State(state): State<AuthState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth
        .register(&payload.username, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully".into(),
        }),
    ))
}

async fn register_form(
    State(state): State<AuthState>,
    ApiForm(payload): ApiForm<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .auth
        .register(&payload.username, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!(
                "Registration successful for user '{}'. Please sign in.",
                user.username
            ),
        }),
    ))
}

async fn issue_token(
    State(state): State<AuthState>,
    ApiForm(payload): ApiForm<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .auth
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(TokenResponse {
        access_token: token.token,
        token_type: "bearer",
    }))
}

async fn login_form(
    State(state): State<AuthState>,
    ApiForm(payload): ApiForm<Credentials>,
) -> Result<Response, ApiError> {
    let token = state
        .auth
        .login(&payload.username, &payload.password)
        .await?;

    let cookie = session_cookie(&token.token, token.duration, state.auth.secure_cookies());
    let cookie = HeaderValue::from_str(&cookie).map_err(|e| {
        error!(error = %e, "Failed to build session cookie");
        ApiError::internal("Internal server error")
    })?;

    let mut response = Redirect::to(LOGIN_REDIRECT).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

async fn me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.id,
        username: user.username,
        is_active: user.is_active,
        is_superuser: user.is_superuser,
    })
}

async fn logout(State(state): State<AuthState>) -> Response {
    let mut response = Redirect::to("/").into_response();
    if let Ok(cookie) = HeaderValue::from_str(&clear_session_cookie(state.auth.secure_cookies())) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}
