pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;

use api::create_api_router;
use auth::AuthService;
use axum::Router;
use db::Database;
use jwt::JwtConfig;
use password::{HashError, PasswordHasher};
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing access tokens (HS256)
    pub jwt_secret: Vec<u8>,
    /// Lifetime of issued access tokens
    pub token_ttl: Duration,
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
    /// Whether credential endpoints are rate limited per client IP
    pub rate_limit: bool,
    /// Header carrying the client IP (requires running behind a proxy)
    pub ip_header: Option<String>,
}

/// Create the application router with the given configuration.
///
/// Rate limiter state is not pruned here; use `run_server` for a long-running
/// process.
pub fn create_app(config: &ServerConfig) -> Result<Router, HashError> {
    build_router(config, rate_limiter(config))
}

fn rate_limiter(config: &ServerConfig) -> Option<Arc<RateLimitConfig>> {
    config
        .rate_limit
        .then(|| Arc::new(RateLimitConfig::new(config.ip_header.clone())))
}

fn build_router(
    config: &ServerConfig,
    rate_limit: Option<Arc<RateLimitConfig>>,
) -> Result<Router, HashError> {
    let jwt = Arc::new(JwtConfig::new(&config.jwt_secret, config.token_ttl));
    let auth = AuthService::new(
        config.db.clone(),
        jwt,
        PasswordHasher::new(config.bcrypt_cost),
    )?
    .with_secure_cookies(config.secure_cookies);

    Ok(create_api_router(auth, rate_limit))
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Idle rate limiter buckets are pruned in the background while it runs.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let rate_limit = rate_limiter(&config);
    let app = build_router(&config, rate_limit.clone()).map_err(std::io::Error::other)?;
    let cleanup = rate_limit.as_ref().map(RateLimitConfig::spawn_cleanup);

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    let result = axum::serve(listener, make_service).await;

    if let Some(cleanup) = cleanup {
        cleanup.abort();
    }
    result
}
