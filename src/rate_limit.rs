//! Rate limiting for credential endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password
//! guessing and registration spam. Buckets that have fully refilled are
//! dropped periodically so the per-IP maps stay bounded by recent traffic.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::auth::extract_client_ip;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

const LOGIN_PER_SEC: NonZeroU32 = NonZeroU32::new(1).unwrap();
const LOGIN_BURST: NonZeroU32 = NonZeroU32::new(5).unwrap();
const REGISTER_PER_MIN: NonZeroU32 = NonZeroU32::new(3).unwrap();

/// Interval between prunes of idle client buckets.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Rate limiting configuration for credential endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Token issuance and form login (burst of 5, then 1 per second)
    pub login: Arc<IpLimiter>,
    /// Registration (3 per minute)
    pub register: Arc<IpLimiter>,
    /// Header carrying the client IP when running behind a proxy
    pub ip_header: Option<String>,
}

impl RateLimitConfig {
    pub fn new(ip_header: Option<String>) -> Self {
        Self::with_quotas(
            Quota::per_second(LOGIN_PER_SEC).allow_burst(LOGIN_BURST),
            Quota::per_minute(REGISTER_PER_MIN),
            ip_header,
        )
    }

    fn with_quotas(login: Quota, register: Quota, ip_header: Option<String>) -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(login)),
            register: Arc::new(RateLimiter::keyed(register)),
            ip_header,
        }
    }

    /// Forget clients whose buckets have fully refilled. Clients still being
    /// throttled keep their state.
    pub fn retain_recent(&self) {
        for limiter in [&self.login, &self.register] {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    }

    /// Spawn a background task that prunes idle client buckets periodically.
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_cleanup(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let config = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

            loop {
                interval.tick().await;
                config.retain_recent();
                debug!(
                    login_clients = config.login.len(),
                    register_clients = config.register.len(),
                    "Pruned rate limiter state"
                );
            }
        })
    }
}

/// Returns the rejection, or `Ok` when the request may proceed.
fn check(
    limiter: &IpLimiter,
    ip_header: Option<&str>,
    request: &Request,
    denied: &'static str,
) -> Result<(), ApiError> {
    let ip = extract_client_ip(request, ip_header).map_err(|reason| {
        warn!(reason, "Refusing request without client IP");
        ApiError::forbidden("Unable to determine client IP.")
    })?;

    limiter.check_key(&ip).map_err(|_| {
        warn!(ip = %ip, path = %request.uri().path(), "Rate limit exceeded");
        ApiError::too_many_requests(denied)
    })
}

/// Middleware for rate limiting credential checks.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match check(
        &config.login,
        config.ip_header.as_deref(),
        &request,
        "Too many authentication attempts. Please wait before trying again.",
    ) {
        Ok(()) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}

/// Middleware for rate limiting registrations.
pub async fn rate_limit_register(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match check(
        &config.register,
        config.ip_header.as_deref(),
        &request,
        "Too many signup attempts. Please wait before trying again.",
    ) {
        Ok(()) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}
