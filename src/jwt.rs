//! JWT access token generation and validation.
//!
//! Tokens are stateless: validity is decided by the HS256 signature and the
//! `exp` claim alone. Nothing is stored server-side, so a token stays usable
//! until it expires even after the client drops it. Rotating the secret
//! invalidates every outstanding token.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default access token lifetime: 1440 minutes.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(1440 * 60);

/// The only accepted signature algorithm.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (database user ID)
    pub user_id: i64,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

/// Result of generating an access token.
#[derive(Debug, Clone)]
pub struct AccessTokenResult {
    /// The JWT token string
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret and token lifetime.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Configured lifetime of tokens issued at login.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate an access token for a user with the configured lifetime.
    pub fn generate_access_token(&self, user_id: i64) -> Result<AccessTokenResult, JwtError> {
        let token = self.issue(user_id, self.ttl)?;
        Ok(AccessTokenResult {
            token,
            duration: self.ttl.as_secs(),
        })
    }

    /// Issue a token for `user_id` that expires `ttl` from now.
    pub fn issue(&self, user_id: i64, ttl: Duration) -> Result<String, JwtError> {
        self.issue_at(user_id, ttl, unix_now()?)
    }

    fn issue_at(&self, user_id: i64, ttl: Duration, now: u64) -> Result<String, JwtError> {
        let claims = AccessClaims {
            user_id,
            iat: now,
            exp: now.saturating_add(ttl.as_secs()),
        };

        jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)
    }

    /// Validate a token and return the user ID it was issued for.
    pub fn verify(&self, token: &str) -> Result<i64, JwtError> {
        self.verify_at(token, unix_now()?)
    }

    fn verify_at(&self, token: &str, now: u64) -> Result<i64, JwtError> {
        // Expiry is checked below against `now` so that `exp == now` counts as expired.
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = false;

        let token_data =
            jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &validation)
                .map_err(JwtError::Invalid)?;

        if token_data.claims.exp <= now {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims.user_id)
    }
}

fn unix_now() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Token is past its expiry
    Expired,
    /// Bad signature, wrong algorithm, malformed token or claims
    Invalid(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Expired => write!(f, "Token has expired"),
            JwtError::Invalid(e) => write!(f, "Invalid token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}
