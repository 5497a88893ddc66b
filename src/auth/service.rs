//! Registration, login and principal resolution.
//!
//! Both HTTP adapters (JSON API and form/cookie) call into this service, so the
//! rules live in one place.

use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::errors::ApiAuthError;
use super::resolver::resolve_principal;
use crate::db::{CreateUserError, Database, NewUser, User};
use crate::jwt::{AccessTokenResult, JwtConfig, JwtError};
use crate::password::{HashError, MAX_PASSWORD_BYTES, PasswordHasher};

/// Maximum username length in characters.
pub const MAX_USERNAME_LEN: usize = 50;

/// Errors from registration and login.
#[derive(Debug)]
pub enum AuthServiceError {
    /// Username is empty or too long
    InvalidUsername,
    /// Password is longer than bcrypt can hash without truncating
    InvalidPassword,
    /// Username already exists
    Conflict,
    /// Unknown username or wrong password; deliberately indistinguishable
    InvalidCredentials,
    /// Credential store failure
    Store(sqlx::Error),
    Hashing(HashError),
    Token(JwtError),
    /// The blocking hashing task panicked or was cancelled
    Task(tokio::task::JoinError),
}

impl std::fmt::Display for AuthServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthServiceError::InvalidUsername => write!(
                f,
                "Username must be between 1 and {} characters",
                MAX_USERNAME_LEN
            ),
            AuthServiceError::InvalidPassword => write!(
                f,
                "Password cannot be longer than {} bytes",
                MAX_PASSWORD_BYTES
            ),
            AuthServiceError::Conflict => write!(f, "Username already exists."),
            AuthServiceError::InvalidCredentials => write!(f, "Invalid credentials."),
            AuthServiceError::Store(e) => write!(f, "Credential store error: {}", e),
            AuthServiceError::Hashing(e) => write!(f, "{}", e),
            AuthServiceError::Token(e) => write!(f, "{}", e),
            AuthServiceError::Task(e) => write!(f, "Hashing task failed: {}", e),
        }
    }
}

impl std::error::Error for AuthServiceError {}

impl From<sqlx::Error> for AuthServiceError {
    fn from(e: sqlx::Error) -> Self {
        AuthServiceError::Store(e)
    }
}

/// Authentication service shared by every route group.
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: Arc<JwtConfig>,
    hasher: PasswordHasher,
    /// Digest checked when the username is unknown, so a miss costs the same
    /// as a wrong password.
    dummy_hash: Arc<str>,
    /// Whether session cookies carry the Secure attribute
    secure_cookies: bool,
}

impl AuthService {
    pub fn new(db: Database, jwt: Arc<JwtConfig>, hasher: PasswordHasher) -> Result<Self, HashError> {
        let dummy_hash = hasher.hash("tallybook-dummy-password")?;
        Ok(Self {
            db,
            jwt,
            hasher,
            dummy_hash: dummy_hash.into(),
            secure_cookies: false,
        })
    }

    /// Mark session cookies set or cleared on behalf of this service as Secure.
    pub fn with_secure_cookies(mut self, secure_cookies: bool) -> Self {
        self.secure_cookies = secure_cookies;
        self
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }

    /// Register a regular user.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthServiceError> {
        self.create_user(username, password, false).await
    }

    /// Register a user with the superuser flag set.
    pub async fn register_superuser(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, AuthServiceError> {
        self.create_user(username, password, true).await
    }

    async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_superuser: bool,
    ) -> Result<User, AuthServiceError> {
        let len = username.chars().count();
        if len == 0 || len > MAX_USERNAME_LEN {
            return Err(AuthServiceError::InvalidUsername);
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthServiceError::InvalidPassword);
        }

        if self.db.users().get_by_username(username).await?.is_some() {
            warn!(username = %username, "Registration rejected: username already exists");
            return Err(AuthServiceError::Conflict);
        }

        let password_hash = self.hash_password(password).await?;

        // A concurrent registration may have won since the check above; the
        // unique index turns that into the same conflict.
        let id = self
            .db
            .users()
            .create(&NewUser {
                username,
                password_hash: &password_hash,
                is_superuser,
            })
            .await
            .map_err(|e| match e {
                CreateUserError::UsernameTaken => {
                    warn!(username = %username, "Registration lost race for username");
                    AuthServiceError::Conflict
                }
                CreateUserError::Database(e) => AuthServiceError::Store(e),
            })?;

        info!(user_id = id, username = %username, is_superuser, "User created");

        Ok(User {
            id,
            username: username.to_string(),
            password_hash,
            is_active: true,
            is_superuser,
        })
    }

    /// Check credentials and issue an access token with the configured lifetime.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccessTokenResult, AuthServiceError> {
        let user = self.db.users().get_by_username(username).await?;

        let digest: Arc<str> = match &user {
            Some(user) => user.password_hash.as_str().into(),
            None => self.dummy_hash.clone(),
        };
        let password_ok = self.verify_password(password, digest).await?;

        let user = match user {
            Some(user) if password_ok => user,
            _ => {
                warn!(username = %username, "Invalid credentials");
                return Err(AuthServiceError::InvalidCredentials);
            }
        };

        let token = self.jwt.generate_access_token(user.id).map_err(|e| {
            error!(user_id = user.id, error = %e, "Failed to generate access token");
            AuthServiceError::Token(e)
        })?;

        info!(user_id = user.id, username = %user.username, "Access token issued");
        Ok(token)
    }

    /// Resolve the user behind a request's bearer header or session cookie.
    pub async fn current_principal(&self, headers: &HeaderMap) -> Result<User, ApiAuthError> {
        resolve_principal(headers, &self.jwt, &self.db, self.secure_cookies).await
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthServiceError> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(AuthServiceError::Task)?
            .map_err(AuthServiceError::Hashing)
    }

    async fn verify_password(
        &self,
        password: &str,
        digest: Arc<str>,
    ) -> Result<bool, AuthServiceError> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(AuthServiceError::Task)
    }
}
