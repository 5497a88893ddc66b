//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::auth::{AuthService, AuthServiceError};
use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::password::PasswordHasher;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const MIN_SECRET_KEY_LENGTH: usize = 32;

/// Longest accepted token lifetime: one year.
const MAX_TOKEN_TTL_MINUTES: u64 = 525_600;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "Tallybook", about = "Personal budget tracker")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "tallybook.db")]
    pub database: String,

    /// Path to file containing the token signing secret. Prefer using SECRET_KEY env var instead
    #[arg(long)]
    pub secret_key_file: Option<String>,

    /// Lifetime of issued access tokens, in minutes
    #[arg(long, env = "ACCESS_TOKEN_EXPIRE_MINUTES", default_value = "1440",
        value_parser = clap::value_parser!(u64).range(1..=MAX_TOKEN_TTL_MINUTES))]
    pub access_token_expire_minutes: u64,

    /// bcrypt work factor for password hashes
    #[arg(long, default_value = "12", value_parser = clap::value_parser!(u32).range(4..=31))]
    pub bcrypt_cost: u32,

    /// Set the Secure flag on the session cookie (use behind HTTPS)
    #[arg(long)]
    pub secure_cookies: bool,

    /// Header carrying the client IP, e.g. X-Forwarded-For (requires running behind a proxy)
    #[arg(long)]
    pub ip_header: Option<String>,

    /// Disable per-IP rate limiting of login and registration
    #[arg(long)]
    pub no_rate_limit: bool,

    /// Create a superuser from SUPERUSER_USERNAME and SUPERUSER_PASSWORD on startup
    #[arg(long)]
    pub create_superuser: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load the signing secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_secret_key(secret_key_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("SECRET_KEY") {
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("SECRET_KEY") };
        secret
    } else if let Some(path) = secret_key_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret key file");
                return None;
            }
        }
    } else {
        error!(
            "Secret key is required. Set SECRET_KEY environment variable (recommended) or use --secret-key-file"
        );
        return None;
    };

    if secret.len() < MIN_SECRET_KEY_LENGTH {
        error!(
            "Secret key is shorter than {} characters. Use a longer secret",
            MIN_SECRET_KEY_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Handle the --create-superuser flag. An existing user with the same name is
/// left untouched.
pub async fn handle_create_superuser(db: &Database, secret: &str, bcrypt_cost: u32) -> bool {
    let (Ok(username), Ok(password)) = (
        std::env::var("SUPERUSER_USERNAME"),
        std::env::var("SUPERUSER_PASSWORD"),
    ) else {
        error!("--create-superuser needs SUPERUSER_USERNAME and SUPERUSER_PASSWORD");
        return false;
    };

    // The service only hashes here; token settings are irrelevant
    let jwt = Arc::new(JwtConfig::new(secret.as_bytes(), Duration::from_secs(60)));
    let auth = match AuthService::new(db.clone(), jwt, PasswordHasher::new(bcrypt_cost)) {
        Ok(auth) => auth,
        Err(e) => {
            error!(error = %e, "Failed to initialize password hasher");
            return false;
        }
    };

    match auth.register_superuser(&username, &password).await {
        Ok(user) => {
            info!(user_id = user.id, username = %user.username, "Superuser created");
            true
        }
        Err(AuthServiceError::Conflict) => {
            warn!(username = %username, "Superuser already exists, skipping");
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to create superuser");
            false
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, secret: String) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: secret.into_bytes(),
        token_ttl: Duration::from_secs(args.access_token_expire_minutes * 60),
        bcrypt_cost: args.bcrypt_cost,
        secure_cookies: args.secure_cookies,
        rate_limit: !args.no_rate_limit,
        ip_header: args.ip_header.clone(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["tallybook"]).unwrap();
        assert_eq!(args.port, 8000);
        assert_eq!(args.database, "tallybook.db");
        assert_eq!(args.bcrypt_cost, 12);
        assert!(!args.no_rate_limit);
    }

    #[test]
    fn test_token_ttl_in_minutes() {
        let args =
            Args::try_parse_from(["tallybook", "--access-token-expire-minutes", "30"]).unwrap();
        assert_eq!(args.access_token_expire_minutes, 30);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(Args::try_parse_from(["tallybook", "--access-token-expire-minutes", "0"]).is_err());
        assert!(
            Args::try_parse_from(["tallybook", "--access-token-expire-minutes", "525601"]).is_err()
        );
        assert!(
            Args::try_parse_from(["tallybook", "--access-token-expire-minutes", "525600"]).is_ok()
        );
        assert!(Args::try_parse_from(["tallybook", "--bcrypt-cost", "3"]).is_err());
        assert!(Args::try_parse_from(["tallybook", "--bcrypt-cost", "32"]).is_err());
    }

    #[tokio::test]
    async fn test_build_config() {
        let args = Args::try_parse_from([
            "tallybook",
            "--access-token-expire-minutes",
            "2",
            "--no-rate-limit",
            "--ip-header",
            "X-Forwarded-For",
        ])
        .unwrap();
        let db = Database::open(":memory:").await.unwrap();

        let config = build_config(&args, db, "s".repeat(32));
        assert_eq!(config.token_ttl, Duration::from_secs(120));
        assert!(!config.rate_limit);
        assert_eq!(config.ip_header.as_deref(), Some("X-Forwarded-For"));
    }
}
