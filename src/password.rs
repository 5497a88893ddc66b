//! Password hashing via bcrypt.

/// bcrypt cost factor used when none is configured.
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// bcrypt only reads this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Salted one-way password hashing.
///
/// Every call to [`PasswordHasher::hash`] draws a fresh salt, so hashing the same
/// password twice yields different digests. The cost factor is embedded in the
/// digest, so [`PasswordHasher::verify`] works for digests made with any cost.
/// Passwords longer than [`MAX_PASSWORD_BYTES`] are refused rather than
/// silently truncated.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a random salt.
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        bcrypt::non_truncating_hash(password, self.cost).map_err(HashError)
    }

    /// Verify a password against a stored digest.
    /// A malformed digest or an overlong password is a mismatch, not an error.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        bcrypt::non_truncating_verify(password, digest).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

/// Error produced when a password cannot be hashed (e.g. an invalid cost).
#[derive(Debug)]
pub struct HashError(bcrypt::BcryptError);

impl std::fmt::Display for HashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to hash password: {}", self.0)
    }
}

impl std::error::Error for HashError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let digest = hasher.hash("p@ss1234").unwrap();

        assert!(hasher.verify("p@ss1234", &digest));
        assert!(!hasher.verify("wrong", &digest));
        assert!(!digest.contains("p@ss1234"));
    }

    #[test]
    fn test_same_password_different_digests() {
        let hasher = hasher();
        let first = hasher.hash("secret").unwrap();
        let second = hasher.hash("secret").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("secret", &first));
        assert!(hasher.verify("secret", &second));
    }

    #[test]
    fn test_verify_ignores_configured_cost() {
        let digest = PasswordHasher::new(5).hash("secret").unwrap();
        assert!(PasswordHasher::new(4).verify("secret", &digest));
    }

    #[test]
    fn test_malformed_digest_is_mismatch() {
        let hasher = hasher();

        assert!(!hasher.verify("secret", ""));
        assert!(!hasher.verify("secret", "not-a-bcrypt-hash"));
        assert!(!hasher.verify("secret", "$2b$04$tooshort"));
    }

    #[test]
    fn test_overlong_password_is_not_truncated() {
        let hasher = hasher();
        let limit = "a".repeat(MAX_PASSWORD_BYTES);
        let digest = hasher.hash(&limit).unwrap();

        assert!(hasher.verify(&limit, &digest));
        // Would match under truncation
        assert!(!hasher.verify(&format!("{}b", limit), &digest));
        assert!(hasher.hash(&format!("{}b", limit)).is_err());
    }

    #[test]
    fn test_invalid_cost_is_error() {
        assert!(PasswordHasher::new(2).hash("secret").is_err());
    }
}
