// User accounts: sign-up and login against the users table.
//
// Passwords are stored as salted PBKDF2-HMAC-SHA256 digests. The digest
// string records its own iteration count, so raising the default later
// doesn't lock out existing users.

use std::sync::Arc;

use anyhow::{Context, Result};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use tracing::{info, warn};

use crate::db::Database;

/// PBKDF2 rounds for newly created passwords.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const SALT_BYTES: usize = 16;

/// Result of a sign-up attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUp {
    Created,
    /// Username or password was empty after trimming.
    EmptyCredentials,
    UsernameTaken,
}

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Carries the trimmed username.
    Success(String),
    /// Nobody has signed up yet.
    NoUsers,
    /// Unknown user or wrong password. Deliberately not distinguished.
    Invalid,
}

impl SignUp {
    pub fn message(&self) -> &'static str {
        match self {
            SignUp::Created => "Account created! Please log in.",
            SignUp::EmptyCredentials => "Username and password cannot be empty",
            SignUp::UsernameTaken => "Username already exists",
        }
    }
}

impl LoginOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            LoginOutcome::Success(_) => "Login successful",
            LoginOutcome::NoUsers => "No users found. Please sign up first.",
            LoginOutcome::Invalid => "Invalid username or password",
        }
    }
}

pub struct UserStore {
    db: Arc<dyn Database>,
    iterations: u32,
}

impl UserStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self::with_iterations(db, DEFAULT_ITERATIONS)
    }

    /// Override the PBKDF2 round count for new passwords.
    pub fn with_iterations(db: Arc<dyn Database>, iterations: u32) -> Self {
        Self {
            db,
            iterations: iterations.max(1),
        }
    }

    pub async fn sign_up(&self, username: &str, password: &str) -> Result<SignUp> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Ok(SignUp::EmptyCredentials);
        }

        let mut salt = [0u8; SALT_BYTES];
        rand::rng().fill_bytes(&mut salt);
        let salt_hex = hex::encode(salt);
        let hash = hash_password(password, &salt, self.iterations)?;

        if self.db.create_user(username, &salt_hex, &hash).await? {
            info!(username, "Created user");
            Ok(SignUp::Created)
        } else {
            Ok(SignUp::UsernameTaken)
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        if self.db.user_count().await? == 0 {
            return Ok(LoginOutcome::NoUsers);
        }

        let username = username.trim();
        let password = password.trim();
        let Some(user) = self.db.get_user(username).await? else {
            // Unknown usernames pay the same hashing cost as a wrong password
            verify_password(password, &[0; SALT_BYTES], &unknown_user_hash(self.iterations))?;
            return Ok(LoginOutcome::Invalid);
        };

        let salt = hex::decode(&user.salt)
            .with_context(|| format!("Corrupt salt stored for user {username}"))?;
        if !verify_password(password, &salt, &user.password_hash)? {
            warn!(username, "Failed login");
            return Ok(LoginOutcome::Invalid);
        }

        self.db.record_login(username).await?;
        Ok(LoginOutcome::Success(username.to_string()))
    }
}

/// Encode a password digest as `pbkdf2-sha256$<iterations>$<hex>`.
pub fn hash_password(password: &str, salt: &[u8], iterations: u32) -> Result<String> {
    let digest = pbkdf2_sha256(password.as_bytes(), salt, iterations);
    Ok(format!("{HASH_SCHEME}${iterations}${}", hex::encode(digest)))
}

/// Check a password against a stored digest string.
pub fn verify_password(password: &str, salt: &[u8], stored: &str) -> Result<bool> {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(iterations), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        anyhow::bail!("Malformed password hash");
    };
    if scheme != HASH_SCHEME {
        anyhow::bail!("Unsupported password hash scheme {scheme:?}");
    }
    let iterations: u32 = iterations
        .parse()
        .context("Malformed iteration count in password hash")?;

    let digest = hex::encode(pbkdf2_sha256(password.as_bytes(), salt, iterations));
    Ok(constant_time_eq(&digest, expected))
}

/// PBKDF2 with HMAC-SHA256, one output block (32 bytes).
fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut output = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut output);
    output
}

/// Well-formed digest that no password matches, checked for unknown users.
fn unknown_user_hash(iterations: u32) -> String {
    format!("{HASH_SCHEME}${iterations}${}", "0".repeat(64))
}

/// Constant-time string comparison to prevent timing attacks.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbkdf2_rfc7914_vector() {
        // RFC 7914 section 11: PBKDF2-HMAC-SHA256("passwd", "salt", 1, 64), first block
        let digest = pbkdf2_sha256(b"passwd", b"salt", 1);
        assert_eq!(
            hex::encode(digest),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn test_unknown_user_hash_runs_full_verification() {
        let stored = unknown_user_hash(10);
        assert!(stored.starts_with("pbkdf2-sha256$10$"));
        assert!(!verify_password("hunter2", &[0; SALT_BYTES], &stored).unwrap());
        assert!(!verify_password("", &[0; SALT_BYTES], &stored).unwrap());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2", b"salty", 10).unwrap();
        assert!(hash.starts_with("pbkdf2-sha256$10$"));
        assert!(verify_password("hunter2", b"salty", &hash).unwrap());
        assert!(!verify_password("hunter3", b"salty", &hash).unwrap());
        assert!(!verify_password("hunter2", b"other", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_errors() {
        assert!(verify_password("x", b"s", "plaintext").is_err());
        assert!(verify_password("x", b"s", "md5$1$abcd").is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
    }
}
