// Data models — Rust structs that map to database rows.

use serde::Serialize;

/// A registered user. The password itself is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub username: String,
    /// Hex-encoded random salt.
    #[serde(skip)]
    pub salt: String,
    /// `pbkdf2-sha256$<iterations>$<hex digest>`.
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: String,
}
