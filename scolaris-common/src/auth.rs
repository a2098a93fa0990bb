//! Credential and token primitives
//!
//! Bearer tokens are signed with a shared secret: the dotted payload
//! (`scl1.<role>.<subject>.<expires-at>`) is hashed with SHA-256
//! together with the secret, and the hex digest rides along as the
//! final token segment. The secret lives in the `settings` table and is
//! generated on first run when no explicit secret is configured.
//!
//! Admin passwords are stored as `salt$digest` where the digest is
//! SHA-256 over the salt followed by the password.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::info;

/// Token format version prefix
const TOKEN_PREFIX: &str = "scl1";

/// Token lifetime: 2 hours
pub const TOKEN_LIFETIME_SECS: i64 = 2 * 60 * 60;

/// Settings key holding the signing secret
const SIGNING_SECRET_KEY: &str = "auth_signing_secret";

/// Caller role carried by a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }

    fn parse(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Verified token contents
#[derive(Debug, Clone)]
pub struct Claims {
    pub role: Role,
    /// Student number (student tokens) or admin id (admin tokens)
    pub subject: String,
    pub expires_at: i64,
}

/// Token verification failures
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("signature mismatch")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

/// Issue a token for `subject` expiring [`TOKEN_LIFETIME_SECS`] from now
pub fn issue_token(role: Role, subject: &str, secret: &str) -> String {
    issue_token_with_expiry(role, subject, now_unix() + TOKEN_LIFETIME_SECS, secret)
}

/// Issue a token with an explicit expiry timestamp (seconds since epoch)
pub fn issue_token_with_expiry(role: Role, subject: &str, expires_at: i64, secret: &str) -> String {
    let sig = signature(role.as_str(), subject, expires_at, secret);
    format!(
        "{}.{}.{}.{}.{}",
        TOKEN_PREFIX,
        role.as_str(),
        subject,
        expires_at,
        sig
    )
}

/// Verify a token's shape, signature, and expiry
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 5 || parts[0] != TOKEN_PREFIX {
        return Err(TokenError::Malformed);
    }

    let role = Role::parse(parts[1]).ok_or(TokenError::Malformed)?;
    let subject = parts[2];
    let expires_at: i64 = parts[3].parse().map_err(|_| TokenError::Malformed)?;

    let expected = signature(parts[1], subject, expires_at, secret);
    if parts[4] != expected {
        return Err(TokenError::BadSignature);
    }

    if expires_at < now_unix() {
        return Err(TokenError::Expired);
    }

    Ok(Claims {
        role,
        subject: subject.to_string(),
        expires_at,
    })
}

fn signature(role: &str, subject: &str, expires_at: i64, secret: &str) -> String {
    let payload = format!("{}.{}.{}.{}.{}", TOKEN_PREFIX, role, subject, expires_at, secret);
    format!("{:x}", Sha256::digest(payload.as_bytes()))
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

// ========================================
// Password Hashing
// ========================================

/// Hash a password with a fresh random salt, producing `salt$digest`
pub fn hash_password(password: &str) -> String {
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    let digest = password_digest(&salt, password);
    format!("{}${}", salt, digest)
}

/// Check a password against a stored `salt$digest` value
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => password_digest(salt, password) == digest,
        None => false,
    }
}

fn password_digest(salt: &str, password: &str) -> String {
    format!("{:x}", Sha256::digest(format!("{}{}", salt, password).as_bytes()))
}

// ========================================
// Signing Secret Management
// ========================================

/// Load the signing secret from settings, generating one on first run
pub async fn load_signing_secret(db: &SqlitePool) -> crate::Result<String> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(SIGNING_SECRET_KEY)
            .fetch_optional(db)
            .await?;

    if let Some((secret,)) = existing {
        return Ok(secret);
    }

    let secret: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect();

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(SIGNING_SECRET_KEY)
        .bind(&secret)
        .execute(db)
        .await?;

    info!("Generated new token signing secret");
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let token = issue_token(Role::Admin, "admin-1", SECRET);
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.subject, "admin-1");
        assert!(claims.expires_at > now_unix());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token_with_expiry(Role::Student, "22001234", now_unix() - 10, SECRET);
        assert!(matches!(
            verify_token(&token, SECRET),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_tampered_subject_rejected() {
        let token = issue_token(Role::Student, "22001234", SECRET);
        let tampered = token.replace("22001234", "22009999");
        assert!(matches!(
            verify_token(&tampered, SECRET),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(Role::Admin, "admin-1", SECRET);
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_garbage_token_malformed() {
        assert!(matches!(
            verify_token("not-a-token", SECRET),
            Err(TokenError::Malformed)
        ));
        assert!(matches!(
            verify_token("v9.admin.x.123.abc", SECRET),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn test_password_round_trip() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn test_password_salts_differ() {
        let a = hash_password("hunter2");
        let b = hash_password("hunter2");
        assert_ne!(a, b);
        assert!(verify_password("hunter2", &a));
        assert!(verify_password("hunter2", &b));
    }
}
