//! Credentials and login sessions
//!
//! Passwords are stored as Argon2id PHC strings. A login issues an opaque
//! random token for the browser cookie; only its SHA-256 digest is stored,
//! so a copy of the database does not yield usable sessions.
//!
//! This module has no HTTP dependencies; cookie handling lives in the server.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{now_timestamp, parse_timestamp};
use crate::{Error, Result};

/// Minimum accepted password length for new users
pub const MIN_PASSWORD_LEN: usize = 8;

// ========================================
// Password hashing
// ========================================

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Auth(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| Error::Auth(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

// ========================================
// Users
// ========================================

/// Create a user, or replace the password of an existing one
pub async fn upsert_user(pool: &SqlitePool, username: &str, password: &str) -> Result<()> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::InvalidInput("Username is required".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let hash = hash_password(password)?;
    let (_, created_at) = now_timestamp();

    sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)
        ON CONFLICT(username) DO UPDATE SET password_hash = excluded.password_hash
        "#,
    )
    .bind(username)
    .bind(&hash)
    .bind(&created_at)
    .execute(pool)
    .await?;

    info!("Stored credentials for user '{}'", username);
    Ok(())
}

/// Check a username/password pair
///
/// Unknown users and wrong passwords both return `Ok(false)`.
pub async fn verify_credentials(pool: &SqlitePool, username: &str, password: &str) -> Result<bool> {
    let stored: Option<String> =
        sqlx::query_scalar("SELECT password_hash FROM users WHERE username = ?")
            .bind(username.trim())
            .fetch_optional(pool)
            .await?;

    match stored {
        Some(hash) => verify_password(password, &hash),
        None => Ok(false),
    }
}

pub async fn user_count(pool: &SqlitePool) -> Result<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

// ========================================
// Sessions
// ========================================

/// Digest stored in place of the raw token
pub fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Open a session for an authenticated user and return the raw token
pub async fn create_session(pool: &SqlitePool, username: &str, ttl: Duration) -> Result<String> {
    let token = Uuid::new_v4().simple().to_string();
    let (now, created_at) = now_timestamp();
    let expires_at = (now + ttl).to_rfc3339_opts(SecondsFormat::Secs, true);

    sqlx::query(
        "INSERT INTO sessions (token_hash, username, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(token_digest(&token))
    .bind(username.trim())
    .bind(&created_at)
    .bind(&expires_at)
    .execute(pool)
    .await?;

    info!("Opened session for '{}'", username.trim());
    Ok(token)
}

/// Resolve a session token to its user; expired sessions are removed
pub async fn session_user(pool: &SqlitePool, token: &str) -> Result<Option<String>> {
    session_user_at(pool, token, Utc::now()).await
}

async fn session_user_at(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let digest = token_digest(token);
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT username, expires_at FROM sessions WHERE token_hash = ?")
            .bind(&digest)
            .fetch_optional(pool)
            .await?;

    let Some((username, expires_at)) = row else {
        return Ok(None);
    };

    if parse_timestamp(Some(&expires_at)) <= now {
        warn!("Session for '{}' expired", username);
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(&digest)
            .execute(pool)
            .await?;
        return Ok(None);
    }

    Ok(Some(username))
}

/// End a session; unknown tokens are ignored
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(token_digest(token))
        .execute(pool)
        .await?;
    Ok(())
}

/// Drop every expired session, returning how many were removed
pub async fn purge_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let (_, now) = now_timestamp();
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(&now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "amhara-nursery-2025";
        let hash = hash_password(password).unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_different_salts() {
        let hash1 = hash_password("same-password").unwrap();
        let hash2 = hash_password("same-password").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(verify_password("password", "not-a-valid-hash").is_err());
    }

    #[test]
    fn test_token_digest_is_stable_hex() {
        let digest = token_digest("abc");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, token_digest("abc"));
        assert_ne!(digest, token_digest("abd"));
    }

    #[tokio::test]
    async fn test_session_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::init_database(&dir.path().join("auth.db")).await.unwrap();
        upsert_user(&pool, "surveyor1", "field-office-01").await.unwrap();

        let token = create_session(&pool, "surveyor1", Duration::hours(1)).await.unwrap();
        assert_eq!(
            session_user(&pool, &token).await.unwrap().as_deref(),
            Some("surveyor1")
        );

        let later = Utc::now() + Duration::hours(2);
        assert_eq!(session_user_at(&pool, &token, later).await.unwrap(), None);
        // Expired session was removed
        assert_eq!(session_user(&pool, &token).await.unwrap(), None);
    }
}
