//! Account service: signup, password login, staff bootstrap.
//!
//! Passwords are stored as argon2 PHC strings; the plain password never
//! leaves this module.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::User;

pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid username")]
    InvalidUsername,
    #[error("username already taken")]
    UsernameTaken,
    #[error("password too short")]
    WeakPassword,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Usernames are 1..=150 chars of letters, digits and `@.+-_`.
#[must_use]
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.chars().count() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Hash a password into an argon2 PHC string.
///
/// # Errors
///
/// Returns [`AuthError::Hash`] if the salt or hash cannot be produced.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Hash(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string. Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Create a user account.
///
/// # Errors
///
/// Returns a validation error for bad input, [`AuthError::UsernameTaken`] on
/// a unique violation, or a database error.
pub async fn create_user(pool: &PgPool, username: &str, password: &str, is_staff: bool) -> Result<User, AuthError> {
    if !is_valid_username(username) {
        return Err(AuthError::InvalidUsername);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    let password_hash = hash_password(password)?;

    let row = sqlx::query(
        "INSERT INTO users (username, password_hash, is_staff) VALUES ($1, $2, $3)
         RETURNING id, username, is_staff",
    )
    .bind(username)
    .bind(&password_hash)
    .bind(is_staff)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AuthError::UsernameTaken,
        other => AuthError::Db(other),
    })?;

    tracing::info!(%username, is_staff, "user created");
    Ok(User { id: row.get("id"), username: row.get("username"), is_staff: row.get("is_staff") })
}

/// Resolve username + password to a user.
///
/// # Errors
///
/// Returns [`AuthError::InvalidCredentials`] when the user is unknown or the
/// password does not match.
pub async fn authenticate(pool: &PgPool, username: &str, password: &str) -> Result<User, AuthError> {
    let row = sqlx::query("SELECT id, username, is_staff, password_hash FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let stored: String = row.get("password_hash");
    if !verify_password(password, &stored) {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(User { id: row.get("id"), username: row.get("username"), is_staff: row.get("is_staff") })
}

/// Look up a user by username.
pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query("SELECT id, username, is_staff FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| User { id: r.get("id"), username: r.get("username"), is_staff: r.get("is_staff") }))
}

/// Ensure a staff account with these credentials exists. Returns its id.
///
/// # Errors
///
/// Returns a validation, hashing or database error.
pub async fn ensure_staff(pool: &PgPool, username: &str, password: &str) -> Result<Uuid, AuthError> {
    if !is_valid_username(username) {
        return Err(AuthError::InvalidUsername);
    }
    let password_hash = hash_password(password)?;
    let row = sqlx::query(
        "INSERT INTO users (username, password_hash, is_staff) VALUES ($1, $2, TRUE)
         ON CONFLICT (username) DO UPDATE SET password_hash = EXCLUDED.password_hash, is_staff = TRUE
         RETURNING id",
    )
    .bind(username)
    .bind(&password_hash)
    .fetch_one(pool)
    .await?;
    Ok(row.get("id"))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
