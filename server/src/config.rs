//! Server configuration parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! `main` loads `.env` (if present) through `dotenvy`, then builds a typed
//! `Config` once at startup. Parsing goes through a lookup closure so tests
//! never have to mutate the process environment.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MEDIA_ROOT: &str = "media";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 14;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Staff account ensured at startup when both credentials are configured.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub media_root: PathBuf,
    pub max_upload_bytes: usize,
    pub cookie_secure: bool,
    pub session_ttl_days: i64,
    pub admin: Option<AdminBootstrap>,
}

impl Config {
    /// Build config from the process environment.
    ///
    /// Required:
    /// - `DATABASE_URL`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `MEDIA_ROOT`: default `media`
    /// - `MAX_UPLOAD_BYTES`: default 5 MiB
    /// - `COOKIE_SECURE`: default false
    /// - `SESSION_TTL_DAYS`: default 14
    /// - `ADMIN_USERNAME` + `ADMIN_PASSWORD`: staff account bootstrap
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"), DEFAULT_DB_MAX_CONNECTIONS)?;
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", lookup("MAX_UPLOAD_BYTES"), DEFAULT_MAX_UPLOAD_BYTES)?;
        let session_ttl_days = parse_or("SESSION_TTL_DAYS", lookup("SESSION_TTL_DAYS"), DEFAULT_SESSION_TTL_DAYS)?;
        if session_ttl_days <= 0 {
            return Err(ConfigError::Invalid { key: "SESSION_TTL_DAYS", value: session_ttl_days.to_string() });
        }

        let cookie_secure = match lookup("COOKIE_SECURE") {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { key: "COOKIE_SECURE", value: raw })?,
        };

        let media_root = lookup("MEDIA_ROOT")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT), PathBuf::from);

        let admin = match (lookup("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(AdminBootstrap { username, password })
            }
            _ => None,
        };

        Ok(Self {
            database_url,
            port,
            db_max_connections,
            media_root,
            max_upload_bytes,
            cookie_secure,
            session_ttl_days,
            admin,
        })
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
