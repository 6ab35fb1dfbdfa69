//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the database pool, media storage, the validated admin site and
//! the runtime settings handlers need. Everything persistent lives in
//! Postgres; there is no per-request mutable state here.

use std::sync::Arc;

use sqlx::PgPool;

use crate::admin::AdminSite;
use crate::media::MediaStorage;

/// Settings consulted by handlers at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cookie_secure: bool,
    pub session_ttl_days: i64,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cookie_secure: false,
            session_ttl_days: crate::config::DEFAULT_SESSION_TTL_DAYS,
            max_upload_bytes: crate::config::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub media: MediaStorage,
    pub admin: Arc<AdminSite>,
    pub settings: Arc<Settings>,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, media: MediaStorage, admin: AdminSite, settings: Settings) -> Self {
        Self { pool, media, admin: Arc::new(admin), settings: Arc::new(settings) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
