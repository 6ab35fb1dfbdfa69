mod admin;
mod config;
mod db;
mod forms;
mod media;
mod models;
mod pagination;
mod routes;
mod services;
mod state;

use config::Config;
use media::MediaStorage;
use state::{AppState, Settings};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("media root: {0}")]
    Media(#[from] media::MediaError),
    #[error("{0}")]
    Admin(#[from] admin::AdminError),
    #[error("admin bootstrap: {0}")]
    Bootstrap(#[from] services::auth::AuthError),
    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "startup failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env loaded");
    }
    let config = Config::from_env()?;

    let site = admin::default_site();
    site.check()?;

    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;

    let media = MediaStorage::new(&config.media_root);
    media.ensure_root().await?;

    if let Some(bootstrap) = &config.admin {
        let id = services::auth::ensure_staff(&pool, &bootstrap.username, &bootstrap.password).await?;
        tracing::info!(username = %bootstrap.username, %id, "staff account ensured");
    }

    match services::session::purge_expired(&pool).await {
        Ok(n) if n > 0 => tracing::info!(purged = n, "expired sessions removed"),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "session purge failed"),
    }

    let settings = Settings {
        cookie_secure: config.cookie_secure,
        session_ttl_days: config.session_ttl_days,
        max_upload_bytes: config.max_upload_bytes,
    };
    let state = AppState::new(pool, media, site, settings);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tracing::info!(port = config.port, media_root = %config.media_root.display(), "yatube listening");
    axum::serve(listener, app).await?;
    Ok(())
}
