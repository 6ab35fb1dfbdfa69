//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds every HTTP endpoint under a single Axum router: public
//! post listings, the post create/edit/comment flows, auth, the admin
//! back-office, and uploaded media served straight from the media root.

pub mod admin;
pub mod auth;
pub mod posts;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::forms::FormErrors;
use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let media = ServeDir::new(state.media.root());
    let body_limit = DefaultBodyLimit::max(state.settings.max_upload_bytes);

    Router::new()
        .route("/", get(posts::index))
        .route("/group/{slug}/", get(posts::group_posts))
        .route("/profile/{username}/", get(posts::profile))
        .route("/posts/{post_id}/", get(posts::post_detail))
        .route("/create/", get(posts::create_form).post(posts::create_post))
        .route("/posts/{post_id}/edit/", get(posts::edit_form).post(posts::edit_post))
        .route("/posts/{post_id}/comment/", post(posts::add_comment))
        .route("/auth/signup/", post(auth::signup))
        .route("/auth/login/", get(auth::login_form).post(auth::login))
        .route("/auth/logout/", post(auth::logout))
        .route("/admin/", get(admin::index))
        .route("/admin/group/add/", post(admin::add_group))
        .route("/admin/{entity}/", get(admin::changelist))
        .route("/admin/{entity}/{pk}/", post(admin::inline_edit))
        .route("/healthz", get(healthz))
        .nest_service("/media", media)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 422 with `{"errors": {field: [messages]}}`.
pub(crate) fn form_errors_response(errors: FormErrors) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(serde_json::json!({ "errors": errors }))).into_response()
}

/// Log an unexpected failure and hide it behind a 500.
pub(crate) fn internal_error(error: &dyn std::fmt::Display, context: &'static str) -> Response {
    tracing::error!(error = %error, context, "request failed");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
