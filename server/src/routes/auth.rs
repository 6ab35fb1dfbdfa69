//! Auth routes: signup, password login, logout, and the session extractor.

use axum::extract::{FromRef, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;

use super::form_errors_response;
use crate::forms::{FormErrors, MSG_REQUIRED};
use crate::models::User;
use crate::services::auth::{self as auth_svc, AuthError, MIN_PASSWORD_LEN};
use crate::services::session;
use crate::state::AppState;

pub const COOKIE_NAME: &str = "session_token";
pub const LOGIN_PATH: &str = "/auth/login/";

pub const MSG_BAD_LOGIN: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";
pub const MSG_PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const MSG_USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const MSG_USERNAME_INVALID: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";

/// `/auth/login/?next=<path>` for the given request path (and query).
#[must_use]
pub fn login_url(next: &str) -> String {
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    format!("{LOGIN_PATH}?next={encoded}")
}

/// Only same-site relative paths are accepted as post-login targets.
#[must_use]
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') && !next.contains("://")
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the session cookie.
/// Use as a handler parameter to require authentication; anonymous requests
/// are redirected to the login page with `next` pointing back here.
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned());
        let login_redirect = || Redirect::to(&login_url(&next)).into_response();

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(login_redirect());
        }

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            })?
            .ok_or_else(login_redirect)?;

        Ok(Self { user, token: token.to_owned() })
    }
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

async fn start_session(state: &AppState, jar: CookieJar, user: &User, next: &str) -> Response {
    let token = match session::create_session(&state.pool, user.id, state.settings.session_ttl_days).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session").into_response();
        }
    };
    tracing::info!(username = %user.username, "user logged in");
    let jar = jar.add(session_cookie(token, state.settings.cookie_secure));
    (jar, Redirect::to(next)).into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

/// `GET /auth/login/`: describe the login form and the pending `next`.
pub async fn login_form(Query(query): Query<NextQuery>) -> Json<serde_json::Value> {
    let next = query.next.filter(|n| is_safe_next(n));
    Json(serde_json::json!({
        "fields": ["username", "password"],
        "next": next,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    next: Option<String>,
}

/// `POST /auth/login/`: verify credentials, set cookie, redirect to `next` or `/`.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut errors = FormErrors::new();
    if form.username.trim().is_empty() {
        errors.add("username", MSG_REQUIRED);
    }
    if form.password.is_empty() {
        errors.add("password", MSG_REQUIRED);
    }
    if !errors.is_empty() {
        return form_errors_response(errors);
    }

    let user = match auth_svc::authenticate(&state.pool, form.username.trim(), &form.password).await {
        Ok(u) => u,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!(username = %form.username.trim(), "login rejected");
            return form_errors_response(FormErrors::single("__all__", MSG_BAD_LOGIN));
        }
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let next = form
        .next
        .or(query.next)
        .filter(|n| is_safe_next(n))
        .unwrap_or_else(|| "/".to_owned());
    start_session(&state, jar, &user, &next).await
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password1: String,
    #[serde(default)]
    password2: String,
}

/// Field checks for signup that need no database access.
pub(crate) fn validate_signup(form: &SignupForm) -> FormErrors {
    let mut errors = FormErrors::new();
    let username = form.username.trim();
    if username.is_empty() {
        errors.add("username", MSG_REQUIRED);
    } else if !auth_svc::is_valid_username(username) {
        errors.add("username", MSG_USERNAME_INVALID);
    }
    if form.password1.is_empty() {
        errors.add("password1", MSG_REQUIRED);
    }
    if form.password2.is_empty() {
        errors.add("password2", MSG_REQUIRED);
    } else if form.password1 != form.password2 {
        errors.add("password2", MSG_PASSWORD_MISMATCH);
    } else if form.password2.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password2",
            format!("This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."),
        );
    }
    errors
}

/// `POST /auth/signup/`: create an account and log it in.
pub async fn signup(State(state): State<AppState>, jar: CookieJar, Form(form): Form<SignupForm>) -> Response {
    let errors = validate_signup(&form);
    if !errors.is_empty() {
        return form_errors_response(errors);
    }

    let user = match auth_svc::create_user(&state.pool, form.username.trim(), &form.password1, false).await {
        Ok(u) => u,
        Err(AuthError::UsernameTaken) => {
            return form_errors_response(FormErrors::single("username", MSG_USERNAME_TAKEN));
        }
        Err(AuthError::InvalidUsername) => {
            return form_errors_response(FormErrors::single("username", MSG_USERNAME_INVALID));
        }
        Err(e) => {
            tracing::error!(error = %e, "signup failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    start_session(&state, jar, &user, "/").await
}

/// `POST /auth/logout/`: delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = session::delete_session(&state.pool, &auth.token).await {
        tracing::warn!(error = %e, "session delete failed");
    }

    let cookie = Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.settings.cookie_secure)
        .max_age(Duration::ZERO);

    let jar = CookieJar::new().add(cookie);
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
