//! Admin routes: staff-only changelists, inline edits, and group creation.
//!
//! DESIGN
//! ======
//! Every handler takes a `StaffUser`, so anonymous requests are redirected to
//! the login page and signed-in non-staff users get 403. Listings come from
//! the registrations in `AppState::admin`; only columns named in a
//! registration's `list_editable` accept inline edits.

use std::collections::HashMap;

use axum::Form;
use axum::extract::{FromRef, FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Json, Redirect, Response};
use serde::{Deserialize, Serialize};

use super::auth::AuthUser;
use super::{form_errors_response, internal_error};
use crate::admin::{AdminError, AdminListing, ListParams, ModelAdmin, listing};
use crate::forms::{FormErrors, MSG_INVALID_CHOICE, MSG_REQUIRED};
use crate::models::User;
use crate::services::group::{self as group_svc, GroupError, MAX_SLUG_LEN, MAX_TITLE_LEN};
use crate::services::post::{self as post_svc, PostError};
use crate::state::AppState;

pub const MSG_NOT_EDITABLE: &str = "This field cannot be edited from the list.";
pub const MSG_SLUG_INVALID: &str =
    "Enter a valid \u{201c}slug\u{201d} consisting of letters, numbers, underscores or hyphens.";
pub const MSG_SLUG_TAKEN: &str = "Group with this Slug already exists.";

/// A signed-in user with the staff flag.
pub struct StaffUser(pub User);

impl<S> FromRequestParts<S> for StaffUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        if !auth.user.is_staff {
            tracing::info!(username = %auth.user.username, path = %parts.uri.path(), "admin access denied");
            return Err(StatusCode::FORBIDDEN.into_response());
        }
        Ok(Self(auth.user))
    }
}

pub(crate) fn admin_error_to_status(err: &AdminError) -> StatusCode {
    match err {
        AdminError::NotRegistered(_) => StatusCode::NOT_FOUND,
        AdminError::InvalidFilter { .. } => StatusCode::BAD_REQUEST,
        AdminError::Misconfigured(_) | AdminError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn admin_error_response(err: AdminError) -> Response {
    let status = admin_error_to_status(&err);
    if status.is_server_error() {
        return internal_error(&err, "admin");
    }
    (status, err.to_string()).into_response()
}

fn registration<'a>(state: &'a AppState, entity: &str) -> Result<&'a ModelAdmin, AdminError> {
    state
        .admin
        .get(entity)
        .ok_or_else(|| AdminError::NotRegistered(entity.to_owned()))
}

#[must_use]
pub fn changelist_url(entity: &str) -> String {
    format!("/admin/{entity}/")
}

// =============================================================================
// INDEX / CHANGELIST
// =============================================================================

#[derive(Debug, Serialize)]
pub struct AdminEntry {
    pub name: &'static str,
    pub verbose_name_plural: &'static str,
    pub url: String,
}

/// `GET /admin/`: registered entities.
pub async fn index(State(state): State<AppState>, StaffUser(_): StaffUser) -> Json<Vec<AdminEntry>> {
    let entries = state
        .admin
        .iter()
        .map(|admin| AdminEntry {
            name: admin.name(),
            verbose_name_plural: admin.entity.verbose_name_plural,
            url: changelist_url(admin.name()),
        })
        .collect();
    Json(entries)
}

/// `GET /admin/{entity}/`: searchable, filterable listing.
pub async fn changelist(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    Path(entity): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<AdminListing>, Response> {
    let admin = registration(&state, &entity).map_err(admin_error_response)?;
    listing::list(&state.pool, &state.admin, admin, &params)
        .await
        .map(Json)
        .map_err(admin_error_response)
}

// =============================================================================
// INLINE EDIT
// =============================================================================

/// Parse a group choice: empty means "no group".
pub(crate) fn parse_group_choice(raw: &str) -> Result<Option<i64>, FormErrors> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| FormErrors::single("group", MSG_INVALID_CHOICE))
}

/// Reject submitted fields the registration does not list as editable.
pub(crate) fn check_editable(admin: &ModelAdmin, form: &HashMap<String, String>) -> FormErrors {
    let mut errors = FormErrors::new();
    for key in form.keys() {
        if !admin.list_editable.contains(&key.as_str()) {
            // FormErrors keys are static; unknown names are reported under __all__.
            errors.add("__all__", format!("{key}: {MSG_NOT_EDITABLE}"));
        }
    }
    errors
}

/// `POST /admin/{entity}/{pk}/`: save `list_editable` columns of one row.
pub async fn inline_edit(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path((entity, pk)): Path<(String, i64)>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let admin = match registration(&state, &entity) {
        Ok(a) => a,
        Err(e) => return admin_error_response(e),
    };
    let errors = check_editable(admin, &form);
    if !errors.is_empty() {
        return form_errors_response(errors);
    }

    // `group` on posts is the only inline-editable column.
    if let Some(raw) = form.get("group") {
        let group_id = match parse_group_choice(raw) {
            Ok(g) => g,
            Err(errors) => return form_errors_response(errors),
        };
        if let Some(id) = group_id {
            match group_svc::exists(&state.pool, id).await {
                Ok(true) => {}
                Ok(false) => return form_errors_response(FormErrors::single("group", MSG_INVALID_CHOICE)),
                Err(e) => return internal_error(&e, "group lookup"),
            }
        }
        match post_svc::set_group(&state.pool, pk, group_id).await {
            Ok(()) => {}
            Err(PostError::NotFound(_)) => return StatusCode::NOT_FOUND.into_response(),
            Err(e) => return internal_error(&e, "admin inline edit"),
        }
        tracing::info!(post_id = pk, group_id = ?group_id, staff = %staff.username, "admin changed post group");
    }

    Redirect::to(&changelist_url(admin.name())).into_response()
}

// =============================================================================
// ADD GROUP
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct GroupForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    description: String,
}

pub(crate) fn validate_group(form: &GroupForm) -> FormErrors {
    let mut errors = FormErrors::new();
    let title = form.title.trim();
    if title.is_empty() {
        errors.add("title", MSG_REQUIRED);
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.add(
            "title",
            format!("Ensure this value has at most {MAX_TITLE_LEN} characters."),
        );
    }
    let slug = form.slug.trim();
    if slug.is_empty() {
        errors.add("slug", MSG_REQUIRED);
    } else if slug.len() > MAX_SLUG_LEN {
        errors.add("slug", format!("Ensure this value has at most {MAX_SLUG_LEN} characters."));
    } else if !group_svc::is_valid_slug(slug) {
        errors.add("slug", MSG_SLUG_INVALID);
    }
    if form.description.trim().is_empty() {
        errors.add("description", MSG_REQUIRED);
    }
    errors
}

/// `POST /admin/group/add/`: create a group.
pub async fn add_group(State(state): State<AppState>, StaffUser(staff): StaffUser, Form(form): Form<GroupForm>) -> Response {
    let errors = validate_group(&form);
    if !errors.is_empty() {
        return form_errors_response(errors);
    }
    match group_svc::create_group(&state.pool, form.title.trim(), form.slug.trim(), form.description.trim()).await {
        Ok(group) => {
            tracing::info!(group_id = group.id, staff = %staff.username, "admin added group");
            Redirect::to(&changelist_url("group")).into_response()
        }
        Err(GroupError::SlugTaken(_)) => form_errors_response(FormErrors::single("slug", MSG_SLUG_TAKEN)),
        Err(e) => internal_error(&e, "admin add group"),
    }
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
