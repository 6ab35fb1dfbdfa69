//! Post routes: listings, detail, create/edit via `PostForm`, comments.

use axum::Form;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use serde::{Deserialize, Serialize};

use super::auth::AuthUser;
use super::{form_errors_response, internal_error};
use crate::forms::{CommentForm, CommentFormData, FieldSpec, FormError, PostForm, PostFormData};
use crate::media::UploadedFile;
use crate::models::{Comment, Group, Post};
use crate::pagination::{POSTS_PER_PAGE, Page};
use crate::services::group::{self as group_svc, GroupError};
use crate::services::post::{self as post_svc, PostError, PostScope};
use crate::services::{auth as auth_svc, comment as comment_svc};
use crate::state::AppState;

/// Placeholder label for the empty group choice.
pub const EMPTY_CHOICE_LABEL: &str = "---------";

pub(crate) fn post_error_to_status(err: &PostError) -> StatusCode {
    match err {
        PostError::NotFound(_) => StatusCode::NOT_FOUND,
        PostError::Media(_) | PostError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn post_error_response(err: PostError) -> Response {
    let status = post_error_to_status(&err);
    if status.is_server_error() {
        return internal_error(&err, "post");
    }
    (status, err.to_string()).into_response()
}

#[must_use]
pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

#[must_use]
pub fn detail_url(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

// =============================================================================
// LISTINGS
// =============================================================================

/// `GET /`: all posts, newest first.
pub async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Result<Json<Page<Post>>, Response> {
    post_svc::list_posts(&state.pool, PostScope::All, query.page.as_deref(), POSTS_PER_PAGE)
        .await
        .map(Json)
        .map_err(post_error_response)
}

#[derive(Serialize)]
pub struct GroupPage {
    pub group: Group,
    pub posts: Page<Post>,
}

/// `GET /group/{slug}/`: posts of one group.
pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<GroupPage>, Response> {
    let group = match group_svc::get_by_slug(&state.pool, &slug).await {
        Ok(g) => g,
        Err(GroupError::NotFound(_)) => return Err(StatusCode::NOT_FOUND.into_response()),
        Err(e) => return Err(internal_error(&e, "group lookup")),
    };
    let posts = post_svc::list_posts(&state.pool, PostScope::Group(group.id), query.page.as_deref(), POSTS_PER_PAGE)
        .await
        .map_err(post_error_response)?;
    Ok(Json(GroupPage { group, posts }))
}

#[derive(Serialize)]
pub struct ProfilePage {
    pub author: String,
    pub post_count: i64,
    pub posts: Page<Post>,
}

/// `GET /profile/{username}/`: posts of one author.
pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProfilePage>, Response> {
    let author = auth_svc::find_by_username(&state.pool, &username)
        .await
        .map_err(|e| internal_error(&e, "profile lookup"))?
        .ok_or_else(|| StatusCode::NOT_FOUND.into_response())?;
    let posts = post_svc::list_posts(&state.pool, PostScope::Author(author.id), query.page.as_deref(), POSTS_PER_PAGE)
        .await
        .map_err(post_error_response)?;
    Ok(Json(ProfilePage { author: author.username, post_count: posts.page.count, posts }))
}

#[derive(Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub author_post_count: i64,
    pub comments: Vec<Comment>,
    pub comment_form: &'static [FieldSpec],
}

/// `GET /posts/{post_id}/`: one post with its comments.
pub async fn post_detail(State(state): State<AppState>, Path(post_id): Path<i64>) -> Result<Json<PostDetail>, Response> {
    let post = post_svc::get_post(&state.pool, post_id)
        .await
        .map_err(post_error_response)?;
    let author_post_count = post_svc::count_posts(&state.pool, PostScope::Author(post.author_id))
        .await
        .map_err(|e| internal_error(&e, "post count"))?;
    let comments = comment_svc::list_for_post(&state.pool, post_id)
        .await
        .map_err(|e| internal_error(&e, "comment list"))?;
    Ok(Json(PostDetail { post, author_post_count, comments, comment_form: CommentForm::fields() }))
}

// =============================================================================
// CREATE / EDIT
// =============================================================================

#[derive(Debug, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct PostFormSchema {
    pub is_edit: bool,
    pub fields: &'static [FieldSpec],
    pub group_choices: Vec<Choice>,
    pub initial: serde_json::Value,
}

pub(crate) fn group_choices(groups: &[Group]) -> Vec<Choice> {
    std::iter::once(Choice { value: String::new(), label: EMPTY_CHOICE_LABEL.to_owned() })
        .chain(groups.iter().map(|g| Choice { value: g.id.to_string(), label: g.title.clone() }))
        .collect()
}

async fn form_schema(state: &AppState, existing: Option<&Post>) -> Result<PostFormSchema, Response> {
    let groups = group_svc::list_groups(&state.pool)
        .await
        .map_err(|e| internal_error(&e, "group list"))?;
    let initial = existing.map_or(serde_json::Value::Null, |post| {
        serde_json::json!({
            "text": post.text,
            "group": post.group_id(),
            "image": post.image,
        })
    });
    Ok(PostFormSchema {
        is_edit: existing.is_some(),
        fields: PostForm::fields(),
        group_choices: group_choices(&groups),
        initial,
    })
}

/// Collect `PostForm` fields from a multipart body; unknown parts are skipped.
pub(crate) async fn read_post_form(mut multipart: Multipart) -> Result<PostFormData, MultipartError> {
    let mut data = PostFormData::default();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "text" => data.text = Some(field.text().await?),
            "group" => data.group = Some(field.text().await?),
            "image-clear" => {
                let value = field.text().await?;
                data.image_clear = crate::config::parse_bool(&value).unwrap_or(!value.is_empty());
            }
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?;
                // An untouched file input submits an empty part with no name.
                if !(filename.is_empty() && bytes.is_empty()) {
                    data.image = Some(UploadedFile { filename, content_type, bytes: bytes.to_vec() });
                }
            }
            _ => {}
        }
    }
    Ok(data)
}

async fn bind_post_form(state: &AppState, multipart: Multipart) -> Result<crate::forms::CleanedPost, Response> {
    let data = read_post_form(multipart)
        .await
        .map_err(|e| (e.status(), e.body_text()).into_response())?;
    PostForm::validate(&state.pool, data).await.map_err(|e| match e {
        FormError::Invalid(errors) => form_errors_response(errors),
        FormError::Database(e) => internal_error(&e, "post form validation"),
    })
}

/// `GET /create/`: empty post form.
pub async fn create_form(State(state): State<AppState>, _auth: AuthUser) -> Result<Json<PostFormSchema>, Response> {
    form_schema(&state, None).await.map(Json)
}

/// `POST /create/`: validate, save, redirect to the author's profile.
pub async fn create_post(State(state): State<AppState>, auth: AuthUser, multipart: Multipart) -> Response {
    let cleaned = match bind_post_form(&state, multipart).await {
        Ok(c) => c,
        Err(response) => return response,
    };
    match post_svc::create_post(&state.pool, &state.media, auth.user.id, cleaned).await {
        Ok(_) => Redirect::to(&profile_url(&auth.user.username)).into_response(),
        Err(e) => post_error_response(e),
    }
}

/// `GET /posts/{post_id}/edit/`: form prefilled from the post; author only.
pub async fn edit_form(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Json<PostFormSchema>, Response> {
    let post = post_svc::get_post(&state.pool, post_id)
        .await
        .map_err(post_error_response)?;
    if post.author_id != auth.user.id {
        return Err(Redirect::to(&detail_url(post_id)).into_response());
    }
    form_schema(&state, Some(&post)).await.map(Json)
}

/// `POST /posts/{post_id}/edit/`: apply an edit, redirect to the post.
/// Non-authors are sent to the post without any change.
pub async fn edit_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let post = match post_svc::get_post(&state.pool, post_id).await {
        Ok(p) => p,
        Err(e) => return post_error_response(e),
    };
    if post.author_id != auth.user.id {
        tracing::info!(post_id, user = %auth.user.username, "edit by non-author redirected");
        return Redirect::to(&detail_url(post_id)).into_response();
    }

    let cleaned = match bind_post_form(&state, multipart).await {
        Ok(c) => c,
        Err(response) => return response,
    };
    match post_svc::update_post(&state.pool, &state.media, &post, cleaned).await {
        Ok(_) => Redirect::to(&detail_url(post_id)).into_response(),
        Err(e) => post_error_response(e),
    }
}

// =============================================================================
// COMMENTS
// =============================================================================

/// `POST /posts/{post_id}/comment/`: attach a comment, redirect to the post.
pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<i64>,
    Form(data): Form<CommentFormData>,
) -> Response {
    if let Err(e) = post_svc::get_post(&state.pool, post_id).await {
        return post_error_response(e);
    }
    let text = match CommentForm::clean(data) {
        Ok(t) => t,
        Err(errors) => return form_errors_response(errors),
    };
    match comment_svc::create_comment(&state.pool, post_id, &auth.user, &text).await {
        Ok(_) => Redirect::to(&detail_url(post_id)).into_response(),
        Err(e) => internal_error(&e, "comment create"),
    }
}

#[cfg(test)]
#[path = "posts_test.rs"]
mod tests;
