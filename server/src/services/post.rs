//! Post service: listings, lookups, and saves driven by `PostForm`.
//!
//! DESIGN
//! ======
//! Saves take an already validated `CleanedPost`. A replacement image is
//! written to media storage before the row is touched; if the database write
//! fails the new file is removed again, and a replaced or cleared image is
//! only deleted after the row no longer references it.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::forms::{CleanedPost, ImageChange};
use crate::media::{MediaError, MediaStorage};
use crate::models::Post;
use crate::pagination::{Page, PageInfo};

/// Directory under the media root that post images are stored in.
pub const UPLOAD_TO: &str = "posts/";

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("post not found: {0}")]
    NotFound(i64),
    #[error("media error: {0}")]
    Media(#[from] MediaError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(Uuid),
}

impl PostScope {
    fn where_clause(self) -> &'static str {
        match self {
            Self::All => "",
            Self::Group(_) => " WHERE p.group_id = $1",
            Self::Author(_) => " WHERE p.author_id = $1",
        }
    }
}

fn bind_scope<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    scope: PostScope,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    match scope {
        PostScope::All => query,
        PostScope::Group(id) => query.bind(id),
        PostScope::Author(id) => query.bind(id),
    }
}

/// Count posts in a scope.
pub async fn count_posts(pool: &PgPool, scope: PostScope) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) AS n FROM posts p{}", scope.where_clause());
    let row = bind_scope(sqlx::query(&sql), scope).fetch_one(pool).await?;
    Ok(row.get("n"))
}

/// One page of posts, newest first.
///
/// # Errors
///
/// Returns a database error if either query fails.
pub async fn list_posts(pool: &PgPool, scope: PostScope, page: Option<&str>, per_page: i64) -> Result<Page<Post>, PostError> {
    let count = count_posts(pool, scope).await?;
    let info = PageInfo::resolve(page, count, per_page);

    let placeholder = if scope == PostScope::All { 1 } else { 2 };
    let sql = format!(
        "{}{} ORDER BY p.pub_date DESC, p.id DESC LIMIT ${} OFFSET ${}",
        Post::SELECT,
        scope.where_clause(),
        placeholder,
        placeholder + 1
    );
    let rows = bind_scope(sqlx::query(&sql), scope)
        .bind(info.per_page)
        .bind(info.offset())
        .fetch_all(pool)
        .await?;

    Ok(Page { items: rows.iter().map(Post::from_row).collect(), page: info })
}

/// Fetch a single post.
///
/// # Errors
///
/// Returns [`PostError::NotFound`] if the id is unknown.
pub async fn get_post(pool: &PgPool, post_id: i64) -> Result<Post, PostError> {
    let sql = format!("{} WHERE p.id = $1", Post::SELECT);
    let row = sqlx::query(&sql)
        .bind(post_id)
        .fetch_optional(pool)
        .await?
        .ok_or(PostError::NotFound(post_id))?;
    Ok(Post::from_row(&row))
}

async fn store_image(media: &MediaStorage, change: &ImageChange) -> Result<Option<String>, PostError> {
    match change {
        ImageChange::Replace(upload) => Ok(Some(media.save(UPLOAD_TO, &upload.filename, &upload.bytes).await?)),
        ImageChange::Keep | ImageChange::Clear => Ok(None),
    }
}

async fn discard(media: &MediaStorage, path: Option<&str>) {
    if let Some(path) = path {
        if let Err(e) = media.delete(path).await {
            tracing::warn!(error = %e, %path, "failed to remove media file");
        }
    }
}

/// Insert a new post authored by `author_id`.
///
/// # Errors
///
/// Returns a media or database error; no file is left behind on failure.
pub async fn create_post(
    pool: &PgPool,
    media: &MediaStorage,
    author_id: Uuid,
    cleaned: CleanedPost,
) -> Result<Post, PostError> {
    let stored = store_image(media, &cleaned.image).await?;

    let inserted = sqlx::query(
        "INSERT INTO posts (text, author_id, group_id, image) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&cleaned.text)
    .bind(author_id)
    .bind(cleaned.group_id)
    .bind(stored.as_deref())
    .fetch_one(pool)
    .await;

    let post_id: i64 = match inserted {
        Ok(row) => row.get("id"),
        Err(e) => {
            discard(media, stored.as_deref()).await;
            return Err(e.into());
        }
    };

    tracing::info!(post_id, %author_id, group_id = ?cleaned.group_id, image = ?stored, "post created");
    get_post(pool, post_id).await
}

/// Apply an edit to an existing post. The author never changes.
///
/// # Errors
///
/// Returns [`PostError::NotFound`] if the post disappeared, or a media or
/// database error.
pub async fn update_post(
    pool: &PgPool,
    media: &MediaStorage,
    existing: &Post,
    cleaned: CleanedPost,
) -> Result<Post, PostError> {
    let stored = store_image(media, &cleaned.image).await?;
    let image = match &cleaned.image {
        ImageChange::Keep => existing.image.clone(),
        ImageChange::Clear => None,
        ImageChange::Replace(_) => stored.clone(),
    };

    let updated = sqlx::query("UPDATE posts SET text = $1, group_id = $2, image = $3 WHERE id = $4")
        .bind(&cleaned.text)
        .bind(cleaned.group_id)
        .bind(image.as_deref())
        .bind(existing.id)
        .execute(pool)
        .await;

    match updated {
        Ok(result) if result.rows_affected() == 0 => {
            discard(media, stored.as_deref()).await;
            return Err(PostError::NotFound(existing.id));
        }
        Ok(_) => {}
        Err(e) => {
            discard(media, stored.as_deref()).await;
            return Err(e.into());
        }
    }

    if existing.image != image {
        discard(media, existing.image.as_deref()).await;
    }

    tracing::info!(post_id = existing.id, group_id = ?cleaned.group_id, image = ?image, "post updated");
    get_post(pool, existing.id).await
}

/// Set or clear a post's group (admin inline edit).
///
/// # Errors
///
/// Returns [`PostError::NotFound`] if no row was updated.
pub async fn set_group(pool: &PgPool, post_id: i64, group_id: Option<i64>) -> Result<(), PostError> {
    let result = sqlx::query("UPDATE posts SET group_id = $1 WHERE id = $2")
        .bind(group_id)
        .bind(post_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PostError::NotFound(post_id));
    }
    Ok(())
}

#[cfg(test)]
#[path = "post_test.rs"]
mod tests;
