//! Comment service.

use sqlx::{PgPool, Row};

use crate::models::{Comment, User};

/// Comments under a post, oldest first.
pub async fn list_for_post(pool: &PgPool, post_id: i64) -> Result<Vec<Comment>, sqlx::Error> {
    let sql = format!("{} WHERE c.post_id = $1 ORDER BY c.created ASC, c.id ASC", Comment::SELECT);
    let rows = sqlx::query(&sql).bind(post_id).fetch_all(pool).await?;
    Ok(rows.iter().map(Comment::from_row).collect())
}

/// Attach a comment by `author` to a post. The display name is captured
/// from the author's username at creation time.
pub async fn create_comment(pool: &PgPool, post_id: i64, author: &User, text: &str) -> Result<Comment, sqlx::Error> {
    let row = sqlx::query(
        "INSERT INTO comments (post_id, author_id, name, text) VALUES ($1, $2, $3, $4)
         RETURNING id, post_id, author_id, name, text, created",
    )
    .bind(post_id)
    .bind(author.id)
    .bind(&author.username)
    .bind(text)
    .fetch_one(pool)
    .await?;

    let comment = Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        author: author.username.clone(),
        name: row.get("name"),
        text: row.get("text"),
        created: row.get("created"),
    };
    tracing::info!(comment_id = comment.id, post_id, author = %author.username, "comment created");
    Ok(comment)
}
