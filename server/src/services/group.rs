//! Group service: lookup and administrative creation.

use sqlx::PgPool;

use crate::models::Group;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_SLUG_LEN: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("group not found: {0}")]
    NotFound(String),
    #[error("slug already in use: {0}")]
    SlugTaken(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Slugs are 1..=50 chars of ASCII letters, digits, `-` and `_`.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

/// Fetch a group by slug.
///
/// # Errors
///
/// Returns [`GroupError::NotFound`] if no group has this slug.
pub async fn get_by_slug(pool: &PgPool, slug: &str) -> Result<Group, GroupError> {
    let sql = format!("SELECT {} FROM groups WHERE slug = $1", Group::COLUMNS);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| GroupError::NotFound(slug.to_owned()))?;
    Ok(Group::from_row(&row))
}

/// Whether a group with this id exists.
pub async fn exists(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM groups WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// All groups ordered by title, used for form choices.
pub async fn list_groups(pool: &PgPool) -> Result<Vec<Group>, sqlx::Error> {
    let sql = format!("SELECT {} FROM groups ORDER BY title, id", Group::COLUMNS);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows.iter().map(Group::from_row).collect())
}

/// Insert a group. Input must already be validated.
///
/// # Errors
///
/// Returns [`GroupError::SlugTaken`] on a unique violation.
pub async fn create_group(pool: &PgPool, title: &str, slug: &str, description: &str) -> Result<Group, GroupError> {
    let sql = format!(
        "INSERT INTO groups (title, slug, description) VALUES ($1, $2, $3) RETURNING {}",
        Group::COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(title)
        .bind(slug)
        .bind(description)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => GroupError::SlugTaken(slug.to_owned()),
            other => GroupError::Database(other),
        })?;
    let group = Group::from_row(&row);
    tracing::info!(group_id = group.id, slug = %group.slug, "group created");
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_accepts_ascii_words() {
        assert!(is_valid_slug("test_slug"));
        assert!(is_valid_slug("cats-and-dogs-2"));
    }

    #[test]
    fn slug_rejects_spaces_unicode_and_length() {
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("two words"));
        assert!(!is_valid_slug("котики"));
        assert!(!is_valid_slug(&"s".repeat(MAX_SLUG_LEN + 1)));
        assert!(is_valid_slug(&"s".repeat(MAX_SLUG_LEN)));
    }
}
