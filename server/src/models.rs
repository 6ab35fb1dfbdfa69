//! Row types shared by services and routes.
//!
//! DESIGN
//! ======
//! Each struct mirrors one table (or a joined projection of it) and is what
//! handlers serialize back to clients. Column lists live next to the mapping
//! function so queries and decoders cannot drift apart.

use serde::Serialize;
use sqlx::Row;
use sqlx::postgres::PgRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Public URL prefix under which the media root is served.
pub const MEDIA_URL: &str = "/media/";

/// Account row, minus the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub is_staff: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    pub(crate) const COLUMNS: &'static str = "id, title, slug, description";

    pub(crate) fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            title: row.get("title"),
            slug: row.get("slug"),
            description: row.get("description"),
        }
    }
}

/// Compact group reference embedded in post payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// Post joined with its author's username and its group, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub pub_date: OffsetDateTime,
    pub author_id: Uuid,
    pub author: String,
    pub group: Option<GroupRef>,
    /// Stored path relative to the media root, e.g. `posts/small.gif`.
    pub image: Option<String>,
    pub image_url: Option<String>,
}

impl Post {
    pub(crate) const SELECT: &'static str = "SELECT p.id, p.text, p.pub_date, p.author_id, u.username AS author,
                p.group_id, g.title AS group_title, g.slug AS group_slug, p.image
         FROM posts p
         JOIN users u ON u.id = p.author_id
         LEFT JOIN groups g ON g.id = p.group_id";

    pub(crate) fn from_row(row: &PgRow) -> Self {
        let group_id: Option<i64> = row.get("group_id");
        let group_title: Option<String> = row.get("group_title");
        let group_slug: Option<String> = row.get("group_slug");
        let group = match (group_id, group_title, group_slug) {
            (Some(id), Some(title), Some(slug)) => Some(GroupRef { id, title, slug }),
            _ => None,
        };
        let image: Option<String> = row.get("image");
        let image_url = image.as_deref().map(media_url);

        Self {
            id: row.get("id"),
            text: row.get("text"),
            pub_date: row.get("pub_date"),
            author_id: row.get("author_id"),
            author: row.get("author"),
            group,
            image,
            image_url,
        }
    }

    #[must_use]
    pub fn group_id(&self) -> Option<i64> {
        self.group.as_ref().map(|g| g.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Uuid,
    pub author: String,
    pub name: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}

impl Comment {
    pub(crate) const SELECT: &'static str = "SELECT c.id, c.post_id, c.author_id, u.username AS author, c.name, c.text, c.created
         FROM comments c
         JOIN users u ON u.id = c.author_id";

    pub(crate) fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            post_id: row.get("post_id"),
            author_id: row.get("author_id"),
            author: row.get("author"),
            name: row.get("name"),
            text: row.get("text"),
            created: row.get("created"),
        }
    }
}

/// Public URL for a stored media path.
#[must_use]
pub fn media_url(path: &str) -> String {
    format!("{MEDIA_URL}{}", path.trim_start_matches('/'))
}
