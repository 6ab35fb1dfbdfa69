//! Back-office registrations.
//!
//! ARCHITECTURE
//! ============
//! An `Entity` describes what the admin can show for one table: the columns
//! it exposes (as SQL expressions) and which of them support inline edits.
//! A `ModelAdmin` is the declarative registration on top of an entity: which
//! columns are listed, editable, searchable and filterable, and the
//! placeholder for empty cells. `AdminSite` holds the registrations and
//! validates them once at startup so a misdeclared field fails fast instead
//! of surfacing as a broken listing.

pub mod listing;

use serde::Serialize;

pub use listing::{AdminListing, AdminRow, DateFilter, ListParams};

/// Placeholder used when a registration does not set its own.
pub const DEFAULT_EMPTY_VALUE_DISPLAY: &str = "-";
/// Rows per admin listing page.
pub const DEFAULT_LIST_PER_PAGE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Text,
    DateTime,
    Reference,
}

/// One column an entity can expose in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// SQL expression rendering the cell as text.
    pub display: &'static str,
    /// SQL expression used for search and filter predicates.
    pub raw: &'static str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Entity {
    /// URL segment, e.g. `post`.
    pub name: &'static str,
    pub verbose_name_plural: &'static str,
    /// `FROM` clause including joins.
    pub from: &'static str,
    pub pk: &'static str,
    pub order_by: &'static str,
    pub columns: &'static [Column],
    /// Columns with an inline-edit implementation.
    pub inline_editable: &'static [&'static str],
}

impl Entity {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

const fn col(name: &'static str, kind: ColumnKind, display: &'static str, raw: &'static str) -> Column {
    Column { name, kind, display, raw }
}

pub static POST: Entity = Entity {
    name: "post",
    verbose_name_plural: "Posts",
    from: "posts p JOIN users u ON u.id = p.author_id LEFT JOIN groups g ON g.id = p.group_id",
    pk: "p.id",
    order_by: "p.pub_date DESC, p.id DESC",
    columns: &[
        col("pk", ColumnKind::Integer, "p.id::text", "p.id"),
        col("text", ColumnKind::Text, "p.text", "p.text"),
        col(
            "pub_date",
            ColumnKind::DateTime,
            "to_char(p.pub_date AT TIME ZONE 'UTC', 'YYYY-MM-DD HH24:MI')",
            "p.pub_date",
        ),
        col("author", ColumnKind::Reference, "u.username", "u.username"),
        col("group", ColumnKind::Reference, "g.title", "g.title"),
        col("image", ColumnKind::Text, "p.image", "p.image"),
    ],
    inline_editable: &["group"],
};

pub static GROUP: Entity = Entity {
    name: "group",
    verbose_name_plural: "Groups",
    from: "groups g",
    pk: "g.id",
    order_by: "g.id DESC",
    columns: &[
        col("pk", ColumnKind::Integer, "g.id::text", "g.id"),
        col("title", ColumnKind::Text, "g.title", "g.title"),
        col("slug", ColumnKind::Text, "g.slug", "g.slug"),
        col("description", ColumnKind::Text, "g.description", "g.description"),
    ],
    inline_editable: &[],
};

pub static COMMENT: Entity = Entity {
    name: "comment",
    verbose_name_plural: "Comments",
    from: "comments c JOIN posts p ON p.id = c.post_id JOIN users u ON u.id = c.author_id",
    pk: "c.id",
    order_by: "c.id DESC",
    columns: &[
        col("pk", ColumnKind::Integer, "c.id::text", "c.id"),
        col("post", ColumnKind::Reference, "left(p.text, 15)", "p.text"),
        col("name", ColumnKind::Text, "c.name", "c.name"),
        col("text", ColumnKind::Text, "c.text", "c.text"),
        col("author", ColumnKind::Reference, "u.username", "u.username"),
        col(
            "created",
            ColumnKind::DateTime,
            "to_char(c.created AT TIME ZONE 'UTC', 'YYYY-MM-DD HH24:MI')",
            "c.created",
        ),
    ],
    inline_editable: &[],
};

/// Declarative registration of one entity in the admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelAdmin {
    pub entity: &'static Entity,
    pub list_display: &'static [&'static str],
    pub list_editable: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub empty_value_display: Option<&'static str>,
    pub list_per_page: i64,
}

impl ModelAdmin {
    /// Registration listing only the primary key.
    #[must_use]
    pub const fn new(entity: &'static Entity) -> Self {
        Self {
            entity,
            list_display: &["pk"],
            list_editable: &[],
            search_fields: &[],
            list_filter: &[],
            empty_value_display: None,
            list_per_page: DEFAULT_LIST_PER_PAGE,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.entity.name
    }

    /// All declaration problems, formatted as `entity.option: message`.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let entity = self.entity;
        let mut out = Vec::new();
        let mut report = |option: &str, message: String| out.push(format!("{}.{option}: {message}", entity.name));

        if self.list_display.is_empty() {
            report("list_display", "must list at least one column".into());
        }
        for field in self.list_display {
            if entity.column(field).is_none() {
                report("list_display", format!("unknown column `{field}`"));
            }
        }
        for field in self.list_editable {
            if !self.list_display.contains(field) {
                report("list_editable", format!("`{field}` is not in list_display"));
            } else if self.list_display.first() == Some(field) {
                report("list_editable", format!("`{field}` is the first list_display column"));
            }
            if !entity.inline_editable.contains(field) {
                report("list_editable", format!("`{field}` cannot be edited inline"));
            }
        }
        for field in self.search_fields {
            match entity.column(field) {
                None => report("search_fields", format!("unknown column `{field}`")),
                Some(c) if matches!(c.kind, ColumnKind::Integer | ColumnKind::DateTime) => {
                    report("search_fields", format!("`{field}` is not a text column"));
                }
                Some(_) => {}
            }
        }
        for field in self.list_filter {
            match entity.column(field) {
                None => report("list_filter", format!("unknown column `{field}`")),
                Some(c) if c.kind != ColumnKind::DateTime => {
                    report("list_filter", format!("`{field}` is not a date column"));
                }
                Some(_) => {}
            }
        }
        if self.list_per_page <= 0 {
            report("list_per_page", "must be positive".into());
        }
        out
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("admin misconfigured: {}", .0.join("; "))]
    Misconfigured(Vec<String>),
    #[error("entity not registered: {0}")]
    NotRegistered(String),
    #[error("unknown filter value {value:?} for {field}")]
    InvalidFilter { field: String, value: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Registered admins plus site-wide defaults.
#[derive(Debug, Clone)]
pub struct AdminSite {
    registry: Vec<ModelAdmin>,
    pub empty_value_display: &'static str,
}

impl Default for AdminSite {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminSite {
    #[must_use]
    pub fn new() -> Self {
        Self { registry: Vec::new(), empty_value_display: DEFAULT_EMPTY_VALUE_DISPLAY }
    }

    pub fn register(&mut self, admin: ModelAdmin) {
        self.registry.push(admin);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModelAdmin> {
        self.registry.iter().find(|a| a.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelAdmin> {
        self.registry.iter()
    }

    /// Placeholder for NULL cells of a registration.
    #[must_use]
    pub fn empty_value_for(&self, admin: &ModelAdmin) -> &'static str {
        admin.empty_value_display.unwrap_or(self.empty_value_display)
    }

    /// Validate every registration.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Misconfigured`] listing every problem found.
    pub fn check(&self) -> Result<(), AdminError> {
        let mut problems = Vec::new();
        for (idx, admin) in self.registry.iter().enumerate() {
            if self.registry[..idx].iter().any(|a| a.name() == admin.name()) {
                problems.push(format!("{}: registered more than once", admin.name()));
            }
            problems.extend(admin.problems());
        }
        if problems.is_empty() { Ok(()) } else { Err(AdminError::Misconfigured(problems)) }
    }
}

/// The site's registrations for posts, groups and comments.
#[must_use]
pub fn default_site() -> AdminSite {
    let mut site = AdminSite::new();
    site.register(ModelAdmin {
        list_display: &["pk", "text", "pub_date", "author", "group"],
        list_editable: &["group"],
        search_fields: &["text"],
        list_filter: &["pub_date"],
        empty_value_display: Some("-empty-"),
        ..ModelAdmin::new(&POST)
    });
    site.register(ModelAdmin { list_display: &["pk", "title", "slug"], ..ModelAdmin::new(&GROUP) });
    site.register(ModelAdmin { list_display: &["pk", "post", "name", "text", "author"], ..ModelAdmin::new(&COMMENT) });
    site
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
