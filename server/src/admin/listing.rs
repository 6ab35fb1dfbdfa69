//! Admin changelist queries: search, date filters and paging.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::{AdminError, AdminSite, ModelAdmin};
use crate::pagination::PageInfo;

/// Query-string parameters of a changelist request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub page: Option<String>,
    #[serde(flatten)]
    pub filters: HashMap<String, String>,
}

/// Date ranges offered for `list_filter` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFilter {
    Today,
    Past7Days,
    ThisMonth,
    ThisYear,
}

impl DateFilter {
    pub const ALL: [Self; 4] = [Self::Today, Self::Past7Days, Self::ThisMonth, Self::ThisYear];

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "today" => Some(Self::Today),
            "past_7_days" => Some(Self::Past7Days),
            "this_month" => Some(Self::ThisMonth),
            "this_year" => Some(Self::ThisYear),
            _ => None,
        }
    }

    /// Half-open `[lower, upper)` bounds as SQL expressions.
    #[must_use]
    pub fn bounds(self) -> (&'static str, &'static str) {
        match self {
            Self::Today => ("date_trunc('day', now())", "date_trunc('day', now()) + interval '1 day'"),
            Self::Past7Days => (
                "date_trunc('day', now()) - interval '7 days'",
                "date_trunc('day', now()) + interval '1 day'",
            ),
            Self::ThisMonth => ("date_trunc('month', now())", "date_trunc('month', now()) + interval '1 month'"),
            Self::ThisYear => ("date_trunc('year', now())", "date_trunc('year', now()) + interval '1 year'"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterSpec {
    pub field: &'static str,
    pub choices: [DateFilter; 4],
    pub selected: Option<DateFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminRow {
    pub pk: i64,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminListing {
    pub entity: &'static str,
    pub verbose_name_plural: &'static str,
    pub columns: &'static [&'static str],
    pub editable: &'static [&'static str],
    pub searchable: bool,
    pub query: Option<String>,
    pub filters: Vec<FilterSpec>,
    pub rows: Vec<AdminRow>,
    pub page: PageInfo,
}

/// Escape `LIKE` wildcards so a search term matches literally.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Resolve the selected date filters of a request against the admin's `list_filter`.
///
/// # Errors
///
/// Returns [`AdminError::InvalidFilter`] for an unknown range name.
pub fn selected_filters(admin: &ModelAdmin, params: &ListParams) -> Result<Vec<FilterSpec>, AdminError> {
    admin
        .list_filter
        .iter()
        .copied()
        .map(|field| -> Result<FilterSpec, AdminError> {
            let selected = match params.filters.get(field).map(String::as_str) {
                None | Some("" | "any") => None,
                Some(raw) => Some(DateFilter::parse(raw).ok_or_else(|| AdminError::InvalidFilter {
                    field: field.to_owned(),
                    value: raw.to_owned(),
                })?),
            };
            Ok(FilterSpec { field, choices: DateFilter::ALL, selected })
        })
        .collect()
}

fn push_joiner(builder: &mut QueryBuilder<'_, Postgres>, first: &mut bool) {
    builder.push(if *first { " WHERE " } else { " AND " });
    *first = false;
}

/// Append `WHERE ...` for search terms and selected filters.
fn push_conditions(
    builder: &mut QueryBuilder<'_, Postgres>,
    admin: &ModelAdmin,
    terms: &[String],
    filters: &[FilterSpec],
) {
    let entity = admin.entity;
    let mut first = true;

    for term in terms {
        push_joiner(builder, &mut first);
        builder.push("(");
        for (idx, field) in admin.search_fields.iter().enumerate() {
            if idx > 0 {
                builder.push(" OR ");
            }
            let raw = entity.column(field).map_or("NULL", |c| c.raw);
            builder.push(raw);
            builder.push(" ILIKE ");
            builder.push_bind(like_pattern(term));
        }
        builder.push(")");
    }

    for filter in filters {
        let (Some(range), Some(column)) = (filter.selected, entity.column(filter.field)) else {
            continue;
        };
        let (lower, upper) = range.bounds();
        push_joiner(builder, &mut first);
        builder.push(format!("{raw} >= {lower} AND {raw} < {upper}", raw = column.raw));
    }
}

/// Run a changelist query for one registration.
///
/// # Errors
///
/// Returns an invalid-filter or database error.
pub async fn list(
    pool: &PgPool,
    site: &AdminSite,
    admin: &ModelAdmin,
    params: &ListParams,
) -> Result<AdminListing, AdminError> {
    let entity = admin.entity;
    let filters = selected_filters(admin, params)?;
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_owned);
    let terms: Vec<String> = if admin.search_fields.is_empty() {
        Vec::new()
    } else {
        query
            .as_deref()
            .map(|q| q.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    };

    let mut count_builder = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) AS n FROM {}", entity.from));
    push_conditions(&mut count_builder, admin, &terms, &filters);
    let count: i64 = count_builder.build().fetch_one(pool).await?.get("n");

    let page = PageInfo::resolve(params.page.as_deref(), count, admin.list_per_page);

    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} AS pk", entity.pk));
    for (idx, field) in admin.list_display.iter().enumerate() {
        let display = entity.column(field).map_or("NULL", |c| c.display);
        builder.push(format!(", ({display})::text AS c{idx}"));
    }
    builder.push(format!(" FROM {}", entity.from));
    push_conditions(&mut builder, admin, &terms, &filters);
    builder.push(format!(" ORDER BY {} LIMIT ", entity.order_by));
    builder.push_bind(page.per_page);
    builder.push(" OFFSET ");
    builder.push_bind(page.offset());

    let rows = builder.build().fetch_all(pool).await?;
    let empty = site.empty_value_for(admin);
    let rows = rows
        .iter()
        .map(|row| AdminRow {
            pk: row.get("pk"),
            cells: (0..admin.list_display.len())
                .map(|idx| {
                    row.get::<Option<String>, _>(format!("c{idx}").as_str())
                        .unwrap_or_else(|| empty.to_owned())
                })
                .collect(),
        })
        .collect();

    Ok(AdminListing {
        entity: entity.name,
        verbose_name_plural: entity.verbose_name_plural,
        columns: admin.list_display,
        editable: admin.list_editable,
        searchable: !admin.search_fields.is_empty(),
        query,
        filters,
        rows,
        page,
    })
}

#[cfg(test)]
#[path = "listing_test.rs"]
mod tests;
