use super::*;
use crate::admin::{GROUP, POST, default_site};

fn params(pairs: &[(&str, &str)]) -> ListParams {
    let query: String = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    axum::extract::Query::<ListParams>::try_from_uri(&format!("/admin/post/?{query}").parse().unwrap())
        .unwrap()
        .0
}

#[test]
fn like_pattern_wraps_and_escapes() {
    assert_eq!(like_pattern("cat"), "%cat%");
    assert_eq!(like_pattern("100%_sure\\"), "%100\\%\\_sure\\\\%");
}

#[test]
fn date_filter_parse_round_trip_names() {
    for (raw, expected) in [
        ("today", DateFilter::Today),
        ("past_7_days", DateFilter::Past7Days),
        ("this_month", DateFilter::ThisMonth),
        ("this_year", DateFilter::ThisYear),
    ] {
        assert_eq!(DateFilter::parse(raw), Some(expected));
        assert_eq!(serde_json::to_value(expected).unwrap(), raw);
    }
    assert_eq!(DateFilter::parse("yesterday"), None);
}

#[test]
fn list_params_split_named_and_filter_keys() {
    let p = params(&[("q", "hello"), ("page", "2"), ("pub_date", "today")]);
    assert_eq!(p.q.as_deref(), Some("hello"));
    assert_eq!(p.page.as_deref(), Some("2"));
    assert_eq!(p.filters.get("pub_date").map(String::as_str), Some("today"));
    assert!(!p.filters.contains_key("q"));
}

#[test]
fn selected_filters_reads_known_range() {
    let site = default_site();
    let admin = site.get("post").unwrap();
    let filters = selected_filters(admin, &params(&[("pub_date", "this_month")])).unwrap();
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].field, "pub_date");
    assert_eq!(filters[0].selected, Some(DateFilter::ThisMonth));
}

#[test]
fn selected_filters_treats_any_as_unset() {
    let site = default_site();
    let admin = site.get("post").unwrap();
    let filters = selected_filters(admin, &params(&[("pub_date", "any")])).unwrap();
    assert_eq!(filters[0].selected, None);
}

#[test]
fn selected_filters_rejects_unknown_range() {
    let site = default_site();
    let admin = site.get("post").unwrap();
    let err = selected_filters(admin, &params(&[("pub_date", "last_century")])).unwrap_err();
    assert!(matches!(err, AdminError::InvalidFilter { ref field, ref value } if field == "pub_date" && value == "last_century"));
}

#[test]
fn selected_filters_ignores_params_for_undeclared_fields() {
    let admin = ModelAdmin::new(&GROUP);
    let filters = selected_filters(&admin, &params(&[("pub_date", "whatever")])).unwrap();
    assert!(filters.is_empty());
}

#[test]
fn push_conditions_builds_search_and_filter_clauses() {
    let site = default_site();
    let admin = site.get("post").unwrap();
    let filters = vec![FilterSpec { field: "pub_date", choices: DateFilter::ALL, selected: Some(DateFilter::Today) }];
    let terms = vec!["red".to_owned(), "fox".to_owned()];

    let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM posts p");
    push_conditions(&mut builder, admin, &terms, &filters);
    let sql = builder.sql();

    assert_eq!(
        sql,
        "SELECT 1 FROM posts p WHERE (p.text ILIKE $1) AND (p.text ILIKE $2) \
         AND p.pub_date >= date_trunc('day', now()) AND p.pub_date < date_trunc('day', now()) + interval '1 day'"
    );
}

#[test]
fn push_conditions_without_terms_or_filters_adds_nothing() {
    let admin = ModelAdmin::new(&POST);
    let mut builder = QueryBuilder::<Postgres>::new("SELECT 1");
    push_conditions(&mut builder, &admin, &[], &[]);
    assert_eq!(builder.sql(), "SELECT 1");
}
