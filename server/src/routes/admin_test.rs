use super::*;
use crate::admin::default_site;

fn group_form(title: &str, slug: &str, description: &str) -> GroupForm {
    GroupForm { title: title.into(), slug: slug.into(), description: description.into() }
}

#[test]
fn admin_error_to_status_maps_lookup_and_filter_errors() {
    assert_eq!(admin_error_to_status(&AdminError::NotRegistered("user".into())), StatusCode::NOT_FOUND);
    let bad_filter = AdminError::InvalidFilter { field: "pub_date".into(), value: "someday".into() };
    assert_eq!(admin_error_to_status(&bad_filter), StatusCode::BAD_REQUEST);
    assert_eq!(
        admin_error_to_status(&AdminError::Misconfigured(vec!["x".into()])),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn changelist_url_uses_entity_segment() {
    assert_eq!(changelist_url("post"), "/admin/post/");
}

// =============================================================================
// inline edit helpers
// =============================================================================

#[test]
fn parse_group_choice_accepts_empty_and_ids() {
    assert_eq!(parse_group_choice("").unwrap(), None);
    assert_eq!(parse_group_choice("  ").unwrap(), None);
    assert_eq!(parse_group_choice("12").unwrap(), Some(12));
}

#[test]
fn parse_group_choice_rejects_garbage() {
    let errors = parse_group_choice("cats").unwrap_err();
    assert_eq!(errors.get("group"), Some(&[MSG_INVALID_CHOICE.to_owned()][..]));
}

#[test]
fn check_editable_allows_only_listed_columns() {
    let site = default_site();
    let post = site.get("post").unwrap();

    let ok: HashMap<String, String> = [("group".to_owned(), "1".to_owned())].into();
    assert!(check_editable(post, &ok).is_empty());

    let sneaky: HashMap<String, String> = [("text".to_owned(), "rewritten".to_owned())].into();
    let errors = check_editable(post, &sneaky);
    assert!(errors.get("__all__").unwrap()[0].starts_with("text:"));
}

#[test]
fn check_editable_rejects_everything_for_read_only_entities() {
    let site = default_site();
    let group = site.get("group").unwrap();
    let form: HashMap<String, String> = [("title".to_owned(), "x".to_owned())].into();
    assert!(!check_editable(group, &form).is_empty());
}

// =============================================================================
// validate_group
// =============================================================================

#[test]
fn validate_group_accepts_complete_form() {
    assert!(validate_group(&group_form("Test group", "test_slug", "about cats")).is_empty());
}

#[test]
fn validate_group_requires_every_field() {
    let errors = validate_group(&group_form("", " ", ""));
    assert!(errors.has("title"));
    assert!(errors.has("slug"));
    assert!(errors.has("description"));
}

#[test]
fn validate_group_rejects_bad_slug_and_long_title() {
    let errors = validate_group(&group_form(&"t".repeat(MAX_TITLE_LEN + 1), "two words", "d"));
    assert!(errors.get("title").unwrap()[0].contains("at most 200"));
    assert_eq!(errors.get("slug"), Some(&[MSG_SLUG_INVALID.to_owned()][..]));
}

#[test]
fn validate_group_reports_overlong_slug_length() {
    let errors = validate_group(&group_form("t", &"s".repeat(MAX_SLUG_LEN + 1), "d"));
    assert!(errors.get("slug").unwrap()[0].contains("at most 50"));
}
