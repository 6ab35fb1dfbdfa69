use super::*;

fn signup_form(username: &str, password1: &str, password2: &str) -> SignupForm {
    SignupForm { username: username.into(), password1: password1.into(), password2: password2.into() }
}

// =============================================================================
// login_url / is_safe_next
// =============================================================================

#[test]
fn login_url_keeps_slashes_readable() {
    assert_eq!(login_url("/create/"), "/auth/login/?next=/create/");
    assert_eq!(login_url("/posts/12/edit/"), "/auth/login/?next=/posts/12/edit/");
}

#[test]
fn login_url_encodes_query_characters() {
    assert_eq!(login_url("/admin/post/?q=a b&page=2"), "/auth/login/?next=/admin/post/%3Fq%3Da%20b%26page%3D2");
}

#[test]
fn safe_next_accepts_relative_paths() {
    assert!(is_safe_next("/"));
    assert!(is_safe_next("/create/"));
    assert!(is_safe_next("/admin/post/?q=x"));
}

#[test]
fn safe_next_rejects_offsite_targets() {
    for next in ["https://evil.example/", "//evil.example/", "/\\evil.example", "evil", "", "/redirect?to=http://x"] {
        assert!(!is_safe_next(next), "expected {next:?} to be rejected");
    }
}

// =============================================================================
// validate_signup
// =============================================================================

#[test]
fn signup_accepts_matching_long_passwords() {
    assert!(validate_signup(&signup_form("leo", "long-enough", "long-enough")).is_empty());
}

#[test]
fn signup_requires_every_field() {
    let errors = validate_signup(&signup_form(" ", "", ""));
    assert!(errors.has("username"));
    assert!(errors.has("password1"));
    assert!(errors.has("password2"));
}

#[test]
fn signup_rejects_mismatch_before_length() {
    let errors = validate_signup(&signup_form("leo", "short", "other"));
    assert_eq!(errors.get("password2"), Some(&[MSG_PASSWORD_MISMATCH.to_owned()][..]));
}

#[test]
fn signup_rejects_short_password() {
    let errors = validate_signup(&signup_form("leo", "short", "short"));
    let messages = errors.get("password2").unwrap();
    assert!(messages[0].contains("at least 8 characters"));
}

#[test]
fn signup_rejects_bad_username() {
    let errors = validate_signup(&signup_form("has space", "long-enough", "long-enough"));
    assert_eq!(errors.get("username"), Some(&[MSG_USERNAME_INVALID.to_owned()][..]));
}

// =============================================================================
// session cookie
// =============================================================================

#[test]
fn session_cookie_is_http_only_and_site_wide() {
    let cookie = session_cookie("abc".into(), true);
    assert_eq!(cookie.name(), COOKIE_NAME);
    assert_eq!(cookie.value(), "abc");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
}
