use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn from_lookup_applies_defaults() {
    let cfg = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/yatube")])).unwrap();
    assert_eq!(cfg.database_url, "postgres://localhost/yatube");
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
    assert_eq!(cfg.media_root, PathBuf::from(DEFAULT_MEDIA_ROOT));
    assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    assert!(!cfg.cookie_secure);
    assert_eq!(cfg.session_ttl_days, DEFAULT_SESSION_TTL_DAYS);
    assert!(cfg.admin.is_none());
}

#[test]
fn from_lookup_requires_database_url() {
    assert_eq!(Config::from_lookup(lookup_from(&[])), Err(ConfigError::Missing("DATABASE_URL")));
    assert_eq!(
        Config::from_lookup(lookup_from(&[("DATABASE_URL", "  ")])),
        Err(ConfigError::Missing("DATABASE_URL"))
    );
}

#[test]
fn from_lookup_reads_overrides() {
    let cfg = Config::from_lookup(lookup_from(&[
        ("DATABASE_URL", "postgres://db/yatube"),
        ("PORT", "8080"),
        ("DB_MAX_CONNECTIONS", "12"),
        ("MEDIA_ROOT", "/var/lib/yatube/media"),
        ("MAX_UPLOAD_BYTES", "1024"),
        ("COOKIE_SECURE", "yes"),
        ("SESSION_TTL_DAYS", "3"),
    ]))
    .unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.db_max_connections, 12);
    assert_eq!(cfg.media_root, PathBuf::from("/var/lib/yatube/media"));
    assert_eq!(cfg.max_upload_bytes, 1024);
    assert!(cfg.cookie_secure);
    assert_eq!(cfg.session_ttl_days, 3);
}

#[test]
fn from_lookup_rejects_bad_port() {
    let err = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://db"), ("PORT", "http")])).unwrap_err();
    assert_eq!(err, ConfigError::Invalid { key: "PORT", value: "http".into() });
}

#[test]
fn from_lookup_rejects_non_positive_session_ttl() {
    let err =
        Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://db"), ("SESSION_TTL_DAYS", "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "SESSION_TTL_DAYS", .. }));
}

#[test]
fn from_lookup_rejects_bad_cookie_flag() {
    let err =
        Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://db"), ("COOKIE_SECURE", "maybe")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "COOKIE_SECURE", .. }));
}

#[test]
fn admin_bootstrap_needs_both_credentials() {
    let only_user =
        Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://db"), ("ADMIN_USERNAME", "root")])).unwrap();
    assert!(only_user.admin.is_none());

    let both = Config::from_lookup(lookup_from(&[
        ("DATABASE_URL", "postgres://db"),
        ("ADMIN_USERNAME", "root"),
        ("ADMIN_PASSWORD", "s3cret-pass"),
    ]))
    .unwrap();
    let admin = both.admin.unwrap();
    assert_eq!(admin.username, "root");
    assert_eq!(admin.password, "s3cret-pass");
}

#[test]
fn admin_bootstrap_debug_hides_password() {
    let admin = AdminBootstrap { username: "root".into(), password: "hunter22".into() };
    let debug = format!("{admin:?}");
    assert!(debug.contains("root"));
    assert!(!debug.contains("hunter22"));
}

#[test]
fn parse_bool_variants() {
    for raw in ["1", "true", "YES", " on "] {
        assert_eq!(parse_bool(raw), Some(true), "expected true for {raw:?}");
    }
    for raw in ["0", "False", "no", "off"] {
        assert_eq!(parse_bool(raw), Some(false), "expected false for {raw:?}");
    }
    assert_eq!(parse_bool(""), None);
    assert_eq!(parse_bool("maybe"), None);
}
