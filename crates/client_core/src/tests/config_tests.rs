use std::collections::HashMap;

use super::*;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_from(None, env_from(&[]));
    assert_eq!(settings, ClientSettings::default());
    assert_eq!(settings.request_timeout(), Duration::from_secs(30));
}

#[test]
fn file_values_override_defaults() {
    let raw = r#"
        api_base_url = "https://tracker.internal:9443/"
        request_timeout_secs = 5
        fanout_concurrency = 8
        auth_token = "file-token"
    "#;
    let settings = load_settings_from(Some(raw), env_from(&[]));

    assert_eq!(settings.api_base_url, "https://tracker.internal:9443");
    assert_eq!(settings.request_timeout_secs, 5);
    assert_eq!(settings.fanout_concurrency, 8);
    assert_eq!(settings.auth_token.as_deref(), Some("file-token"));
}

#[test]
fn env_overrides_file_and_prefixed_key_wins() {
    let raw = r#"api_base_url = "http://from-file:8080""#;
    let settings = load_settings_from(
        Some(raw),
        env_from(&[
            ("TRACKER_API_URL", "http://from-env:8080"),
            ("APP__API_BASE_URL", "http://from-app-env:8080"),
            ("APP__FANOUT_CONCURRENCY", "0"),
            ("APP__REQUEST_TIMEOUT_SECS", "not-a-number"),
            ("TRACKER_TOKEN", "env-token"),
        ]),
    );

    assert_eq!(settings.api_base_url, "http://from-app-env:8080");
    assert_eq!(settings.fanout_concurrency, 1);
    assert_eq!(settings.request_timeout_secs, 30);
    assert_eq!(settings.auth_token.as_deref(), Some("env-token"));
}

#[test]
fn malformed_file_is_ignored() {
    let settings = load_settings_from(Some("api_base_url = ["), env_from(&[]));
    assert_eq!(settings.api_base_url, "http://localhost:8080");
}

#[test]
fn rejects_non_http_base_urls() {
    assert_eq!(normalize_base_url("ftp://example.com"), "http://localhost:8080");
    assert_eq!(normalize_base_url("not a url"), "http://localhost:8080");
    assert_eq!(normalize_base_url(" http://api:8080// "), "http://api:8080");
}

#[test]
fn blank_token_is_dropped() {
    let settings = load_settings_from(None, env_from(&[("TRACKER_TOKEN", "  ")]));
    assert_eq!(settings.auth_token, None);
}
