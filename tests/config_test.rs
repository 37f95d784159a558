use std::path::Path;

use chrono::TimeDelta;
use pr_dashboard::config::loader::load_config;
use pr_dashboard::config::types::AppConfig;

#[test]
fn parse_minimal_config() {
    let toml = r#"
[github]
owner = "rust-lang"
repo = "rust"
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.github.owner, "rust-lang");
    assert_eq!(config.github.repo, "rust");
    assert_eq!(config.github.host, "github.com");
    assert_eq!(config.github.page_size, 100);
}

#[test]
fn parse_unknown_keys_ignored() {
    let toml = r#"
unknown_top_level = "should be ignored"

[view]
date_format = "%d/%m/%Y"
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.view.date_format, "%d/%m/%Y");
}

#[test]
fn parse_defaults() {
    let config: AppConfig = toml::from_str("").unwrap();
    assert_eq!(config.github.owner, "MetaMask");
    assert_eq!(config.github.repo, "metamask-extension");
    assert_eq!(config.github.core_org, "MetaMask");
    assert_eq!(config.fetch.max_retries, 3);
    assert!(config.cache.enabled);
    assert_eq!(config.cache.max_age(), TimeDelta::minutes(60));
    assert!(config.cache.expire_before.is_none());
    assert_eq!(config.view.loop_guard(), TimeDelta::milliseconds(200));
    assert_eq!(config.view.date_format, "relative");

    let settings = config.fetch_settings();
    assert_eq!(settings.debounce, TimeDelta::milliseconds(100));
    assert_eq!(settings.max_retries, 3);
}

#[test]
fn parse_full_config() {
    let toml = r#"
[github]
host = "github.example.com"
owner = "acme"
repo = "widgets"
page_size = 50
core_org = "acme-core"

[fetch]
max_retries = 5
debounce_ms = 250

[cache]
enabled = false
max_age_minutes = 15
expire_before = "2022-01-02T21:38:35Z"
dir = "/tmp/prd"

[view]
loop_guard_ms = 500
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.github.host, "github.example.com");
    assert_eq!(config.github.page_size, 50);
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.max_age(), TimeDelta::minutes(15));
    assert_eq!(
        config.cache.expire_before.unwrap().to_rfc3339(),
        "2022-01-02T21:38:35+00:00"
    );
    assert_eq!(config.cache.dir.as_deref(), Some(Path::new("/tmp/prd")));

    let settings = config.fetch_settings();
    assert_eq!(settings.max_retries, 5);
    assert_eq!(settings.debounce, TimeDelta::milliseconds(250));
    assert_eq!(settings.core_org, "acme-core");
    assert_eq!(config.view.loop_guard(), TimeDelta::milliseconds(500));
}

#[test]
fn load_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[github]\nrepo = \"snaps\"\n").unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.github.repo, "snaps");
}

#[test]
fn load_missing_explicit_path_is_an_error() {
    let result = load_config(Some(Path::new("/nonexistent/pr-dashboard/config.toml")));
    assert!(result.is_err());
}

#[test]
fn load_invalid_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[github\nrepo = ").unwrap();

    let err = load_config(Some(&path)).unwrap_err();
    assert!(format!("{err:#}").contains("parsing TOML"));
}
