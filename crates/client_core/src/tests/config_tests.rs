use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("subvenciones_config_test_{name}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(name);
    fs::write(&path, contents).expect("write settings");
    path
}

#[test]
fn loopback_origins_use_local_endpoint() {
    for origin in [
        "http://localhost:3000",
        "http://127.0.0.1:5500/index.html",
        "localhost",
        "127.0.0.1:8080",
        "http://[::1]:3000",
        "::1",
        "[::1]",
        "http://LOCALHOST",
    ] {
        assert_eq!(resolve_base_url(Some(origin)), LOCAL_API_BASE_URL, "{origin}");
    }
}

#[test]
fn remote_or_missing_origins_use_production_endpoint() {
    for origin in [
        Some("https://noti-subvenciones.vercel.app"),
        Some("https://example.org"),
        Some("http://192.168.1.20:3000"),
        Some(""),
        None,
    ] {
        assert_eq!(resolve_base_url(origin), PRODUCTION_API_BASE_URL, "{origin:?}");
    }
}

#[test]
fn explicit_base_url_wins_over_origin() {
    let settings = Settings {
        api_base_url: Some("https://api.example.org/".into()),
        origin: Some("http://localhost".into()),
        ..Settings::default()
    };
    assert_eq!(settings.base_url(), "https://api.example.org");
}

#[test]
fn blank_base_url_falls_back_to_origin_rule() {
    let settings = Settings {
        api_base_url: Some("   ".into()),
        origin: Some("http://127.0.0.1".into()),
        ..Settings::default()
    };
    assert_eq!(settings.base_url(), LOCAL_API_BASE_URL);
}

#[test]
fn join_url_handles_slashes() {
    assert_eq!(
        join_url("http://localhost:8000/", "/api/areas"),
        "http://localhost:8000/api/areas"
    );
    assert_eq!(
        join_url("http://localhost:8000", "api/areas"),
        "http://localhost:8000/api/areas"
    );
}

#[test]
fn search_limit_is_clamped_to_server_bounds() {
    let mut settings = Settings::default();
    settings.search_limit = 500;
    assert_eq!(settings.effective_search_limit(), MAX_SEARCH_LIMIT);
    settings.search_limit = 0;
    assert_eq!(settings.effective_search_limit(), 1);
}

#[test]
fn env_overrides_apply_in_order() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("SUBVENCIONES_API_URL", "https://first.example.org"),
        ("APP__API_BASE_URL", "https://second.example.org"),
        ("APP__SEARCH_LIMIT", "20"),
        ("APP__ORIGIN", "http://localhost"),
    ]);
    let mut settings = Settings::default();
    settings.apply_env(|key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(
        settings.api_base_url.as_deref(),
        Some("https://second.example.org")
    );
    assert_eq!(settings.origin.as_deref(), Some("http://localhost"));
    assert_eq!(settings.search_limit, 20);
}

#[test]
fn unparseable_env_limit_is_ignored() {
    let mut settings = Settings::default();
    settings.apply_env(|key| (key == "APP__SEARCH_LIMIT").then(|| "lots".to_string()));
    assert_eq!(settings.search_limit, DEFAULT_SEARCH_LIMIT);
}

#[test]
fn reads_settings_file() {
    let path = temp_file(
        "subvenciones.toml",
        "api_base_url = \"http://api.internal:9000\"\nsearch_limit = 25\n",
    );
    let settings = load_settings(Some(&path)).expect("load settings");
    // Environment may override the URL on developer machines; the limit is file-only here.
    if env::var("SUBVENCIONES_API_URL").is_err() && env::var("APP__API_BASE_URL").is_err() {
        assert_eq!(
            settings.api_base_url.as_deref(),
            Some("http://api.internal:9000")
        );
    }
    if env::var("APP__SEARCH_LIMIT").is_err() {
        assert_eq!(settings.search_limit, 25);
    }
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn missing_explicit_settings_file_is_an_error() {
    let path = env::temp_dir().join("subvenciones_missing_settings_file.toml");
    let err = load_settings(Some(&path)).expect_err("missing file");
    assert!(matches!(err, SettingsError::Read { .. }));
}

#[test]
fn malformed_settings_file_is_an_error() {
    let path = temp_file("broken.toml", "search_limit = \"many\"\n");
    let err = load_settings(Some(&path)).expect_err("bad file");
    assert!(matches!(err, SettingsError::Parse { .. }));
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}
