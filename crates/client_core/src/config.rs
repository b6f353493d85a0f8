use std::{
    fs,
    net::IpAddr,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use url::{Host, Url};

pub const LOCAL_API_BASE_URL: &str = "http://localhost:8000";
pub const PRODUCTION_API_BASE_URL: &str = "https://noti-subvenciones-production.up.railway.app";
pub const DEFAULT_SETTINGS_FILE: &str = "subvenciones.toml";
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;
/// Upper bound accepted by the server for `limit`.
pub const MAX_SEARCH_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Explicit backend URL; bypasses origin detection when set.
    pub api_base_url: Option<String>,
    /// Origin the client acts on behalf of, e.g. `http://localhost:3000`.
    pub origin: Option<String>,
    pub search_limit: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: None,
            origin: None,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    origin: Option<String>,
    search_limit: Option<u32>,
}

impl Settings {
    pub fn base_url(&self) -> String {
        match self
            .api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
        {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => resolve_base_url(self.origin.as_deref()).to_string(),
        }
    }

    pub fn effective_search_limit(&self) -> u32 {
        self.search_limit.clamp(1, MAX_SEARCH_LIMIT)
    }

    fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.api_base_url {
            self.api_base_url = Some(v);
        }
        if let Some(v) = file.origin {
            self.origin = Some(v);
        }
        if let Some(v) = file.search_limit {
            self.search_limit = v;
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SUBVENCIONES_API_URL") {
            self.api_base_url = Some(v);
        }
        if let Some(v) = lookup("APP__API_BASE_URL") {
            self.api_base_url = Some(v);
        }
        if let Some(v) = lookup("APP__ORIGIN") {
            self.origin = Some(v);
        }
        if let Some(v) = lookup("APP__SEARCH_LIMIT") {
            if let Ok(parsed) = v.parse::<u32>() {
                self.search_limit = parsed;
            }
        }
    }
}

/// Defaults, then the settings file, then environment overrides.
///
/// A missing default file is fine; an explicitly requested file must exist.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };

    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file = toml::from_str::<FileSettings>(&raw)
                .map_err(|source| SettingsError::Parse {
                    path: path.clone(),
                    source,
                })?;
            settings.apply_file(file);
        }
        Err(source) if required => return Err(SettingsError::Read { path, source }),
        Err(_) => {}
    }

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

/// Local development endpoint for loopback origins, production otherwise.
pub fn resolve_base_url(origin: Option<&str>) -> &'static str {
    match origin {
        Some(origin) if is_loopback_origin(origin) => LOCAL_API_BASE_URL,
        _ => PRODUCTION_API_BASE_URL,
    }
}

pub fn is_loopback_origin(origin: &str) -> bool {
    let origin = origin.trim();
    if origin.is_empty() {
        return false;
    }
    if let Ok(ip) = origin.parse::<IpAddr>() {
        return ip.is_loopback();
    }

    let parsed = Url::parse(origin)
        .ok()
        .filter(|url| url.host().is_some())
        .or_else(|| Url::parse(&format!("http://{origin}")).ok());

    match parsed.as_ref().and_then(Url::host) {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    }
}

/// Joins without doubling or dropping the `/` between base and path.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
