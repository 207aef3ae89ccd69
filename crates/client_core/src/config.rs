use std::{fs, time::Duration};

use serde::Deserialize;
use url::Url;

pub const SETTINGS_FILE: &str = "tracker.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub fanout_concurrency: usize,
    pub log_level: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".into(),
            auth_token: None,
            request_timeout_secs: 30,
            fanout_concurrency: 4,
            log_level: "info".into(),
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    auth_token: Option<String>,
    request_timeout_secs: Option<u64>,
    fanout_concurrency: Option<usize>,
    log_level: Option<String>,
}

/// Defaults, then `tracker.toml` in the working directory, then environment.
pub fn load_settings() -> ClientSettings {
    let raw = fs::read_to_string(SETTINGS_FILE).ok();
    load_settings_from(raw.as_deref(), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.api_base_url {
                    settings.api_base_url = v;
                }
                if let Some(v) = file_cfg.auth_token {
                    settings.auth_token = Some(v);
                }
                if let Some(v) = file_cfg.request_timeout_secs {
                    settings.request_timeout_secs = v;
                }
                if let Some(v) = file_cfg.fanout_concurrency {
                    settings.fanout_concurrency = v;
                }
                if let Some(v) = file_cfg.log_level {
                    settings.log_level = v;
                }
            }
            Err(err) => tracing::warn!(error = %err, "ignoring malformed {SETTINGS_FILE}"),
        }
    }

    if let Some(v) = env("TRACKER_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("TRACKER_TOKEN") {
        settings.auth_token = Some(v);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = env("APP__FANOUT_CONCURRENCY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.fanout_concurrency = parsed;
        }
    }

    if let Some(v) = env("APP__LOG_LEVEL") {
        settings.log_level = v;
    }

    settings.api_base_url = normalize_base_url(&settings.api_base_url);
    settings.fanout_concurrency = settings.fanout_concurrency.max(1);
    settings.auth_token = settings.auth_token.filter(|t| !t.trim().is_empty());
    settings
}

/// Trims whitespace and trailing slashes; falls back to the default when the
/// value is not an absolute http(s) URL.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            trimmed.to_string()
        }
        _ => {
            tracing::warn!(value = raw, "invalid api base url; using default");
            ClientSettings::default().api_base_url
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
