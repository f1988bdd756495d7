use std::{env, fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const SETTINGS_FILE: &str = "questionnaire.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub database_url: String,
    pub request_timeout_secs: u64,
    pub auto_advance_delay_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5001".into(),
            database_url: "sqlite://./data/questionnaire.db".into(),
            request_timeout_secs: 15,
            auto_advance_delay_ms: 300,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    database_url: Option<String>,
    request_timeout_secs: Option<u64>,
    auto_advance_delay_ms: Option<u64>,
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |name| env::var(name).ok())
}

/// Defaults, then the optional TOML file at `path`, then environment variables.
pub fn load_settings_from(
    path: &Path,
    lookup_env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(err) => tracing::warn!(
                path = %path.display(),
                "ignoring unreadable settings file: {err}"
            ),
        }
    }

    apply_env_overrides(&mut settings, lookup_env);
    settings
}

fn apply_file_settings(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.auto_advance_delay_ms {
        settings.auto_advance_delay_ms = v;
    }
}

fn apply_env_overrides(settings: &mut ClientSettings, lookup_env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup_env("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup_env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup_env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup_env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup_env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = lookup_env("APP__AUTO_ADVANCE_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.auto_advance_delay_ms = parsed;
        }
    }
}

pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid api base url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        bail!("api base url must start with http:// or https://, got '{raw}'");
    }
    Ok(url)
}

pub fn prepare_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return ClientSettings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
