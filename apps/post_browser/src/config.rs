use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use client_core::DraftRetention;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "browser.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store_url: String,
    pub reset_draft_on_close: bool,
    pub log_filter: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: "http://127.0.0.1:4943".into(),
            reset_draft_on_close: false,
            log_filter: "info".into(),
            request_timeout_secs: 10,
        }
    }
}

impl Settings {
    pub fn draft_retention(&self) -> DraftRetention {
        if self.reset_draft_on_close {
            DraftRetention::ResetOnClose
        } else {
            DraftRetention::KeepOnClose
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    store_url: Option<String>,
    reset_draft_on_close: Option<bool>,
    log_filter: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the config file, then the environment.
///
/// An explicitly named file must exist; the default `browser.toml` is optional.
pub fn load_settings(explicit_path: Option<&Path>) -> Result<Settings> {
    load_settings_with(explicit_path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    explicit_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match explicit_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    if let Some(file_cfg) = read_file_settings(&path, required)? {
        if let Some(v) = file_cfg.store_url {
            settings.store_url = v;
        }
        if let Some(v) = file_cfg.reset_draft_on_close {
            settings.reset_draft_on_close = v;
        }
        if let Some(v) = file_cfg.log_filter {
            settings.log_filter = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            settings.request_timeout_secs = v;
        }
    }

    if let Some(v) = env("POST_STORE_URL") {
        settings.store_url = v;
    }
    if let Some(v) = env("APP__STORE_URL") {
        settings.store_url = v;
    }

    if let Some(v) = env("APP__RESET_DRAFT_ON_CLOSE") {
        settings.reset_draft_on_close = parse_flag(&v)
            .with_context(|| format!("invalid APP__RESET_DRAFT_ON_CLOSE value '{v}'"))?;
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    Ok(settings)
}

fn read_file_settings(path: &Path, required: bool) -> Result<Option<FileSettings>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };
    let parsed = toml::from_str::<FileSettings>(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
    Ok(Some(parsed))
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{other}'"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
