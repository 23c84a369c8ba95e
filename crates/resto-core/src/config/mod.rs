//! Client configuration.
//!
//! A JSON file provides the persistent values; environment variables
//! (usually from `.env` during development) override them at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:1337";
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:8000";
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const MIN_TIMEOUT_MS: u64 = 50;

/// Endpoints, timeouts, and on-disk locations used by every client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the remote restaurants/reviews API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Origin the UI assets are served from
    #[serde(default = "default_app_origin")]
    pub app_origin: String,
    /// Liveness probe timeout; a probe that takes longer counts as offline
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_app_origin() -> String {
    DEFAULT_APP_ORIGIN.to_string()
}

const fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            app_origin: default_app_origin(),
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            db_path: None,
            cache_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load from a JSON file; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|error| {
            Error::Config(format!("Failed to read config at {}: {error}", path.display()))
        })?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!("Failed to parse config at {}: {error}", path.display()))
        })?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        normalized.validate()?;
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Apply `RESTO_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |name: &str| non_blank(lookup(name));

        if let Some(url) = lookup("RESTO_API_URL") {
            self.api_base_url = url;
        }
        if let Some(origin) = lookup("RESTO_APP_ORIGIN") {
            self.app_origin = origin;
        }
        if let Some(raw) = lookup("RESTO_PROBE_TIMEOUT_MS") {
            self.probe_timeout_ms = parse_millis("RESTO_PROBE_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("RESTO_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = parse_millis("RESTO_REQUEST_TIMEOUT_MS", &raw)?;
        }
        if let Some(path) = lookup("RESTO_DB_PATH") {
            self.db_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("RESTO_CACHE_DIR") {
            self.cache_dir = Some(PathBuf::from(path));
        }

        self.normalize();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("app_origin", &self.app_origin),
        ] {
            if !has_http_scheme(value) {
                return Err(Error::Config(format!(
                    "{field} must include http:// or https:// (got '{value}')"
                )));
            }
        }
        for (field, value) in [
            ("probe_timeout_ms", self.probe_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value < MIN_TIMEOUT_MS {
                return Err(Error::Config(format!(
                    "{field} must be at least {MIN_TIMEOUT_MS} ms"
                )));
            }
        }
        Ok(())
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn normalize(&mut self) {
        self.api_base_url = self.api_base_url.trim().trim_end_matches('/').to_string();
        self.app_origin = self.app_origin.trim().trim_end_matches('/').to_string();
    }
}

fn parse_millis(name: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| Error::Config(format!("{name} must be an integer number of milliseconds")))
}

/// Trimmed text, or `None` when missing or blank.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn has_http_scheme(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}
