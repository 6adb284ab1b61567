//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TGB_*)
//! 2. TOML config file (if TGB_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TGB_*)
/// 2. TOML config file (if TGB_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// The defaults carry the shipped worker constants: the current cache
/// version tag and the precache manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version tag naming the current cache bucket.
    ///
    /// Set via TGB_CACHE_NAME environment variable. Bumping the tag
    /// supersedes the previous bucket at the next activation.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Ordered URL manifest precached at install time.
    ///
    /// Entries may be relative (resolved against `base_url`) or absolute.
    /// Immutable for the lifetime of a version.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Origin that relative manifest entries and request URLs resolve
    /// against.
    ///
    /// Set via TGB_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path to SQLite bucket store.
    ///
    /// Set via TGB_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via TGB_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via TGB_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via TGB_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_cache_name() -> String {
    "tg-browser-v1".into()
}

fn default_precache_urls() -> Vec<String> {
    vec![
        "/".into(),
        "/static/manifest.json".into(),
        "https://cdnjs.cloudflare.com/ajax/libs/gsap/3.12.5/gsap.min.js".into(),
        "https://unpkg.com/@splinetool/viewer@1.0.47/build/spline-viewer.js".into(),
    ]
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./tgb-cache.sqlite")
}

fn default_user_agent() -> String {
    "tgb-worker/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            precache_urls: default_precache_urls(),
            base_url: default_base_url(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TGB_`
    /// 2. TOML file from `TGB_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TGB_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TGB_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
